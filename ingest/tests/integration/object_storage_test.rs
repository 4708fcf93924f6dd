use ingest::error::ErrorKind;
use ingest::pipeline::{IngestionPhase, RunOutcome};
use ingest::source::NoSource;
use ingest::test_utils::config::{TEST_BUCKET, ingestion_config};
use ingest::test_utils::row;
use ingest::types::ColumnDescriptor;
use ingest_config::shared::SourcePlatform;
use ingest_telemetry::tracing::init_test_tracing;
use serde_json::json;

use crate::common::{TestConnectors, destination_table};

fn events_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", "integer", 1),
        ColumnDescriptor::new("amount", "numeric(10,2)", 2),
    ]
}

fn events_config() -> ingest_config::shared::IngestionConfig {
    ingestion_config(
        SourcePlatform::S3,
        json!([{"events": {"update_method": "append", "s3_object": "landing/events"}}]),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn run_is_skipped_when_no_files_are_waiting() {
    init_test_tracing();
    let connectors = TestConnectors::new();

    connectors
        .warehouse
        .create_table(&destination_table("events"), events_columns())
        .await;
    connectors
        .object_store
        .put(TEST_BUCKET, "landing/orders_1.csv", "id,amount\n1,2.00\n")
        .await;

    let report = connectors
        .ingestion_with_source(events_config(), NoSource)
        .run_table("events")
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Skipped);
    assert_eq!(
        report.phases,
        vec![
            IngestionPhase::Reconciling,
            IngestionPhase::Claiming,
            IngestionPhase::Skipped,
        ]
    );
    assert_eq!(report.rows_exported, None);
    assert!(
        !connectors
            .warehouse
            .statements()
            .await
            .iter()
            .any(|statement| statement.starts_with("COPY"))
    );
    assert_eq!(
        connectors.object_store.keys(TEST_BUCKET).await,
        vec!["landing/orders_1.csv"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn claimed_files_are_loaded_then_archived() {
    init_test_tracing();
    let connectors = TestConnectors::new();

    let destination = destination_table("events");
    connectors
        .warehouse
        .create_table(&destination, events_columns())
        .await;
    connectors
        .warehouse
        .insert_rows(&destination, vec![row(&[("id", "0"), ("amount", "1.00")])])
        .await;
    connectors
        .object_store
        .put(TEST_BUCKET, "landing/events_1.csv", "id,amount\n1,9.50\n2,NULL\n")
        .await;
    connectors
        .object_store
        .put(TEST_BUCKET, "landing/events_2.csv", "id,amount\n3,1.25\n")
        .await;
    connectors
        .object_store
        .put(TEST_BUCKET, "landing/orders_1.csv", "id,amount\n7,2.00\n")
        .await;

    let report = connectors
        .ingestion_with_source(events_config(), NoSource)
        .run_all()
        .await
        .unwrap()
        .remove(0);

    assert_eq!(report.outcome, RunOutcome::Loaded);
    assert_eq!(
        report.phases,
        vec![
            IngestionPhase::Reconciling,
            IngestionPhase::Claiming,
            IngestionPhase::Staging,
            IngestionPhase::Appending,
            IngestionPhase::Archiving,
            IngestionPhase::Done,
        ]
    );
    assert_eq!(
        report.ddl.statements,
        vec!["CREATE TABLE staging.crm_events (LIKE crm.events)".to_string()]
    );

    assert_eq!(
        connectors.warehouse.rows(&destination).await,
        vec![
            row(&[("id", "0"), ("amount", "1.00")]),
            row(&[("id", "1"), ("amount", "9.50")]),
            row(&[("id", "2")]),
            row(&[("id", "3"), ("amount", "1.25")]),
        ]
    );

    let statements = connectors.warehouse.statements().await;
    assert!(statements.contains(
        &"COPY staging.crm_events FROM 's3://datalake/landing/processing/events' \
          CSV GZIP delimiter AS ',' NULL AS 'NULL' TRUNCATECOLUMNS IGNOREHEADER 1"
            .to_string()
    ));
    assert_eq!(
        connectors.object_store.keys(TEST_BUCKET).await,
        vec![
            "archive/landing/processing/events_1.csv",
            "archive/landing/processing/events_2.csv",
            "landing/orders_1.csv",
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn archive_failure_fails_the_run_after_loading() {
    init_test_tracing();
    let connectors = TestConnectors::new();

    let destination = destination_table("events");
    connectors
        .warehouse
        .create_table(&destination, events_columns())
        .await;
    connectors
        .object_store
        .put(TEST_BUCKET, "landing/events_1.csv", "id,amount\n1,9.50\n")
        .await;
    connectors.object_store.fail_archive().await;

    let err = connectors
        .ingestion_with_source(events_config(), NoSource)
        .run_table("events")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ObjectStoreFailed);
    assert_eq!(err.phase(), Some("archiving"));
    assert_eq!(err.table(), Some("events"));
    assert_eq!(connectors.warehouse.rows(&destination).await.len(), 1);
    assert_eq!(
        connectors.object_store.keys(TEST_BUCKET).await,
        vec!["landing/processing/events_1.csv"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn object_storage_table_without_key_is_rejected() {
    init_test_tracing();
    let connectors = TestConnectors::new();

    let config = ingestion_config(
        SourcePlatform::S3,
        json!([{"events": {"update_method": "append"}}]),
    );
    let err = connectors
        .ingestion_with_source(config, NoSource)
        .run_table("events")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
    assert_eq!(err.phase(), Some("resolving"));
    assert!(connectors.warehouse.statements().await.is_empty());
}
