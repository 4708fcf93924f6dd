use ingest::pipeline::{IngestionPhase, RunOutcome};
use ingest::sql::TRACKING_COLUMN;
use ingest::store::bookmark::{BookmarkStore, MemoryBookmarkStore};
use ingest::test_utils::config::{TEST_BUCKET, ingestion_config};
use ingest::test_utils::row;
use ingest_config::shared::SourcePlatform;
use ingest_telemetry::tracing::init_test_tracing;
use serde_json::json;

use crate::common::{
    TestConnectors, customer_columns, destination_table, orders_columns, source_table,
    staging_table,
};

#[tokio::test(flavor = "multi_thread")]
async fn full_load_replaces_destination_rows() {
    init_test_tracing();
    let connectors = TestConnectors::new();

    connectors
        .source
        .add_table(
            &source_table("customer"),
            customer_columns(),
            &["id"],
            vec![
                row(&[("id", "1"), ("email", "ada@example.com")]),
                row(&[("id", "2"), ("email", "grace@example.com")]),
                row(&[("id", "3")]),
            ],
        )
        .await;

    let destination = destination_table("customer");
    connectors
        .warehouse
        .create_table(&destination, customer_columns())
        .await;
    connectors
        .warehouse
        .insert_rows(
            &destination,
            (10..15)
                .map(|id| row(&[("id", id.to_string().as_str()), ("email", "stale@example.com")]))
                .collect(),
        )
        .await;

    let config = ingestion_config(
        SourcePlatform::Postgres,
        json!([{"customer": {"update_method": "full_load"}}]),
    );
    let reports = connectors.ingestion(config).run_all().await.unwrap();

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.outcome, RunOutcome::Loaded);
    assert_eq!(report.rows_exported, Some(3));
    assert_eq!(
        report.phases,
        vec![
            IngestionPhase::Reconciling,
            IngestionPhase::Extracting,
            IngestionPhase::Uploading,
            IngestionPhase::Staging,
            IngestionPhase::Replacing,
            IngestionPhase::Archiving,
            IngestionPhase::Done,
        ]
    );
    assert_eq!(
        report.ddl.statements,
        vec!["CREATE TABLE staging.crm_customer (LIKE crm.customer)".to_string()]
    );

    assert_eq!(
        connectors.warehouse.rows(&destination).await,
        vec![
            row(&[("id", "1"), ("email", "ada@example.com")]),
            row(&[("id", "2"), ("email", "grace@example.com")]),
            row(&[("id", "3")]),
        ]
    );
    assert_eq!(
        connectors.object_store.keys(TEST_BUCKET).await,
        vec!["archive/crm_daily/customer.csv.gz"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn merge_replaces_rows_with_matching_keys() {
    init_test_tracing();
    let connectors = TestConnectors::new();

    connectors
        .source
        .add_table(
            &source_table("customer"),
            customer_columns(),
            &["id"],
            vec![
                row(&[("id", "2"), ("email", "b2@example.com")]),
                row(&[("id", "3"), ("email", "c2@example.com")]),
                row(&[("id", "4"), ("email", "d@example.com")]),
            ],
        )
        .await;

    let destination = destination_table("customer");
    connectors
        .warehouse
        .create_table(&destination, customer_columns())
        .await;
    connectors
        .warehouse
        .create_table(&staging_table("customer"), customer_columns())
        .await;
    connectors
        .warehouse
        .insert_rows(
            &destination,
            vec![
                row(&[("id", "1"), ("email", "a@example.com")]),
                row(&[("id", "2"), ("email", "b@example.com")]),
                row(&[("id", "3"), ("email", "c@example.com")]),
            ],
        )
        .await;

    let config = ingestion_config(
        SourcePlatform::Postgres,
        json!([{"customer": {"update_method": "merge"}}]),
    );
    let report = connectors
        .ingestion(config)
        .run_table("customer")
        .await
        .unwrap();

    assert!(report.ddl.is_empty());
    assert!(report.phases.contains(&IngestionPhase::Merging));
    assert_eq!(
        connectors.warehouse.rows(&destination).await,
        vec![
            row(&[("id", "1"), ("email", "a@example.com")]),
            row(&[("id", "2"), ("email", "b2@example.com")]),
            row(&[("id", "3"), ("email", "c2@example.com")]),
            row(&[("id", "4"), ("email", "d@example.com")]),
        ]
    );

    let statements = connectors.warehouse.statements().await;
    assert!(statements.contains(
        &"DELETE FROM crm.customer USING staging.crm_customer \
          WHERE crm.customer.id = staging.crm_customer.id"
            .to_string()
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn incremental_load_starts_from_initial_value_then_follows_bookmark() {
    init_test_tracing();
    let connectors = TestConnectors::new();

    let orders = source_table("orders");
    connectors
        .source
        .add_table(
            &orders,
            orders_columns(),
            &["id"],
            vec![
                row(&[("id", "1"), ("amount", "10.00"), ("updated_at", "2024-01-01 08:00:00")]),
                row(&[("id", "2"), ("amount", "12.50"), ("updated_at", "2024-01-03 09:30:00")]),
                row(&[("id", "3"), ("amount", "7.25"), ("updated_at", "2024-01-02 17:45:00")]),
            ],
        )
        .await;

    let config = ingestion_config(
        SourcePlatform::Postgres,
        json!([{"orders": {
            "update_method": "incremental_load",
            "incremental_load_columns": [{"updated_at": null}],
        }}]),
    );
    let ingestion = connectors.ingestion(config);
    let bookmark_key = "crm_daily/orders_updated_at";

    let first = ingestion.run_table("orders").await.unwrap();

    let queries = connectors.source.exported_queries().await;
    assert!(queries[0].contains("updated_at > '1900-01-01 00:00:00'"));
    assert_eq!(first.rows_exported, Some(3));
    assert_eq!(
        first.bookmarks,
        vec![(bookmark_key.to_string(), "2024-01-03 09:30:00".to_string())]
    );
    assert_eq!(
        connectors.bookmarks.get(bookmark_key).await.unwrap().as_deref(),
        Some("2024-01-03 09:30:00")
    );
    assert_eq!(first.phases[first.phases.len() - 3], IngestionPhase::Bookmarking);

    // The destination did not exist, so both tables were created from the source catalog.
    assert_eq!(first.ddl.statements.len(), 4);
    assert!(first.ddl.statements[1].contains("SORTKEY"));
    assert!(connectors.warehouse.has_schema("crm").await);
    assert!(connectors.warehouse.has_schema("staging").await);
    let destination = connectors
        .warehouse
        .table(&destination_table("orders"))
        .await
        .unwrap();
    let staging = connectors
        .warehouse
        .table(&staging_table("orders"))
        .await
        .unwrap();
    assert_eq!(destination.columns, staging.columns);

    connectors
        .source
        .insert_rows(
            &orders,
            vec![row(&[
                ("id", "4"),
                ("amount", "99.99"),
                ("updated_at", "2024-01-05 12:00:00"),
            ])],
        )
        .await;

    let second = ingestion.run_table("orders").await.unwrap();

    let queries = connectors.source.exported_queries().await;
    assert!(queries[1].contains("updated_at > '2024-01-03 09:30:00'"));
    assert!(second.ddl.is_empty());
    assert_eq!(second.rows_exported, Some(1));
    assert_eq!(
        connectors.bookmarks.history(bookmark_key).await,
        vec!["2024-01-03 09:30:00", "2024-01-05 12:00:00"]
    );
    assert_eq!(
        connectors
            .warehouse
            .rows(&destination_table("orders"))
            .await
            .len(),
        4
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_increment_keeps_previous_bookmark() {
    init_test_tracing();
    let bookmark_key = "crm_daily/orders_updated_at";
    let mut connectors = TestConnectors::new();
    connectors.bookmarks =
        MemoryBookmarkStore::with_bookmarks([(bookmark_key, "2024-06-01 00:00:00")]);

    connectors
        .source
        .add_table(
            &source_table("orders"),
            orders_columns(),
            &["id"],
            vec![row(&[
                ("id", "1"),
                ("amount", "10.00"),
                ("updated_at", "2024-01-01 08:00:00"),
            ])],
        )
        .await;

    let config = ingestion_config(
        SourcePlatform::Postgres,
        json!([{"orders": {
            "update_method": "incremental_load",
            "incremental_load_columns": [{"updated_at": {"initial_value": "2000-01-01 00:00:00"}}],
        }}]),
    );
    let report = connectors
        .ingestion(config)
        .run_table("orders")
        .await
        .unwrap();

    assert_eq!(report.rows_exported, Some(0));
    assert!(report.bookmarks.is_empty());
    assert!(connectors.source.exported_queries().await[0].contains("'2024-06-01 00:00:00'"));
    assert_eq!(
        connectors.bookmarks.get(bookmark_key).await.unwrap().as_deref(),
        Some("2024-06-01 00:00:00")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn tracking_column_is_stamped_on_loaded_rows() {
    init_test_tracing();
    let connectors = TestConnectors::new();

    connectors
        .source
        .add_table(
            &source_table("customer"),
            customer_columns(),
            &["id"],
            vec![
                row(&[("id", "1"), ("email", "ada@example.com")]),
                row(&[("id", "2"), ("email", "grace@example.com")]),
            ],
        )
        .await;

    let config = ingestion_config(
        SourcePlatform::Postgres,
        json!([{"customer": {
            "update_method": "merge",
            "column_inclusions": ["id", "email"],
            "include_load_dts": true,
        }}]),
    );
    let report = connectors
        .ingestion(config)
        .run_table("customer")
        .await
        .unwrap();

    assert!(report.phases.contains(&IngestionPhase::Tracking));
    assert!(
        report.ddl.statements[1].ends_with(&format!(
            "{TRACKING_COLUMN} timestamp encode zstd) DISTSTYLE EVEN"
        ))
    );

    let statements = connectors.warehouse.statements().await;
    assert!(
        statements
            .iter()
            .any(|statement| statement.starts_with("COPY staging.crm_customer (id, email) FROM"))
    );

    let rows = connectors
        .warehouse
        .rows(&destination_table("customer"))
        .await;
    assert_eq!(rows.len(), 2);
    let load_time = rows[0].get(TRACKING_COLUMN).cloned();
    assert!(load_time.is_some());
    assert!(rows.iter().all(|row| row.get(TRACKING_COLUMN) == load_time.as_ref()));
}

#[tokio::test(flavor = "multi_thread")]
async fn reconciling_existing_tables_adds_only_missing_tracking_column() {
    init_test_tracing();
    let connectors = TestConnectors::new();

    connectors
        .source
        .add_table(
            &source_table("customer"),
            customer_columns(),
            &["id"],
            vec![row(&[("id", "1"), ("email", "ada@example.com")])],
        )
        .await;
    connectors
        .warehouse
        .create_table(&destination_table("customer"), customer_columns())
        .await;

    let config = ingestion_config(
        SourcePlatform::Postgres,
        json!([{"customer": {
            "update_method": "append",
            "column_inclusions": ["id", "email"],
            "include_load_dts": true,
        }}]),
    );
    let ingestion = connectors.ingestion(config);

    let first = ingestion.run_table("customer").await.unwrap();
    assert_eq!(
        first.ddl.statements,
        vec![
            "ALTER TABLE crm.customer ADD COLUMN load_dts timestamp encode zstd".to_string(),
            "CREATE TABLE staging.crm_customer (LIKE crm.customer)".to_string(),
        ]
    );

    let second = ingestion.run_table("customer").await.unwrap();
    assert!(second.ddl.is_empty());
    assert_eq!(
        connectors
            .warehouse
            .rows(&destination_table("customer"))
            .await
            .len(),
        2
    );
}
