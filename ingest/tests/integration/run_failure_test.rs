use ingest::error::ErrorKind;
use ingest::test_utils::config::ingestion_config;
use ingest::test_utils::row;
use ingest::types::ColumnDescriptor;
use ingest_config::shared::SourcePlatform;
use ingest_telemetry::tracing::init_test_tracing;
use serde_json::json;

use crate::common::{
    TestConnectors, customer_columns, destination_table, orders_columns, source_table,
};

#[tokio::test(flavor = "multi_thread")]
async fn batch_stops_at_first_failed_table() {
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
        .source
        .add_table(
            &source_table("orders"),
            orders_columns(),
            &["id"],
            vec![row(&[("id", "1"), ("amount", "3.00")])],
        )
        .await;
    connectors
        .warehouse
        .create_table(&destination_table("customer"), customer_columns())
        .await;
    connectors
        .warehouse
        .fail_statements_starting_with("INSERT INTO crm.customer")
        .await;

    let config = ingestion_config(
        SourcePlatform::Postgres,
        json!([
            {"customer": {"update_method": "full_load"}},
            {"orders": {"update_method": "append"}},
        ]),
    );
    let err = connectors.ingestion(config).run_all().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationQueryFailed);
    assert_eq!(err.table(), Some("customer"));
    assert_eq!(err.phase(), Some("replacing"));

    assert_eq!(connectors.source.exported_queries().await.len(), 1);
    assert!(
        connectors
            .warehouse
            .table(&destination_table("orders"))
            .await
            .is_none()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn merge_without_keys_is_rejected_before_touching_the_warehouse() {
    init_test_tracing();
    let connectors = TestConnectors::new();

    connectors
        .source
        .add_table(
            &source_table("customer"),
            customer_columns(),
            &[],
            vec![row(&[("id", "1"), ("email", "ada@example.com")])],
        )
        .await;

    let config = ingestion_config(
        SourcePlatform::Postgres,
        json!([{"customer": {"update_method": "merge"}}]),
    );
    let err = connectors
        .ingestion(config)
        .run_table("customer")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
    assert_eq!(err.table(), Some("customer"));
    assert_eq!(err.phase(), Some("resolving"));
    assert!(connectors.warehouse.statements().await.is_empty());
    assert!(connectors.source.exported_queries().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn undeclared_table_is_rejected() {
    init_test_tracing();
    let connectors = TestConnectors::new();

    let config = ingestion_config(
        SourcePlatform::Postgres,
        json!([{"customer": {"update_method": "append"}}]),
    );
    let err = connectors
        .ingestion(config)
        .run_table("invoices")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
    assert_eq!(err.table(), Some("invoices"));
}

#[tokio::test(flavor = "multi_thread")]
async fn tracking_column_with_wrong_type_is_a_schema_conflict() {
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

    let mut columns = customer_columns();
    columns.push(ColumnDescriptor::new("load_dts", "varchar(32)", 3));
    connectors
        .warehouse
        .create_table(&destination_table("customer"), columns)
        .await;

    let config = ingestion_config(
        SourcePlatform::Postgres,
        json!([{"customer": {
            "update_method": "append",
            "column_inclusions": ["id", "email"],
            "include_load_dts": true,
        }}]),
    );
    let err = connectors
        .ingestion(config)
        .run_table("customer")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SchemaConflict);
    assert_eq!(err.phase(), Some("reconciling"));
    assert_eq!(err.table(), Some("customer"));
    assert!(connectors.warehouse.statements().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn incremental_column_outside_inclusions_is_rejected_before_loading() {
    init_test_tracing();
    let connectors = TestConnectors::new();

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
            "column_inclusions": ["id", "amount"],
            "incremental_load_columns": [{"updated_at": null}],
        }}]),
    );
    let err = connectors
        .ingestion(config)
        .run_table("orders")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
    assert_eq!(err.table(), Some("orders"));
    assert_eq!(err.phase(), Some("resolving"));
    assert!(connectors.source.exported_queries().await.is_empty());
    assert!(connectors.warehouse.statements().await.is_empty());
    assert!(
        connectors
            .warehouse
            .table(&destination_table("orders"))
            .await
            .is_none()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn table_missing_from_source_is_rejected_at_resolution() {
    init_test_tracing();
    let connectors = TestConnectors::new();

    let config = ingestion_config(
        SourcePlatform::Postgres,
        json!([{"customer": {"update_method": "append"}}]),
    );
    let err = connectors
        .ingestion(config)
        .run_table("customer")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
    assert_eq!(err.phase(), Some("resolving"));
    assert!(connectors.warehouse.statements().await.is_empty());
}
