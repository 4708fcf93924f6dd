use ingest::error::ErrorKind;
use ingest::secrets::resolve_pipeline_credentials;
use ingest::test_utils::MemorySecretProvider;
use ingest::test_utils::config::ingestion_config;
use ingest_config::shared::SourcePlatform;
use ingest_telemetry::tracing::init_test_tracing;
use serde_json::json;

const SOURCE_DOCUMENT: &str =
    r#"{"username": "shop_reader", "password": "s3cret", "host": "shop.internal", "port": 5432, "dbname": "shop"}"#;
const DESTINATION_DOCUMENT: &str =
    r#"{"username": "loader", "password": "hunter2", "host": "dw.internal", "port": 5439}"#;

#[tokio::test(flavor = "multi_thread")]
async fn database_pipeline_resolves_both_credentials() {
    init_test_tracing();

    let provider = MemorySecretProvider::new()
        .with_document("shop_reader", SOURCE_DOCUMENT)
        .with_document("redshift_ac_master", DESTINATION_DOCUMENT);
    let config = ingestion_config(
        SourcePlatform::Postgres,
        json!([{"customer": {"update_method": "append"}}]),
    );

    let credentials = resolve_pipeline_credentials(&provider, &config.pipeline)
        .await
        .unwrap();

    let source = credentials.source.unwrap();
    assert_eq!(source.username, "shop_reader");
    assert_eq!(source.dbname.as_deref(), Some("shop"));
    assert_eq!(credentials.destination.username, "loader");
    assert_eq!(credentials.destination.password(), "hunter2");
}

#[tokio::test(flavor = "multi_thread")]
async fn object_storage_pipeline_needs_only_the_warehouse() {
    init_test_tracing();

    let provider =
        MemorySecretProvider::new().with_document("redshift_ac_master", DESTINATION_DOCUMENT);
    let config = ingestion_config(
        SourcePlatform::S3,
        json!([{"events": {"update_method": "append", "s3_object": "landing/events"}}]),
    );

    let credentials = resolve_pipeline_credentials(&provider, &config.pipeline)
        .await
        .unwrap();

    assert!(credentials.source.is_none());
    assert_eq!(credentials.destination.host.as_deref(), Some("dw.internal"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_reference_fails_resolution() {
    init_test_tracing();

    let provider = MemorySecretProvider::new().with_document("shop_reader", SOURCE_DOCUMENT);
    let config = ingestion_config(
        SourcePlatform::Postgres,
        json!([{"customer": {"update_method": "append"}}]),
    );

    let err = resolve_pipeline_credentials(&provider, &config.pipeline)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SecretResolutionFailed);
}
