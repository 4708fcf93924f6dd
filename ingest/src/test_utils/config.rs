//! Builders for ingestion declarations used in tests.

use ingest_config::shared::{IngestionConfig, SourcePlatform};

pub const TEST_DAG_NAME: &str = "crm_daily";
pub const TEST_SOURCE_SCHEMA: &str = "shop";
pub const TEST_DESTINATION_SCHEMA: &str = "crm";
pub const TEST_BUCKET: &str = "datalake";

/// Returns an ingestion declaration reading from `platform` with the given `tables` list.
///
/// `tables` uses the declaration file layout, e.g.
/// `json!([{"customer": {"update_method": "merge"}}])`.
pub fn ingestion_config(platform: SourcePlatform, tables: serde_json::Value) -> IngestionConfig {
    let mut document = serde_json::json!({
        "dag_name": TEST_DAG_NAME,
        "source_platform": platform.as_str(),
        "destination_schema": TEST_DESTINATION_SCHEMA,
        "s3_bucket_name": TEST_BUCKET,
        "source_credentials": "shop_reader",
        "tables": tables,
    });
    if platform.is_database() {
        document["source_schema"] = serde_json::json!(TEST_SOURCE_SCHEMA);
    }

    serde_json::from_value(document).expect("failed to build the test ingestion config")
}
