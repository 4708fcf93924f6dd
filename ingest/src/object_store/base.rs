use std::future::Future;
use std::path::Path;

use crate::error::IngestResult;

/// Trait for the object store export artifacts travel through.
pub trait ObjectStoreConnector {
    /// Uploads the file at `local_path` to `key` in `bucket`, replacing any existing object.
    fn upload(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = IngestResult<()>> + Send;

    /// Moves every object whose key starts with `src_prefix` under `dst_prefix`.
    ///
    /// Moved objects keep their file name, the part of the key after the last `/`. Returns the
    /// number of objects moved.
    fn move_prefix(
        &self,
        bucket: &str,
        src_prefix: &str,
        dst_prefix: &str,
    ) -> impl Future<Output = IngestResult<usize>> + Send;

    /// Archives every object whose key starts with `key` once it has been loaded.
    fn archive(&self, bucket: &str, key: &str) -> impl Future<Output = IngestResult<()>> + Send;
}

/// Returns the `s3://` URL of `key` in `bucket`.
pub fn object_url(bucket: &str, key: &str) -> String {
    format!("s3://{bucket}/{}", key.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_has_a_single_separator() {
        assert_eq!(
            object_url("datalake", "crm_daily/customer.csv.gz"),
            "s3://datalake/crm_daily/customer.csv.gz"
        );
        assert_eq!(object_url("datalake", "/landing/orders"), "s3://datalake/landing/orders");
    }
}
