use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::ingest_error;
use crate::object_store::ObjectStoreConnector;

/// Prefix archived objects are moved under.
pub const ARCHIVE_PREFIX: &str = "archive";

#[derive(Debug, Default)]
struct Inner {
    /// Objects keyed by `(bucket, key)`.
    objects: BTreeMap<(String, String), Vec<u8>>,
    fail_archive: bool,
}

/// In-memory [`ObjectStoreConnector`].
///
/// Archiving moves objects under `archive/`, keeping their full key.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an object directly, as if another system had dropped it in the bucket.
    pub async fn put(&self, bucket: &str, key: &str, contents: impl Into<Vec<u8>>) {
        let mut inner = self.inner.lock().await;
        inner
            .objects
            .insert((bucket.to_string(), key.to_string()), contents.into());
    }

    /// Returns the contents of an object.
    pub async fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().await;
        inner
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Returns every key stored in `bucket`, sorted.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner
            .objects
            .keys()
            .filter(|(object_bucket, _)| object_bucket == bucket)
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Returns every object of `bucket` whose key starts with `prefix`.
    pub async fn objects_with_prefix(&self, bucket: &str, prefix: &str) -> Vec<(String, Vec<u8>)> {
        let inner = self.inner.lock().await;
        inner
            .objects
            .iter()
            .filter(|((object_bucket, key), _)| object_bucket == bucket && key.starts_with(prefix))
            .map(|((_, key), contents)| (key.clone(), contents.clone()))
            .collect()
    }

    /// Makes every subsequent archive call fail.
    pub async fn fail_archive(&self) {
        let mut inner = self.inner.lock().await;
        inner.fail_archive = true;
    }
}

impl ObjectStoreConnector for MemoryObjectStore {
    async fn upload(&self, local_path: &Path, bucket: &str, key: &str) -> IngestResult<()> {
        let contents = tokio::fs::read(local_path).await.map_err(|err| {
            ingest_error!(
                ErrorKind::ObjectStoreFailed,
                "Upload failed",
                format!("reading `{}` failed", local_path.display()),
                source: err
            )
        })?;

        info!(%bucket, %key, bytes = contents.len(), "uploading object");
        self.put(bucket, key, contents).await;

        Ok(())
    }

    async fn move_prefix(
        &self,
        bucket: &str,
        src_prefix: &str,
        dst_prefix: &str,
    ) -> IngestResult<usize> {
        let mut inner = self.inner.lock().await;

        let keys: Vec<String> = inner
            .objects
            .keys()
            .filter(|(object_bucket, key)| object_bucket == bucket && key.starts_with(src_prefix))
            .map(|(_, key)| key.clone())
            .collect();

        for key in &keys {
            let file_name = key.rsplit('/').next().unwrap_or(key.as_str());
            let destination = format!("{}/{file_name}", dst_prefix.trim_end_matches('/'));

            if let Some(contents) = inner.objects.remove(&(bucket.to_string(), key.clone())) {
                inner
                    .objects
                    .insert((bucket.to_string(), destination), contents);
            }
        }

        Ok(keys.len())
    }

    async fn archive(&self, bucket: &str, key: &str) -> IngestResult<()> {
        let mut inner = self.inner.lock().await;

        if inner.fail_archive {
            bail!(
                ErrorKind::ObjectStoreFailed,
                "Archive failed",
                format!("archiving `{key}` in `{bucket}` was rejected")
            );
        }

        let keys: Vec<String> = inner
            .objects
            .keys()
            .filter(|(object_bucket, object_key)| object_bucket == bucket && object_key.starts_with(key))
            .map(|(_, object_key)| object_key.clone())
            .collect();

        for object_key in keys {
            if let Some(contents) = inner
                .objects
                .remove(&(bucket.to_string(), object_key.clone()))
            {
                inner.objects.insert(
                    (bucket.to_string(), format!("{ARCHIVE_PREFIX}/{object_key}")),
                    contents,
                );
            }
        }

        Ok(())
    }
}
