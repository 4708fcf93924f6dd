use std::future::Future;

use crate::error::IngestResult;

/// Trait for storing the watermarks of incremental extractions across runs.
///
/// Keys have the form `{dag_name}/{table}_{column}` (see [`bookmark_key`]) and values are the
/// literal last extracted value. Writes are last-writer-wins per key.
pub trait BookmarkStore {
    /// Returns the stored bookmark for `key`, if any.
    fn get(&self, key: &str) -> impl Future<Output = IngestResult<Option<String>>> + Send;

    /// Stores `value` under `key`, replacing any previous bookmark.
    fn set(&self, key: &str, value: String) -> impl Future<Output = IngestResult<()>> + Send;
}

/// Returns the bookmark key of `column` for a table with the given key prefix.
pub fn bookmark_key(prefix: &str, column: &str) -> String {
    format!("{prefix}_{column}")
}
