use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::IngestResult;
use crate::store::bookmark::BookmarkStore;

/// Inner state of [`MemoryBookmarkStore`].
#[derive(Debug, Default)]
struct Inner {
    bookmarks: HashMap<String, String>,
    /// Every value written per key, oldest first.
    history: HashMap<String, Vec<String>>,
}

/// In-memory [`BookmarkStore`].
///
/// Bookmarks are lost when the process exits, which makes the store suitable for tests and for
/// one-off runs seeded with [`MemoryBookmarkStore::with_bookmarks`].
#[derive(Debug, Clone, Default)]
pub struct MemoryBookmarkStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBookmarkStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `bookmarks`.
    pub fn with_bookmarks<I, K, V>(bookmarks: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let inner = Inner {
            bookmarks: bookmarks
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            history: HashMap::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Returns every value written under `key` since the store was created.
    pub async fn history(&self, key: &str) -> Vec<String> {
        let inner = self.inner.lock().await;

        inner.history.get(key).cloned().unwrap_or_default()
    }
}

impl BookmarkStore for MemoryBookmarkStore {
    async fn get(&self, key: &str) -> IngestResult<Option<String>> {
        let inner = self.inner.lock().await;

        Ok(inner.bookmarks.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> IngestResult<()> {
        let mut inner = self.inner.lock().await;

        inner
            .history
            .entry(key.to_string())
            .or_default()
            .push(value.clone());
        inner.bookmarks.insert(key.to_string(), value);

        Ok(())
    }
}
