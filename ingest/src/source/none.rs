use std::path::Path;

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::source::SourceConnector;
use crate::types::{ColumnDescriptor, QualifiedTable};

/// [`SourceConnector`] for pipelines whose rows already sit in object storage.
///
/// Such pipelines never reach the source, so every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSource;

impl SourceConnector for NoSource {
    async fn column_metadata(
        &self,
        table: &QualifiedTable,
        _filter: Option<&[String]>,
    ) -> IngestResult<Vec<ColumnDescriptor>> {
        bail!(
            ErrorKind::SourceQueryFailed,
            "No source database is configured",
            format!("column metadata of `{table}` was requested")
        );
    }

    async fn primary_keys(&self, table: &QualifiedTable) -> IngestResult<Vec<String>> {
        bail!(
            ErrorKind::SourceQueryFailed,
            "No source database is configured",
            format!("primary keys of `{table}` were requested")
        );
    }

    async fn export(&self, _query: &str, path: &Path, _delimiter: char) -> IngestResult<u64> {
        bail!(
            ErrorKind::SourceExportFailed,
            "No source database is configured",
            format!("an export to `{}` was requested", path.display())
        );
    }

    async fn table_exists(&self, table: &QualifiedTable) -> IngestResult<bool> {
        bail!(
            ErrorKind::SourceQueryFailed,
            "No source database is configured",
            format!("existence of `{table}` was requested")
        );
    }

    async fn execute(&self, _sql: &str) -> IngestResult<()> {
        bail!(
            ErrorKind::SourceQueryFailed,
            "No source database is configured"
        );
    }
}
