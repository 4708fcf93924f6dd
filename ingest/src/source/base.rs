use std::future::Future;
use std::path::Path;

use crate::error::IngestResult;
use crate::types::{ColumnDescriptor, QualifiedTable};

/// Trait for database systems rows are extracted from.
///
/// [`SourceConnector`] implementations own their connection and are used by a single table run
/// at a time. Every call is awaited before the next one is issued.
///
/// Failures should be reported with [`crate::error::ErrorKind::SourceQueryFailed`] or
/// [`crate::error::ErrorKind::SourceExportFailed`]; the engine never retries them.
pub trait SourceConnector {
    /// Returns the column metadata of `table` ordered by ordinal position.
    ///
    /// When `filter` is set only the named columns are returned. An unknown table yields an
    /// empty list.
    fn column_metadata(
        &self,
        table: &QualifiedTable,
        filter: Option<&[String]>,
    ) -> impl Future<Output = IngestResult<Vec<ColumnDescriptor>>> + Send;

    /// Returns the primary key columns of `table`, empty when it has none.
    fn primary_keys(
        &self,
        table: &QualifiedTable,
    ) -> impl Future<Output = IngestResult<Vec<String>>> + Send;

    /// Runs `query` and writes its result, header first, to `path` as delimited text.
    ///
    /// Returns the number of rows written.
    fn export(
        &self,
        query: &str,
        path: &Path,
        delimiter: char,
    ) -> impl Future<Output = IngestResult<u64>> + Send;

    /// Returns whether `table` exists.
    fn table_exists(&self, table: &QualifiedTable)
    -> impl Future<Output = IngestResult<bool>> + Send;

    /// Executes a statement that returns no rows.
    fn execute(&self, sql: &str) -> impl Future<Output = IngestResult<()>> + Send;
}
