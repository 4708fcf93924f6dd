use std::future::Future;

use crate::error::IngestResult;
use crate::types::{ColumnDescriptor, QualifiedTable};

/// Trait for warehouses staged rows are loaded into.
///
/// The engine issues complete SQL text built by [`crate::sql`], so implementations only forward
/// statements to their connection. Statements are issued one at a time and in order.
pub trait DestinationConnector {
    /// Returns the name of the destination.
    fn name() -> &'static str;

    /// Returns the column metadata of `table` ordered by ordinal position.
    fn column_metadata(
        &self,
        table: &QualifiedTable,
    ) -> impl Future<Output = IngestResult<Vec<ColumnDescriptor>>> + Send;

    /// Returns whether `table` exists.
    fn table_exists(&self, table: &QualifiedTable)
    -> impl Future<Output = IngestResult<bool>> + Send;

    /// Executes a DDL or DML statement.
    fn execute(&self, sql: &str) -> impl Future<Output = IngestResult<()>> + Send;

    /// Executes a bulk load statement.
    ///
    /// Kept apart from [`DestinationConnector::execute`] so that load failures surface as
    /// [`crate::error::ErrorKind::DestinationLoadFailed`].
    fn copy(&self, sql: &str) -> impl Future<Output = IngestResult<()>> + Send;

    /// Runs a query returning a single value, `None` when it is `NULL` or no row is returned.
    fn query_value(&self, sql: &str) -> impl Future<Output = IngestResult<Option<String>>> + Send;
}
