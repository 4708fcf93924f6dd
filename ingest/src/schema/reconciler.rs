use tracing::{debug, info, warn};

use crate::bail;
use crate::destination::DestinationConnector;
use crate::error::{ErrorKind, IngestResult};
use crate::mapping::map_column;
use crate::source::SourceConnector;
use crate::sql::{TRACKING_COLUMN, ddl};
use crate::table::TableConfig;
use crate::types::{ColumnDescriptor, QualifiedTable};

/// DDL issued while reconciling one table, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub statements: Vec<String>,
}

impl ReconcileReport {
    /// Returns `true` when the tables already matched and nothing was issued.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Makes sure the destination and staging tables of a run exist and carry the tracking column.
///
/// Only existence is compared: the reconciler never diffs column lists of existing tables.
#[derive(Debug)]
pub struct SchemaReconciler<'a, S, D> {
    source: &'a S,
    destination: &'a D,
}

impl<'a, S, D> SchemaReconciler<'a, S, D>
where
    S: SourceConnector,
    D: DestinationConnector,
{
    pub fn new(source: &'a S, destination: &'a D) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Reconciles the tables of `table` and returns the DDL that was issued.
    ///
    /// Running it again right after a successful call issues nothing.
    pub async fn reconcile(&self, table: &TableConfig) -> IngestResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        let destination_exists = self.destination.table_exists(&table.destination).await?;
        let staging_exists = self.destination.table_exists(&table.staging).await?;

        debug!(
            destination = %table.destination,
            destination_exists,
            staging = %table.staging,
            staging_exists,
            "checked table existence"
        );

        if table.include_load_dts {
            if destination_exists {
                self.ensure_tracking_column(&table.destination, &mut report)
                    .await?;
            }
            if staging_exists {
                self.ensure_tracking_column(&table.staging, &mut report)
                    .await?;
            }
        }

        match (destination_exists, staging_exists) {
            (true, true) => {}
            (true, false) => {
                let statement = ddl::create_table_like(&table.staging, &table.destination);
                self.issue(statement, &mut report).await?;
            }
            (false, _) if table.source_platform.is_database() => {
                self.create_from_source(table, !staging_exists, &mut report)
                    .await?;
            }
            (false, staging_exists) => {
                warn!(
                    destination = %table.destination,
                    staging_exists,
                    "destination table is missing and cannot be derived from object storage, skipping creation"
                );
            }
        }

        if !report.is_empty() {
            info!(
                table = %table.source_table,
                statements = report.statements.len(),
                "reconciled destination schema"
            );
        }

        Ok(report)
    }

    /// Adds the tracking column to `table` when it is missing.
    async fn ensure_tracking_column(
        &self,
        table: &QualifiedTable,
        report: &mut ReconcileReport,
    ) -> IngestResult<()> {
        let columns = self.destination.column_metadata(table).await?;

        match columns.iter().find(|column| column.name == TRACKING_COLUMN) {
            None => self.issue(ddl::add_tracking_column(table), report).await,
            Some(column) if is_timestamp(column) => Ok(()),
            Some(column) => bail!(
                ErrorKind::SchemaConflict,
                "Tracking column has an incompatible type",
                format!(
                    "`{table}.{TRACKING_COLUMN}` exists with type `{}` instead of a timestamp",
                    column.data_type
                )
            ),
        }
    }

    /// Creates the destination table, and the staging table when `with_staging`, from the source
    /// column metadata.
    async fn create_from_source(
        &self,
        table: &TableConfig,
        with_staging: bool,
        report: &mut ReconcileReport,
    ) -> IngestResult<()> {
        let Some(source) = &table.source else {
            bail!(
                ErrorKind::InvalidState,
                "Database source table is not resolved",
                format!("`{}` has no source table", table.source_table)
            );
        };

        let mut columns = self
            .source
            .column_metadata(source, Some(table.column_inclusions.as_slice()))
            .await?;
        if columns.is_empty() {
            bail!(
                ErrorKind::SourceQueryFailed,
                "Source table has no readable columns",
                format!(
                    "no column of `{source}` matches the inclusions {:?}",
                    table.column_inclusions
                )
            );
        }
        columns.sort_by_key(|column| column.ordinal_position);

        let definitions = column_definitions(table, &columns);

        self.issue(ddl::create_schema(&table.destination.schema), report)
            .await?;
        self.issue(ddl::create_table(&table.destination, &definitions), report)
            .await?;

        if with_staging {
            self.issue(ddl::create_schema(&table.staging.schema), report)
                .await?;
            self.issue(ddl::create_table(&table.staging, &definitions), report)
                .await?;
        }

        Ok(())
    }

    async fn issue(&self, statement: String, report: &mut ReconcileReport) -> IngestResult<()> {
        debug!(sql = %statement, "issuing ddl");
        self.destination.execute(&statement).await?;
        report.statements.push(statement);

        Ok(())
    }
}

/// Returns the mapped column definitions of a new table.
fn column_definitions(table: &TableConfig, columns: &[ColumnDescriptor]) -> Vec<String> {
    let mut definitions: Vec<String> = columns
        .iter()
        .map(|column| {
            let mut definition = map_column(table.source_platform, column);
            if table.sort_key.as_deref() == Some(column.name.as_str()) {
                definition.push_str(" SORTKEY");
            }
            definition
        })
        .collect();

    if table.include_load_dts && !columns.iter().any(|column| column.name == TRACKING_COLUMN) {
        definitions.push(ddl::tracking_column_definition());
    }

    definitions
}

fn is_timestamp(column: &ColumnDescriptor) -> bool {
    column.data_type.trim().to_lowercase().starts_with("timestamp")
}
