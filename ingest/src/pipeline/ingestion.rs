use std::path::PathBuf;

use chrono::Utc;
use ingest_config::shared::{IngestionConfig, TableDeclaration};
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::destination::DestinationConnector;
use crate::error::{ErrorKind, IngestResult};
use crate::ingest_error;
use crate::object_store::ObjectStoreConnector;
use crate::pipeline::runner::{Connectors, TableRunReport, TableRunner};
use crate::source::SourceConnector;
use crate::store::bookmark::BookmarkStore;
use crate::table::{SourceCatalog, TableConfig};
use crate::types::QualifiedTable;

/// Format of the load timestamp stamped into the tracking column.
const LOAD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Runs the tables of one ingestion declaration against a set of connectors.
///
/// Tables run one after the other in declaration order, each with its own resolved
/// [`TableConfig`] and load timestamp.
#[derive(Debug)]
pub struct Ingestion<S, D, O, B> {
    config: IngestionConfig,
    source: S,
    destination: D,
    object_store: O,
    bookmarks: B,
    work_dir: PathBuf,
}

impl<S, D, O, B> Ingestion<S, D, O, B>
where
    S: SourceConnector,
    D: DestinationConnector,
    O: ObjectStoreConnector,
    B: BookmarkStore,
{
    /// Creates an ingestion after validating `config`.
    ///
    /// Export artifacts are written to the system temporary directory unless
    /// [`Ingestion::with_work_dir`] is used.
    pub fn new(
        config: IngestionConfig,
        source: S,
        destination: D,
        object_store: O,
        bookmarks: B,
    ) -> IngestResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            source,
            destination,
            object_store,
            bookmarks,
            work_dir: std::env::temp_dir(),
        })
    }

    /// Sets the directory export artifacts are written to.
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Runs every declared table, stopping at the first failure.
    ///
    /// Tables after a failed one are not attempted.
    pub async fn run_all(&self) -> IngestResult<Vec<TableRunReport>> {
        let tables: Vec<(&str, &TableDeclaration)> = self.config.table_declarations().collect();

        info!(
            dag_name = %self.config.pipeline.dag_name,
            destination = D::name(),
            tables = tables.len(),
            "starting ingestion"
        );

        let mut reports = Vec::with_capacity(tables.len());
        for (name, declaration) in tables {
            match self.run_declared(name, declaration).await {
                Ok(report) => reports.push(report),
                Err(err) => {
                    error!(
                        dag_name = %self.config.pipeline.dag_name,
                        table = name,
                        completed = reports.len(),
                        "ingestion aborted"
                    );
                    return Err(err);
                }
            }
        }

        info!(
            dag_name = %self.config.pipeline.dag_name,
            tables = reports.len(),
            "ingestion finished"
        );

        Ok(reports)
    }

    /// Runs the single declared table `name`.
    pub async fn run_table(&self, name: &str) -> IngestResult<TableRunReport> {
        let Some(declaration) = self.config.table_declaration(name) else {
            return Err(ingest_error!(
                ErrorKind::ConfigError,
                "Table is not declared",
                format!(
                    "`{name}` is not listed in the tables of `{}`",
                    self.config.pipeline.dag_name
                )
            )
            .with_table(name));
        };

        self.run_declared(name, declaration).await
    }

    /// Resolves `name` and drives it through its phases inside a dedicated span.
    async fn run_declared(
        &self,
        name: &str,
        declaration: &TableDeclaration,
    ) -> IngestResult<TableRunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("table_run", %run_id, table = name);

        async move {
            let table = self.resolve(name, declaration).await?;
            let load_time = Utc::now().format(LOAD_TIME_FORMAT).to_string();

            info!(
                update_method = %table.update_method,
                destination = %table.destination,
                %load_time,
                "starting table run"
            );

            let connectors = Connectors {
                source: &self.source,
                destination: &self.destination,
                object_store: &self.object_store,
                bookmarks: &self.bookmarks,
            };

            TableRunner::new(
                &self.config.pipeline,
                table,
                connectors,
                self.work_dir.clone(),
                load_time,
            )
            .run()
            .await
        }
        .instrument(span)
        .await
    }

    /// Resolves the table configuration, reading the source catalog when something has to be
    /// inferred from it.
    async fn resolve(&self, name: &str, declaration: &TableDeclaration) -> IngestResult<TableConfig> {
        let pipeline = &self.config.pipeline;

        let needs_catalog = pipeline.source_platform.is_database()
            && (declaration
                .column_inclusions
                .as_ref()
                .is_none_or(|columns| columns.is_empty())
                || declaration
                    .update_keys
                    .as_ref()
                    .is_none_or(|keys| keys.is_empty()));

        let catalog = if needs_catalog {
            let source = QualifiedTable::new(pipeline.source_schema(), name);
            let catalog = SourceCatalog::fetch(&self.source, &source)
                .await
                .map_err(|err| err.with_phase("resolving").with_table(name))?;
            Some(catalog)
        } else {
            None
        };

        TableConfig::resolve(name, declaration, pipeline, catalog.as_ref())
            .map_err(|err| err.with_phase("resolving"))
    }
}
