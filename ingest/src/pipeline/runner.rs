use std::path::PathBuf;

use ingest_config::shared::PipelineConfig;
use tracing::{debug, error, info, warn};

use crate::bail;
use crate::destination::DestinationConnector;
use crate::error::{ErrorKind, IngestResult};
use crate::object_store::{ObjectStoreConnector, object_url};
use crate::pipeline::phase::{IngestionPhase, next_phase};
use crate::schema::{ReconcileReport, SchemaReconciler};
use crate::source::SourceConnector;
use crate::sql::{
    AppendParams, AppendStatementBuilder, CopyParams, CopyStatementBuilder, DeleteParams,
    DeleteStatementBuilder, SelectParams, SelectStatementBuilder, StatementBuilder, ddl,
};
use crate::store::bookmark::BookmarkStore;
use crate::table::TableConfig;

/// Delimiter of export artifacts.
pub const EXPORT_DELIMITER: char = ',';

/// Name of the folder claimed object-storage files are moved into.
pub const PROCESSING_FOLDER: &str = "processing";

/// How a table run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Rows were applied to the destination.
    Loaded,
    /// No files were waiting in object storage.
    Skipped,
}

/// Summary of a successful table run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRunReport {
    pub source_table: String,
    pub outcome: RunOutcome,
    /// Every phase entered, in order, ending with the terminal one.
    pub phases: Vec<IngestionPhase>,
    pub ddl: ReconcileReport,
    /// Rows written to the export artifact, `None` for object-storage sources.
    pub rows_exported: Option<u64>,
    /// Bookmarks stored by this run as `(key, value)` pairs.
    pub bookmarks: Vec<(String, String)>,
}

/// Connectors a table run talks to.
#[derive(Debug)]
pub struct Connectors<'a, S, D, O, B> {
    pub source: &'a S,
    pub destination: &'a D,
    pub object_store: &'a O,
    pub bookmarks: &'a B,
}

enum Step {
    Continue,
    Skip,
}

/// Drives one resolved table through its phases.
pub struct TableRunner<'a, S, D, O, B> {
    pipeline: &'a PipelineConfig,
    table: TableConfig,
    connectors: Connectors<'a, S, D, O, B>,
    work_dir: PathBuf,
    /// Timestamp literal stamped into the tracking column.
    load_time: String,
    /// Key of the uploaded or claimed objects the staging COPY reads.
    object_key: String,
    report: TableRunReport,
}

impl<'a, S, D, O, B> TableRunner<'a, S, D, O, B>
where
    S: SourceConnector,
    D: DestinationConnector,
    O: ObjectStoreConnector,
    B: BookmarkStore,
{
    pub fn new(
        pipeline: &'a PipelineConfig,
        table: TableConfig,
        connectors: Connectors<'a, S, D, O, B>,
        work_dir: impl Into<PathBuf>,
        load_time: impl Into<String>,
    ) -> Self {
        let report = TableRunReport {
            source_table: table.source_table.clone(),
            outcome: RunOutcome::Loaded,
            phases: Vec::new(),
            ddl: ReconcileReport::default(),
            rows_exported: None,
            bookmarks: Vec::new(),
        };

        Self {
            pipeline,
            object_key: table.s3_object.clone(),
            table,
            connectors,
            work_dir: work_dir.into(),
            load_time: load_time.into(),
            report,
        }
    }

    /// Runs every phase until a terminal one is reached.
    ///
    /// On failure the error carries the table name and the phase that failed.
    pub async fn run(mut self) -> IngestResult<TableRunReport> {
        let mut phase = IngestionPhase::Reconciling;

        loop {
            self.report.phases.push(phase);

            if phase.is_terminal() {
                info!(table = %self.table.source_table, %phase, "table run finished");
                break;
            }

            info!(table = %self.table.source_table, %phase, "entering phase");

            match self.execute(phase).await {
                Ok(Step::Continue) => phase = next_phase(phase, &self.table),
                Ok(Step::Skip) => {
                    self.report.outcome = RunOutcome::Skipped;
                    phase = IngestionPhase::Skipped;
                }
                Err(err) => {
                    error!(
                        table = %self.table.source_table,
                        %phase,
                        error = %err,
                        "table run failed"
                    );

                    return Err(err
                        .with_phase(phase.as_str())
                        .with_table(self.table.source_table.clone()));
                }
            }
        }

        Ok(self.report)
    }

    async fn execute(&mut self, phase: IngestionPhase) -> IngestResult<Step> {
        match phase {
            IngestionPhase::Reconciling => self.reconcile().await?,
            IngestionPhase::Claiming => return self.claim().await,
            IngestionPhase::Extracting => self.extract().await?,
            IngestionPhase::Uploading => self.upload().await?,
            IngestionPhase::Staging => self.stage().await?,
            IngestionPhase::Tracking => self.track().await?,
            IngestionPhase::Merging => self.merge().await?,
            IngestionPhase::Replacing => self.replace().await?,
            IngestionPhase::Appending => self.append().await?,
            IngestionPhase::Bookmarking => self.bookmark().await?,
            IngestionPhase::Archiving => self.archive().await?,
            IngestionPhase::Done | IngestionPhase::Skipped | IngestionPhase::Failed => {
                bail!(
                    ErrorKind::InvalidState,
                    "Terminal phase cannot be executed",
                    format!("phase `{phase}` has no action")
                );
            }
        }

        Ok(Step::Continue)
    }

    async fn reconcile(&mut self) -> IngestResult<()> {
        let reconciler =
            SchemaReconciler::new(self.connectors.source, self.connectors.destination);
        self.report.ddl = reconciler.reconcile(&self.table).await?;

        Ok(())
    }

    /// Moves waiting files into the processing folder, skipping the run when there are none.
    async fn claim(&mut self) -> IngestResult<Step> {
        let bucket = &self.pipeline.s3_bucket_name;
        let prefix = &self.table.s3_object;

        let (folder, file_prefix) = match prefix.rsplit_once('/') {
            Some((folder, file_prefix)) => (format!("{folder}/{PROCESSING_FOLDER}"), file_prefix),
            None => (PROCESSING_FOLDER.to_string(), prefix.as_str()),
        };

        let moved = self
            .connectors
            .object_store
            .move_prefix(bucket, prefix, &folder)
            .await?;

        if moved == 0 {
            warn!(%bucket, %prefix, "no files found in object storage, skipping ingestion");
            return Ok(Step::Skip);
        }

        info!(%bucket, %prefix, moved, "claimed files for processing");
        self.object_key = format!("{folder}/{file_prefix}");

        Ok(Step::Continue)
    }

    async fn extract(&mut self) -> IngestResult<()> {
        let Some(source) = &self.table.source else {
            bail!(
                ErrorKind::InvalidState,
                "Database source table is not resolved"
            );
        };

        let mut predicates = Vec::with_capacity(self.table.incremental_columns.len());
        if self.table.is_incremental() {
            for column in &self.table.incremental_columns {
                let key = self.table.bookmark_key(column);
                let value = match self.connectors.bookmarks.get(&key).await? {
                    Some(value) => value,
                    None => {
                        debug!(%key, initial_value = %column.initial_value, "no bookmark stored yet");
                        column.initial_value.clone()
                    }
                };
                predicates.push(column.render(&value));
            }
        }

        let query = SelectStatementBuilder::default()
            .set_params(SelectParams {
                source_platform: self.table.source_platform,
                schema: source.schema.clone(),
                table: source.table.clone(),
                columns: self.table.column_inclusions.clone(),
                transformations: self.table.column_transformations.clone(),
                predicates,
            })
            .build()?;
        debug!(sql = %query, "extraction query");

        let path = self.work_dir.join(&self.table.filename);
        let rows = self
            .connectors
            .source
            .export(&query, &path, EXPORT_DELIMITER)
            .await?;

        info!(rows, path = %path.display(), "exported source rows");
        self.report.rows_exported = Some(rows);

        Ok(())
    }

    async fn upload(&mut self) -> IngestResult<()> {
        let path = self.work_dir.join(&self.table.filename);
        let bucket = &self.pipeline.s3_bucket_name;

        self.connectors
            .object_store
            .upload(&path, bucket, &self.object_key)
            .await?;
        debug!(url = %object_url(bucket, &self.object_key), "uploaded export artifact");

        Ok(())
    }

    async fn stage(&mut self) -> IngestResult<()> {
        self.execute_sql(ddl::truncate_table(&self.table.staging))
            .await?;

        let copy = CopyStatementBuilder::default()
            .set_params(CopyParams {
                table: self.table.staging.clone(),
                columns: self.table.copy_columns(),
                path: object_url(&self.pipeline.s3_bucket_name, &self.object_key),
                iam_role: self.pipeline.iam_role.clone(),
                options: self.table.copy_options.clone(),
            })
            .build()?;
        debug!(sql = %copy, "copying into staging");

        self.connectors.destination.copy(&copy).await
    }

    async fn track(&mut self) -> IngestResult<()> {
        let statement = ddl::update_tracking_column(&self.table.staging, &self.load_time);
        self.execute_sql(statement).await
    }

    async fn merge(&mut self) -> IngestResult<()> {
        let delete = DeleteStatementBuilder::default()
            .set_params(DeleteParams {
                target: self.table.destination.clone(),
                staging: self.table.staging.clone(),
                keys: self.table.update_keys.clone(),
            })
            .build()?;

        self.execute_sql(delete).await?;
        self.append().await
    }

    async fn replace(&mut self) -> IngestResult<()> {
        self.execute_sql(ddl::truncate_table(&self.table.destination))
            .await?;
        self.append().await
    }

    async fn append(&mut self) -> IngestResult<()> {
        let append = AppendStatementBuilder::default()
            .set_params(AppendParams {
                target: self.table.destination.clone(),
                staging: self.table.staging.clone(),
            })
            .build()?;

        self.execute_sql(append).await
    }

    /// Stores the highest staged value of every incremental column.
    async fn bookmark(&mut self) -> IngestResult<()> {
        for column in &self.table.incremental_columns {
            let query = ddl::max_value(&self.table.staging, &column.column);
            debug!(sql = %query, "reading new bookmark");

            let key = self.table.bookmark_key(column);
            match self.connectors.destination.query_value(&query).await? {
                Some(value) => {
                    self.connectors.bookmarks.set(&key, value.clone()).await?;
                    info!(%key, %value, "stored bookmark");
                    self.report.bookmarks.push((key, value));
                }
                None => {
                    debug!(%key, "nothing staged, keeping the previous bookmark");
                }
            }
        }

        Ok(())
    }

    async fn archive(&mut self) -> IngestResult<()> {
        let bucket = &self.pipeline.s3_bucket_name;

        if let Err(err) = self
            .connectors
            .object_store
            .archive(bucket, &self.object_key)
            .await
        {
            error!(%bucket, key = %self.object_key, error = %err, "archiving loaded files failed");
            return Err(err);
        }

        Ok(())
    }

    async fn execute_sql(&self, statement: String) -> IngestResult<()> {
        debug!(sql = %statement, "executing statement");
        self.connectors.destination.execute(&statement).await
    }
}
