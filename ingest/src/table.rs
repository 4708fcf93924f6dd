//! Resolution of table declarations into immutable per-run table configurations.

use std::collections::BTreeMap;

use ingest_config::shared::{PipelineConfig, SourcePlatform, TableDeclaration, UpdateMethod};
use tracing::debug;

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::source::SourceConnector;
use crate::store::bookmark::bookmark_key;
use crate::types::{ColumnDescriptor, QualifiedTable};

/// Placeholder replaced by the incremental column name.
pub const LOAD_COLUMN_PLACEHOLDER: &str = "{load_column}";

/// Placeholder replaced by the bookmark value.
pub const PARAM_VALUE_PLACEHOLDER: &str = "{param_value}";

/// Predicate template used when a column declares none.
pub const DEFAULT_LOAD_EXPRESSION: &str = "{load_column} > '{param_value}'";

/// A column whose bookmark bounds the rows extracted on each run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementalColumn {
    pub column: String,
    /// Predicate template with `{load_column}` and `{param_value}` placeholders.
    pub expression: String,
    /// Threshold used when no bookmark is stored yet.
    pub initial_value: String,
}

impl IncrementalColumn {
    /// Renders the predicate for the given bookmark value.
    ///
    /// Single quotes in the value are doubled so it stays inside the literal of the template.
    pub fn render(&self, param_value: &str) -> String {
        self.expression
            .replace(LOAD_COLUMN_PLACEHOLDER, &self.column)
            .replace(PARAM_VALUE_PLACEHOLDER, &param_value.replace('\'', "''"))
    }
}

/// Column metadata and primary keys of a source table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceCatalog {
    pub columns: Vec<ColumnDescriptor>,
    pub primary_keys: Vec<String>,
}

impl SourceCatalog {
    /// Reads the catalog of `table` from `source`.
    pub async fn fetch<S>(source: &S, table: &QualifiedTable) -> IngestResult<Self>
    where
        S: SourceConnector,
    {
        let columns = source.column_metadata(table, None).await?;
        let primary_keys = source.primary_keys(table).await?;

        debug!(
            %table,
            columns = columns.len(),
            primary_keys = primary_keys.len(),
            "read source catalog"
        );

        Ok(Self {
            columns,
            primary_keys,
        })
    }

    /// Returns the column names in ordinal order.
    pub fn column_names(&self) -> Vec<String> {
        let mut columns: Vec<&ColumnDescriptor> = self.columns.iter().collect();
        columns.sort_by_key(|column| column.ordinal_position);
        columns.into_iter().map(|column| column.name.clone()).collect()
    }
}

/// Fully resolved configuration of one table for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    /// Name the table is declared under.
    pub source_table: String,
    pub source_platform: SourcePlatform,
    /// Table rows are extracted from, `None` for object-storage sources.
    pub source: Option<QualifiedTable>,
    pub destination: QualifiedTable,
    pub staging: QualifiedTable,
    pub update_method: UpdateMethod,
    pub column_inclusions: Vec<String>,
    pub update_keys: Vec<String>,
    pub column_transformations: BTreeMap<String, String>,
    pub sort_key: Option<String>,
    pub include_load_dts: bool,
    /// Whether the staging COPY names its target columns.
    pub specify_copy_columns: bool,
    /// Object key of the artifact, or the key prefix of the files to claim for object-storage
    /// sources.
    pub s3_object: String,
    /// File name of the local export artifact.
    pub filename: String,
    /// Pipeline COPY options followed by the table ones.
    pub copy_options: String,
    pub bookmark_key_prefix: String,
    pub incremental_columns: Vec<IncrementalColumn>,
}

impl TableConfig {
    /// Resolves `declaration` against the pipeline settings.
    ///
    /// `catalog` is consulted for database sources only, to infer column inclusions and update
    /// keys that were not declared. Every invariant is checked here so that a resolved
    /// configuration can be run without further validation.
    pub fn resolve(
        source_table: &str,
        declaration: &TableDeclaration,
        pipeline: &PipelineConfig,
        catalog: Option<&SourceCatalog>,
    ) -> IngestResult<Self> {
        Self::try_resolve(source_table, declaration, pipeline, catalog)
            .map_err(|err| err.with_table(source_table))
    }

    fn try_resolve(
        source_table: &str,
        declaration: &TableDeclaration,
        pipeline: &PipelineConfig,
        catalog: Option<&SourceCatalog>,
    ) -> IngestResult<Self> {
        if source_table.trim().is_empty() {
            bail!(ErrorKind::ConfigError, "Table name is empty");
        }

        let platform = pipeline.source_platform;
        let is_database = platform.is_database();
        let catalog = catalog.filter(|_| is_database);

        let destination_table = non_empty(declaration.destination_table.as_deref())
            .unwrap_or(source_table)
            .to_string();
        let staging_table = non_empty(declaration.staging_table.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_{destination_table}", pipeline.destination_schema));

        let declared_inclusions = declaration
            .column_inclusions
            .as_ref()
            .filter(|columns| !columns.is_empty());
        let column_inclusions = match (declared_inclusions, catalog) {
            (Some(columns), _) => columns.clone(),
            (None, Some(catalog)) => catalog.column_names(),
            (None, None) => Vec::new(),
        };

        if is_database && column_inclusions.is_empty() {
            bail!(
                ErrorKind::ConfigError,
                "Source columns are unknown",
                format!(
                    "`{source_table}` declares no `column_inclusions` and the source catalog \
                     returned no columns"
                )
            );
        }

        let declared_keys = declaration
            .update_keys
            .as_ref()
            .filter(|keys| !keys.is_empty());
        let update_keys = match (declared_keys, catalog) {
            (Some(keys), _) => keys.clone(),
            (None, Some(catalog)) => catalog.primary_keys.clone(),
            (None, None) => Vec::new(),
        };

        if declaration.update_method == UpdateMethod::Merge && update_keys.is_empty() {
            bail!(
                ErrorKind::ConfigError,
                "Merge requires update keys",
                format!("`{source_table}` declares no update keys and has no primary key")
            );
        }

        let sort_key = non_empty(declaration.sort_key.as_deref())
            .map(str::to_string)
            .or_else(|| update_keys.first().cloned());

        let specify_copy_columns = declared_inclusions.is_some() || declaration.include_load_dts;
        if specify_copy_columns && column_inclusions.is_empty() {
            bail!(
                ErrorKind::ConfigError,
                "Copy columns cannot be enumerated",
                format!(
                    "`{source_table}` adds the tracking column but its columns are unknown, \
                     declare `column_inclusions`"
                )
            );
        }

        let s3_object = match non_empty(declaration.s3_object.as_deref()) {
            Some(object) => object.to_string(),
            None if is_database => format!("{}/{source_table}.csv.gz", pipeline.dag_name),
            None => bail!(
                ErrorKind::ConfigError,
                "Object key is required",
                format!("`{source_table}` is read from object storage but declares no `s3_object`")
            ),
        };

        let incremental_columns = resolve_incremental_columns(source_table, declaration, pipeline)?;
        let not_extracted = incremental_columns.iter().find(|column| {
            !column_inclusions.is_empty() && !column_inclusions.contains(&column.column)
        });
        if let Some(missing) = not_extracted {
            bail!(
                ErrorKind::ConfigError,
                "Incremental column is not extracted",
                format!(
                    "`{source_table}.{}` is not among the extracted columns {column_inclusions:?}",
                    missing.column
                )
            );
        }

        let copy_options = match non_empty(declaration.table_copy_params.as_deref()) {
            Some(params) => format!("{} {params}", pipeline.copy_extra_params.trim()),
            None => pipeline.copy_extra_params.trim().to_string(),
        };

        Ok(Self {
            source_table: source_table.to_string(),
            source_platform: platform,
            source: is_database
                .then(|| QualifiedTable::new(pipeline.source_schema(), source_table)),
            destination: QualifiedTable::new(&pipeline.destination_schema, destination_table),
            staging: QualifiedTable::new(&pipeline.staging_schema, staging_table),
            update_method: declaration.update_method,
            column_inclusions,
            update_keys,
            column_transformations: declaration.transformations(),
            sort_key,
            include_load_dts: declaration.include_load_dts,
            specify_copy_columns,
            s3_object,
            filename: format!("{source_table}.csv.gz"),
            copy_options,
            bookmark_key_prefix: format!("{}/{source_table}", pipeline.dag_name),
            incremental_columns,
        })
    }

    /// Returns whether the run reads and stores bookmarks.
    pub fn is_incremental(&self) -> bool {
        self.update_method == UpdateMethod::IncrementalLoad
    }

    /// Returns the bookmark key of an incremental column.
    pub fn bookmark_key(&self, column: &IncrementalColumn) -> String {
        bookmark_key(&self.bookmark_key_prefix, &column.column)
    }

    /// Returns the columns named in the staging COPY, if any.
    pub fn copy_columns(&self) -> Option<Vec<String>> {
        self.specify_copy_columns
            .then(|| self.column_inclusions.clone())
    }
}

fn resolve_incremental_columns(
    source_table: &str,
    declaration: &TableDeclaration,
    pipeline: &PipelineConfig,
) -> IngestResult<Vec<IncrementalColumn>> {
    let mut columns = Vec::new();

    for (column, settings) in declaration.incremental_columns() {
        let expression = settings
            .load_expression
            .unwrap_or_else(|| DEFAULT_LOAD_EXPRESSION.to_string());

        if expression.trim().is_empty() {
            bail!(
                ErrorKind::ConfigError,
                "Incremental expression is empty",
                format!("`{source_table}.{column}` declares an empty `load_expression`")
            );
        }

        if !expression.contains(PARAM_VALUE_PLACEHOLDER) {
            bail!(
                ErrorKind::ConfigError,
                "Incremental expression does not use the bookmark",
                format!(
                    "`{source_table}.{column}` expression `{expression}` does not reference \
                     `{PARAM_VALUE_PLACEHOLDER}`"
                )
            );
        }

        columns.push(IncrementalColumn {
            column: column.to_string(),
            expression,
            initial_value: settings
                .initial_value
                .unwrap_or_else(|| pipeline.default_bookmark.clone()),
        });
    }

    if declaration.update_method == UpdateMethod::IncrementalLoad && columns.is_empty() {
        bail!(
            ErrorKind::ConfigError,
            "Incremental load requires incremental columns",
            format!("`{source_table}` declares no `incremental_load_columns`")
        );
    }

    Ok(columns)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}
