use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::bail;
use crate::destination::DestinationConnector;
use crate::error::{ErrorKind, IngestResult};
use crate::ingest_error;
use crate::test_utils::{
    MemoryObjectStore, NULL_MARKER, Row, parse_qualified, unquote_identifier, unquote_literal,
};
use crate::types::{ColumnDescriptor, QualifiedTable};

/// A table held by [`MemoryWarehouse`].
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Row>,
    /// Statement the table was created with, `None` when seeded by a test.
    pub ddl: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    schemas: BTreeSet<String>,
    tables: HashMap<QualifiedTable, MemoryTable>,
    /// Every statement received through `execute` and `copy`, in order.
    statements: Vec<String>,
    /// Statement prefixes that fail when executed.
    failures: Vec<String>,
}

/// In-memory [`DestinationConnector`] interpreting the statements built by [`crate::sql`].
///
/// Only the exact statement shapes the engine produces are understood; anything else fails
/// with [`ErrorKind::DestinationQueryFailed`]. Values are compared as text.
#[derive(Debug, Clone)]
pub struct MemoryWarehouse {
    inner: Arc<Mutex<Inner>>,
    object_store: MemoryObjectStore,
}

impl MemoryWarehouse {
    /// Creates an empty warehouse loading COPY input from `object_store`.
    pub fn new(object_store: MemoryObjectStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            object_store,
        }
    }

    /// Creates `table` with `columns`, creating its schema if needed.
    pub async fn create_table(&self, table: &QualifiedTable, columns: Vec<ColumnDescriptor>) {
        let mut inner = self.inner.lock().await;
        inner.schemas.insert(table.schema.clone());
        inner.tables.insert(
            table.clone(),
            MemoryTable {
                columns,
                rows: Vec::new(),
                ddl: None,
            },
        );
    }

    /// Appends `rows` to an existing table.
    pub async fn insert_rows(&self, table: &QualifiedTable, rows: Vec<Row>) {
        let mut inner = self.inner.lock().await;
        if let Some(memory_table) = inner.tables.get_mut(table) {
            memory_table.rows.extend(rows);
        }
    }

    pub async fn rows(&self, table: &QualifiedTable) -> Vec<Row> {
        let inner = self.inner.lock().await;
        inner
            .tables
            .get(table)
            .map(|memory_table| memory_table.rows.clone())
            .unwrap_or_default()
    }

    pub async fn table(&self, table: &QualifiedTable) -> Option<MemoryTable> {
        let inner = self.inner.lock().await;
        inner.tables.get(table).cloned()
    }

    pub async fn has_schema(&self, schema: &str) -> bool {
        let inner = self.inner.lock().await;
        inner.schemas.contains(schema)
    }

    /// Returns every statement received so far.
    pub async fn statements(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.statements.clone()
    }

    /// Makes statements starting with `prefix` fail from now on.
    pub async fn fail_statements_starting_with(&self, prefix: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.failures.push(prefix.into());
    }

    /// Records `sql` and fails it when a failure was registered for it.
    fn receive(inner: &mut Inner, sql: &str, kind: ErrorKind) -> IngestResult<()> {
        inner.statements.push(sql.to_string());

        if inner.failures.iter().any(|prefix| sql.starts_with(prefix)) {
            bail!(kind, "Injected statement failure", sql);
        }

        Ok(())
    }
}

impl DestinationConnector for MemoryWarehouse {
    fn name() -> &'static str {
        "memory"
    }

    async fn column_metadata(&self, table: &QualifiedTable) -> IngestResult<Vec<ColumnDescriptor>> {
        let inner = self.inner.lock().await;

        Ok(inner
            .tables
            .get(table)
            .map(|memory_table| memory_table.columns.clone())
            .unwrap_or_default())
    }

    async fn table_exists(&self, table: &QualifiedTable) -> IngestResult<bool> {
        let inner = self.inner.lock().await;

        Ok(inner.tables.contains_key(table))
    }

    async fn execute(&self, sql: &str) -> IngestResult<()> {
        debug!(%sql, "memory warehouse executing");
        let mut inner = self.inner.lock().await;
        Self::receive(&mut inner, sql, ErrorKind::DestinationQueryFailed)?;

        apply_statement(&mut inner, sql)
    }

    async fn copy(&self, sql: &str) -> IngestResult<()> {
        debug!(%sql, "memory warehouse copying");
        {
            let mut inner = self.inner.lock().await;
            Self::receive(&mut inner, sql, ErrorKind::DestinationLoadFailed)?;
        }

        let copy = parse_copy(sql)?;
        let objects = self
            .object_store
            .objects_with_prefix(&copy.bucket, &copy.prefix)
            .await;
        if objects.is_empty() {
            bail!(
                ErrorKind::DestinationLoadFailed,
                "Copy source does not exist",
                format!("no object in `{}` starts with `{}`", copy.bucket, copy.prefix)
            );
        }

        let mut inner = self.inner.lock().await;
        let Some(memory_table) = inner.tables.get_mut(&copy.table) else {
            bail!(
                ErrorKind::DestinationLoadFailed,
                "Copy target does not exist",
                copy.table.to_string()
            );
        };

        let columns = match copy.columns {
            Some(columns) => columns,
            None => memory_table
                .columns
                .iter()
                .map(|column| column.name.clone())
                .collect(),
        };

        for (key, contents) in objects {
            let text = String::from_utf8(contents).map_err(|err| {
                ingest_error!(
                    ErrorKind::DestinationLoadFailed,
                    "Copy source is not text",
                    key.clone(),
                    source: err
                )
            })?;

            let lines = text.lines().skip(usize::from(copy.ignore_header));
            for (line_number, line) in lines.enumerate() {
                if line.is_empty() {
                    continue;
                }

                let fields: Vec<&str> = line.split(',').collect();
                if fields.len() != columns.len() {
                    bail!(
                        ErrorKind::DestinationLoadFailed,
                        "Copy input does not match the column list",
                        format!(
                            "line {} of `{key}` has {} fields, expected {}",
                            line_number + 1,
                            fields.len(),
                            columns.len()
                        )
                    );
                }

                let row: Row = columns
                    .iter()
                    .zip(fields)
                    .filter(|(_, field)| *field != NULL_MARKER)
                    .map(|(column, field)| (column.clone(), field.to_string()))
                    .collect();
                memory_table.rows.push(row);
            }
        }

        Ok(())
    }

    async fn query_value(&self, sql: &str) -> IngestResult<Option<String>> {
        debug!(%sql, "memory warehouse querying");
        let mut inner = self.inner.lock().await;
        Self::receive(&mut inner, sql, ErrorKind::DestinationQueryFailed)?;

        let parsed = sql
            .strip_prefix("SELECT MAX(")
            .and_then(|rest| rest.split_once(") FROM "))
            .and_then(|(column, table)| Some((unquote_identifier(column), parse_qualified(table)?)));
        let Some((column, table)) = parsed else {
            bail!(ErrorKind::DestinationQueryFailed, "Unsupported query", sql);
        };

        let memory_table = existing_table(&inner, &table)?;
        if !memory_table.columns.iter().any(|descriptor| descriptor.name == column) {
            bail!(
                ErrorKind::DestinationQueryFailed,
                "Column does not exist",
                format!("`{column}` is not a column of `{table}`")
            );
        }

        Ok(memory_table
            .rows
            .iter()
            .filter_map(|row| row.get(&column))
            .max()
            .cloned())
    }
}

struct CopyStatement {
    table: QualifiedTable,
    columns: Option<Vec<String>>,
    bucket: String,
    prefix: String,
    ignore_header: bool,
}

fn parse_copy(sql: &str) -> IngestResult<CopyStatement> {
    let unsupported = || ingest_error!(ErrorKind::DestinationLoadFailed, "Unsupported copy", sql);

    let (target, rest) = sql
        .strip_prefix("COPY ")
        .and_then(|rest| rest.split_once(" FROM '"))
        .ok_or_else(unsupported)?;

    let (table, columns) = match target.split_once(" (") {
        Some((table, columns)) => {
            let columns = columns
                .strip_suffix(')')
                .ok_or_else(unsupported)?
                .split(", ")
                .map(unquote_identifier)
                .collect();
            (table, Some(columns))
        }
        None => (target, None),
    };
    let table = parse_qualified(table).ok_or_else(unsupported)?;

    let (path, options) = rest.split_once('\'').ok_or_else(unsupported)?;
    let (bucket, prefix) = path
        .strip_prefix("s3://")
        .and_then(|path| path.split_once('/'))
        .ok_or_else(unsupported)?;

    Ok(CopyStatement {
        table,
        columns,
        bucket: bucket.to_string(),
        prefix: prefix.to_string(),
        ignore_header: options.contains("IGNOREHEADER"),
    })
}

fn existing_table<'a>(inner: &'a Inner, table: &QualifiedTable) -> IngestResult<&'a MemoryTable> {
    inner.tables.get(table).ok_or_else(|| {
        ingest_error!(
            ErrorKind::DestinationQueryFailed,
            "Relation does not exist",
            table.to_string()
        )
    })
}

fn existing_table_mut<'a>(
    inner: &'a mut Inner,
    table: &QualifiedTable,
) -> IngestResult<&'a mut MemoryTable> {
    inner.tables.get_mut(table).ok_or_else(|| {
        ingest_error!(
            ErrorKind::DestinationQueryFailed,
            "Relation does not exist",
            table.to_string()
        )
    })
}

/// Parses a column definition fragment such as `email varchar(256) encode zstd SORTKEY`.
fn parse_definition(definition: &str, ordinal_position: u32) -> Option<ColumnDescriptor> {
    let (name, rest) = definition.trim().split_once(' ')?;
    let data_type = match rest.split_once(" encode ") {
        Some((data_type, _)) => data_type,
        None => rest,
    };

    Some(ColumnDescriptor::new(
        unquote_identifier(name),
        data_type.trim(),
        ordinal_position,
    ))
}

fn apply_statement(inner: &mut Inner, sql: &str) -> IngestResult<()> {
    let unsupported = || ingest_error!(ErrorKind::DestinationQueryFailed, "Unsupported statement", sql);
    let table_of = |text: &str| parse_qualified(text).ok_or_else(unsupported);

    if let Some(schema) = sql.strip_prefix("CREATE SCHEMA IF NOT EXISTS ") {
        inner.schemas.insert(unquote_identifier(schema));
        return Ok(());
    }

    if let Some(rest) = sql.strip_prefix("CREATE TABLE IF NOT EXISTS ") {
        let (table, definitions) = rest
            .split_once(" (")
            .and_then(|(table, rest)| Some((table, rest.strip_suffix(") DISTSTYLE EVEN")?)))
            .ok_or_else(unsupported)?;
        let table = table_of(table)?;

        if !inner.schemas.contains(&table.schema) {
            bail!(
                ErrorKind::DestinationQueryFailed,
                "Schema does not exist",
                table.schema.clone()
            );
        }
        if inner.tables.contains_key(&table) {
            return Ok(());
        }

        let mut columns = Vec::new();
        for definition in definitions.split(", ") {
            let ordinal = columns.len() as u32 + 1;
            columns.push(parse_definition(definition, ordinal).ok_or_else(unsupported)?);
        }

        inner.tables.insert(
            table,
            MemoryTable {
                columns,
                rows: Vec::new(),
                ddl: Some(sql.to_string()),
            },
        );
        return Ok(());
    }

    if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
        let (table, like) = rest
            .split_once(" (LIKE ")
            .and_then(|(table, like)| Some((table, like.strip_suffix(')')?)))
            .ok_or_else(unsupported)?;
        let (table, like) = (table_of(table)?, table_of(like)?);

        if inner.tables.contains_key(&table) {
            bail!(
                ErrorKind::DestinationQueryFailed,
                "Relation already exists",
                table.to_string()
            );
        }
        let columns = existing_table(inner, &like)?.columns.clone();
        inner.schemas.insert(table.schema.clone());
        inner.tables.insert(
            table,
            MemoryTable {
                columns,
                rows: Vec::new(),
                ddl: Some(sql.to_string()),
            },
        );
        return Ok(());
    }

    if let Some(rest) = sql.strip_prefix("ALTER TABLE ") {
        let (table, definition) = rest.split_once(" ADD COLUMN ").ok_or_else(unsupported)?;
        let memory_table = existing_table_mut(inner, &table_of(table)?)?;
        let ordinal = memory_table.columns.len() as u32 + 1;
        let column = parse_definition(definition, ordinal).ok_or_else(unsupported)?;
        memory_table.columns.push(column);
        return Ok(());
    }

    if let Some(table) = sql.strip_prefix("TRUNCATE TABLE ") {
        existing_table_mut(inner, &table_of(table)?)?.rows.clear();
        return Ok(());
    }

    if let Some(rest) = sql.strip_prefix("UPDATE ") {
        let (table, assignment) = rest.split_once(" SET ").ok_or_else(unsupported)?;
        let (column, value) = assignment.split_once(" = ").ok_or_else(unsupported)?;
        let (column, value) = (
            unquote_identifier(column),
            unquote_literal(value).ok_or_else(unsupported)?,
        );

        for row in &mut existing_table_mut(inner, &table_of(table)?)?.rows {
            row.insert(column.clone(), value.clone());
        }
        return Ok(());
    }

    if let Some(rest) = sql.strip_prefix("DELETE FROM ") {
        let (target, rest) = rest.split_once(" USING ").ok_or_else(unsupported)?;
        let (staging, conditions) = rest.split_once(" WHERE ").ok_or_else(unsupported)?;
        let (target, staging) = (table_of(target)?, table_of(staging)?);

        let mut keys = Vec::new();
        for condition in conditions.split(" AND ") {
            let (left, _) = condition.split_once(" = ").ok_or_else(unsupported)?;
            let key = left.rsplit('.').next().ok_or_else(unsupported)?;
            keys.push(unquote_identifier(key));
        }

        let staged: Vec<Vec<Option<String>>> = existing_table(inner, &staging)?
            .rows
            .iter()
            .map(|row| keys.iter().map(|key| row.get(key).cloned()).collect())
            .collect();

        existing_table_mut(inner, &target)?.rows.retain(|row| {
            let values: Vec<Option<String>> =
                keys.iter().map(|key| row.get(key).cloned()).collect();
            !staged.contains(&values)
        });
        return Ok(());
    }

    if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
        let (target, staging) = rest
            .split_once(" SELECT * FROM ")
            .ok_or_else(unsupported)?;
        let (target, staging) = (table_of(target)?, table_of(staging)?);

        let rows = existing_table(inner, &staging)?.rows.clone();
        let target = existing_table_mut(inner, &target)?;
        let columns: Vec<String> = target.columns.iter().map(|column| column.name.clone()).collect();
        target.rows.extend(rows.into_iter().map(|row| {
            row.into_iter()
                .filter(|(column, _)| columns.contains(column))
                .collect::<Row>()
        }));
        return Ok(());
    }

    Err(unsupported())
}
