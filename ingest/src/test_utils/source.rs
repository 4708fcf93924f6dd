use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::ingest_error;
use crate::source::SourceConnector;
use crate::test_utils::{NULL_MARKER, Row, parse_qualified, unquote_identifier, unquote_literal};
use crate::types::{ColumnDescriptor, QualifiedTable};

#[derive(Debug, Clone, Default)]
struct SourceTable {
    columns: Vec<ColumnDescriptor>,
    primary_keys: Vec<String>,
    rows: Vec<Row>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<QualifiedTable, SourceTable>,
    exported_queries: Vec<String>,
    executed: Vec<String>,
}

/// In-memory [`SourceConnector`].
///
/// Exports understand the queries built by [`crate::sql::SelectStatementBuilder`]: selected items
/// are quoted columns or `expression AS alias` (the alias column is exported untransformed), and
/// predicates are `column <op> 'literal'` comparisons on text joined with `AND`.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table with its catalog and rows.
    pub async fn add_table(
        &self,
        table: &QualifiedTable,
        columns: Vec<ColumnDescriptor>,
        primary_keys: &[&str],
        rows: Vec<Row>,
    ) {
        let mut inner = self.inner.lock().await;
        inner.tables.insert(
            table.clone(),
            SourceTable {
                columns,
                primary_keys: primary_keys.iter().map(|key| key.to_string()).collect(),
                rows,
            },
        );
    }

    /// Appends rows to a registered table.
    pub async fn insert_rows(&self, table: &QualifiedTable, rows: Vec<Row>) {
        let mut inner = self.inner.lock().await;
        if let Some(source_table) = inner.tables.get_mut(table) {
            source_table.rows.extend(rows);
        }
    }

    /// Returns every export query received, in order.
    pub async fn exported_queries(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.exported_queries.clone()
    }
}

impl SourceConnector for MemorySource {
    async fn column_metadata(
        &self,
        table: &QualifiedTable,
        filter: Option<&[String]>,
    ) -> IngestResult<Vec<ColumnDescriptor>> {
        let inner = self.inner.lock().await;

        let Some(source_table) = inner.tables.get(table) else {
            return Ok(Vec::new());
        };

        let mut columns: Vec<ColumnDescriptor> = source_table
            .columns
            .iter()
            .filter(|column| filter.is_none_or(|filter| filter.contains(&column.name)))
            .cloned()
            .collect();
        columns.sort_by_key(|column| column.ordinal_position);

        Ok(columns)
    }

    async fn primary_keys(&self, table: &QualifiedTable) -> IngestResult<Vec<String>> {
        let inner = self.inner.lock().await;

        Ok(inner
            .tables
            .get(table)
            .map(|source_table| source_table.primary_keys.clone())
            .unwrap_or_default())
    }

    async fn export(&self, query: &str, path: &Path, delimiter: char) -> IngestResult<u64> {
        let (columns, rows) = {
            let mut inner = self.inner.lock().await;
            inner.exported_queries.push(query.to_string());

            let select = parse_select(query)?;
            let Some(source_table) = inner.tables.get(&select.table) else {
                bail!(
                    ErrorKind::SourceQueryFailed,
                    "Relation does not exist",
                    select.table.to_string()
                );
            };

            let mut rows = Vec::new();
            for row in &source_table.rows {
                if matches_all(row, &select.predicates)? {
                    rows.push(row.clone());
                }
            }

            (select.columns, rows)
        };

        let delimiter = delimiter.to_string();
        let mut contents = columns.join(&delimiter);
        contents.push('\n');
        for row in &rows {
            let values: Vec<&str> = columns
                .iter()
                .map(|column| row.get(column).map(String::as_str).unwrap_or(NULL_MARKER))
                .collect();
            contents.push_str(&values.join(&delimiter));
            contents.push('\n');
        }

        tokio::fs::write(path, contents).await.map_err(|err| {
            ingest_error!(
                ErrorKind::SourceExportFailed,
                "Export artifact could not be written",
                path.display(),
                source: err
            )
        })?;

        debug!(rows = rows.len(), path = %path.display(), "memory source exported rows");

        Ok(rows.len() as u64)
    }

    async fn table_exists(&self, table: &QualifiedTable) -> IngestResult<bool> {
        let inner = self.inner.lock().await;

        Ok(inner.tables.contains_key(table))
    }

    async fn execute(&self, sql: &str) -> IngestResult<()> {
        let mut inner = self.inner.lock().await;
        inner.executed.push(sql.to_string());

        Ok(())
    }
}

struct Predicate {
    column: String,
    operator: Ordering,
    inclusive: bool,
    value: String,
}

struct SelectStatement {
    table: QualifiedTable,
    columns: Vec<String>,
    predicates: Vec<Predicate>,
}

fn parse_select(query: &str) -> IngestResult<SelectStatement> {
    let unsupported = || ingest_error!(ErrorKind::SourceQueryFailed, "Unsupported query", query);

    let (items, rest) = query
        .strip_prefix("SELECT ")
        .and_then(|rest| rest.split_once(" FROM "))
        .ok_or_else(unsupported)?;
    let (table, predicates) = match rest.split_once(" WHERE ") {
        Some((table, predicates)) => (table, Some(predicates)),
        None => (rest, None),
    };

    let columns = items
        .split(", ")
        .map(|item| match item.rsplit_once(" AS ") {
            Some((_, alias)) => unquote_identifier(alias),
            None => unquote_identifier(item),
        })
        .collect();

    let predicates = match predicates {
        Some(predicates) => predicates
            .split(" AND ")
            .map(|predicate| parse_predicate(predicate).ok_or_else(unsupported))
            .collect::<IngestResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(SelectStatement {
        table: parse_qualified(table).ok_or_else(unsupported)?,
        columns,
        predicates,
    })
}

fn parse_predicate(predicate: &str) -> Option<Predicate> {
    const OPERATORS: [(&str, Ordering, bool); 5] = [
        (" >= ", Ordering::Greater, true),
        (" <= ", Ordering::Less, true),
        (" > ", Ordering::Greater, false),
        (" < ", Ordering::Less, false),
        (" = ", Ordering::Equal, true),
    ];

    OPERATORS.iter().find_map(|(token, operator, inclusive)| {
        let (column, value) = predicate.split_once(token)?;
        Some(Predicate {
            column: unquote_identifier(column),
            operator: *operator,
            inclusive: *inclusive,
            value: unquote_literal(value)?,
        })
    })
}

fn matches_all(row: &Row, predicates: &[Predicate]) -> IngestResult<bool> {
    for predicate in predicates {
        let Some(value) = row.get(&predicate.column) else {
            return Ok(false);
        };

        let ordering = value.as_str().cmp(predicate.value.as_str());
        let matches = ordering == predicate.operator
            || (predicate.inclusive && ordering == Ordering::Equal);
        if !matches {
            return Ok(false);
        }
    }

    Ok(true)
}
