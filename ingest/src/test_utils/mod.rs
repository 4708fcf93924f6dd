//! In-memory connectors and helpers for exercising table runs without external systems.
//!
//! The fakes share one data model: a row is a map of column name to text value and a missing
//! entry is `NULL`. [`MemorySource`] writes delimited artifacts to the local file system,
//! [`MemoryObjectStore`] keeps uploaded bytes in memory, and [`MemoryWarehouse`] interprets the
//! statements built by [`crate::sql`], reading COPY input from the object store it was created
//! with.
//!
//! ```rust,no_run
//! use ingest::test_utils::{MemoryObjectStore, MemorySource, MemoryWarehouse};
//!
//! let object_store = MemoryObjectStore::new();
//! let warehouse = MemoryWarehouse::new(object_store.clone());
//! let source = MemorySource::new();
//! ```

pub mod config;
mod object_store;
mod secrets;
mod source;
mod warehouse;

use std::collections::BTreeMap;
use std::path::PathBuf;

use uuid::Uuid;

pub use object_store::MemoryObjectStore;
pub use secrets::MemorySecretProvider;
pub use source::MemorySource;
pub use warehouse::{MemoryTable, MemoryWarehouse};

/// A table row keyed by column name. Absent columns are `NULL`.
pub type Row = BTreeMap<String, String>;

/// Text written for `NULL` values in export artifacts.
pub const NULL_MARKER: &str = "NULL";

/// Builds a [`Row`] from `(column, value)` pairs.
pub fn row(values: &[(&str, &str)]) -> Row {
    values
        .iter()
        .map(|(column, value)| (column.to_string(), value.to_string()))
        .collect()
}

/// Creates an empty, uniquely named directory for export artifacts.
pub fn work_dir() -> PathBuf {
    let path = std::env::temp_dir().join(format!("ingest-test-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&path).expect("failed to create the test work directory");
    path
}

/// Strips one level of double quotes or backticks around an identifier.
fn unquote_identifier(identifier: &str) -> String {
    let identifier = identifier.trim();
    for quote in ['"', '`'] {
        if let Some(inner) = identifier
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            let doubled = format!("{quote}{quote}");
            return inner.replace(&doubled, &quote.to_string());
        }
    }
    identifier.to_string()
}

/// Strips the quotes of a SQL string literal.
fn unquote_literal(literal: &str) -> Option<String> {
    let literal = literal.trim();
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}

/// Parses `schema.table` as rendered by [`crate::types::QualifiedTable`].
fn parse_qualified(text: &str) -> Option<crate::types::QualifiedTable> {
    let (schema, table) = text.trim().split_once('.')?;
    Some(crate::types::QualifiedTable::new(
        unquote_identifier(schema),
        unquote_identifier(table),
    ))
}
