use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required pipeline-level field is empty.
    #[error("`{0}` must not be empty")]
    EmptyField(&'static str),
    /// A database source needs a schema to read tables from.
    #[error("`source_schema` is required when `source_platform` is `{0}`")]
    MissingSourceSchema(String),
    /// The declaration does not list any table.
    #[error("no tables are declared")]
    NoTables,
    /// The same source table is declared more than once.
    #[error("table `{0}` is declared more than once")]
    DuplicateTable(String),
}
