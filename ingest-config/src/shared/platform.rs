use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform the rows are read from.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourcePlatform {
    /// A Postgres database.
    #[default]
    #[serde(alias = "Postgres", alias = "POSTGRES")]
    Postgres,
    /// A MySQL database.
    #[serde(alias = "MySQL", alias = "Mysql", alias = "MYSQL")]
    Mysql,
    /// A SQL Server database.
    #[serde(alias = "MSSQL", alias = "Mssql")]
    Mssql,
    /// Files already staged in object storage.
    #[serde(alias = "S3")]
    S3,
}

impl SourcePlatform {
    /// Returns `true` when the source is a database that can be introspected and queried.
    pub fn is_database(&self) -> bool {
        !matches!(self, SourcePlatform::S3)
    }

    /// Returns the character used to quote identifiers in queries against this source.
    pub fn identifier_quote(&self) -> char {
        match self {
            SourcePlatform::Mysql => '`',
            _ => '"',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourcePlatform::Postgres => "postgres",
            SourcePlatform::Mysql => "mysql",
            SourcePlatform::Mssql => "mssql",
            SourcePlatform::S3 => "s3",
        }
    }
}

impl fmt::Display for SourcePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Warehouse platform the rows are loaded into.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DestinationPlatform {
    /// Amazon Redshift, the default warehouse.
    #[default]
    #[serde(alias = "Redshift")]
    Redshift,
}

impl fmt::Display for DestinationPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationPlatform::Redshift => f.write_str("redshift"),
        }
    }
}

/// How staged rows are applied to the destination table.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMethod {
    /// Replace the whole destination table with the staged rows.
    FullLoad,
    /// Delete destination rows whose keys are staged, then append the staged rows.
    Merge,
    /// Append rows newer than the stored bookmark.
    IncrementalLoad,
    /// Append every staged row.
    Append,
}

impl fmt::Display for UpdateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateMethod::FullLoad => "full_load",
            UpdateMethod::Merge => "merge",
            UpdateMethod::IncrementalLoad => "incremental_load",
            UpdateMethod::Append => "append",
        };

        f.write_str(name)
    }
}
