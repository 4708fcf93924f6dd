//! Translation of source column metadata into warehouse column definitions.
//!
//! The mapping is data-driven: every [`SourcePlatform`] owns a table of [`TypeRule`]s in
//! [`rules`]. Supporting a new platform means adding a table, not new branching code.

mod rules;

use ingest_config::shared::SourcePlatform;
use pg_escape::quote_identifier;

use crate::types::ColumnDescriptor;

/// Destination type used for native types no rule knows about.
pub const FALLBACK_TYPE: &str = "varchar(max)";

/// Column compression encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// General-purpose compression, also used for text and the fallback type.
    Zstd,
    /// Delta-style compression for numeric and temporal values.
    Az64,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Zstd => "zstd",
            Encoding::Az64 => "az64",
        }
    }
}

/// How the destination type is derived from the native one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeShape {
    /// The native type name is valid on the destination as is.
    Native,
    /// The native type is replaced by a fixed destination type.
    Fixed(&'static str),
    /// The native type name sized with the declared character length.
    SizedText,
    /// The native type name sized with the declared precision and scale.
    SizedDecimal,
}

/// Maps a set of native types to a destination type shape and encoding.
#[derive(Debug)]
struct TypeRule {
    native_types: &'static [&'static str],
    shape: TypeShape,
    encoding: Encoding,
}

/// Destination type and encoding chosen for a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    pub data_type: String,
    pub encoding: Encoding,
}

impl MappedType {
    fn fallback() -> Self {
        Self {
            data_type: FALLBACK_TYPE.to_string(),
            encoding: Encoding::Zstd,
        }
    }
}

fn rules_for(platform: SourcePlatform) -> &'static [TypeRule] {
    match platform {
        SourcePlatform::Postgres => rules::POSTGRES,
        SourcePlatform::Mysql => rules::MYSQL,
        SourcePlatform::Mssql => rules::MSSQL,
        SourcePlatform::S3 => rules::S3,
    }
}

/// Returns the destination type and encoding for `column` read from `platform`.
///
/// Never fails: unknown native types, and sized types whose size was not reported, map to
/// [`FALLBACK_TYPE`] with [`Encoding::Zstd`].
pub fn map_type(platform: SourcePlatform, column: &ColumnDescriptor) -> MappedType {
    let native = column.data_type.trim().to_lowercase();

    let Some(rule) = rules_for(platform)
        .iter()
        .find(|rule| rule.native_types.contains(&native.as_str()))
    else {
        return MappedType::fallback();
    };

    let data_type = match rule.shape {
        TypeShape::Native => native,
        TypeShape::Fixed(data_type) => data_type.to_string(),
        TypeShape::SizedText => match column.character_maximum_length {
            Some(length) => format!("{native}({length})"),
            None => return MappedType::fallback(),
        },
        TypeShape::SizedDecimal => match (column.numeric_precision, column.numeric_scale) {
            (Some(precision), scale) => format!("{native}({precision},{})", scale.unwrap_or(0)),
            (None, _) => return MappedType::fallback(),
        },
    };

    MappedType {
        data_type,
        encoding: rule.encoding,
    }
}

/// Returns the column definition fragment for `column`, e.g. `email varchar(256) encode zstd`.
pub fn map_column(platform: SourcePlatform, column: &ColumnDescriptor) -> String {
    let mapped = map_type(platform, column);

    format!(
        "{} {} encode {}",
        quote_identifier(&column.name),
        mapped.data_type,
        mapped.encoding.as_str()
    )
}
