//! Per-platform type rules for a Redshift destination.
//!
//! Each table is scanned in order and the first rule listing the native type wins.

use super::{Encoding, TypeRule, TypeShape};

pub(super) const POSTGRES: &[TypeRule] = &[
    TypeRule {
        native_types: &["varchar", "char", "character varying", "character"],
        shape: TypeShape::SizedText,
        encoding: Encoding::Zstd,
    },
    TypeRule {
        native_types: &["bigint", "timestamp without time zone", "integer", "smallint"],
        shape: TypeShape::Native,
        encoding: Encoding::Az64,
    },
    TypeRule {
        native_types: &[
            "boolean",
            "double precision",
            "real",
            "timestamp with time zone",
            "date",
            "time",
            "timetz",
            "time without time zone",
            "time with time zone",
        ],
        shape: TypeShape::Native,
        encoding: Encoding::Zstd,
    },
    TypeRule {
        native_types: &["numeric"],
        shape: TypeShape::SizedDecimal,
        encoding: Encoding::Az64,
    },
];

pub(super) const MYSQL: &[TypeRule] = &[
    TypeRule {
        native_types: &["varchar", "char"],
        shape: TypeShape::SizedText,
        encoding: Encoding::Zstd,
    },
    TypeRule {
        native_types: &["decimal"],
        shape: TypeShape::SizedDecimal,
        encoding: Encoding::Zstd,
    },
    TypeRule {
        native_types: &["bigint", "date", "int", "smallint"],
        shape: TypeShape::Native,
        encoding: Encoding::Az64,
    },
    TypeRule {
        native_types: &["datetime"],
        shape: TypeShape::Fixed("timestamp"),
        encoding: Encoding::Az64,
    },
    TypeRule {
        native_types: &["double"],
        shape: TypeShape::Fixed("float8"),
        encoding: Encoding::Zstd,
    },
    TypeRule {
        native_types: &["mediumint"],
        shape: TypeShape::Fixed("int"),
        encoding: Encoding::Az64,
    },
    TypeRule {
        native_types: &["tinyint"],
        shape: TypeShape::Fixed("smallint"),
        encoding: Encoding::Az64,
    },
];

pub(super) const MSSQL: &[TypeRule] = &[
    TypeRule {
        native_types: &["char", "nchar", "varchar", "nvarchar"],
        shape: TypeShape::SizedText,
        encoding: Encoding::Zstd,
    },
    TypeRule {
        native_types: &["int", "integer", "bigint", "smallint", "date"],
        shape: TypeShape::Native,
        encoding: Encoding::Az64,
    },
    TypeRule {
        native_types: &["double precision", "float", "real", "time"],
        shape: TypeShape::Native,
        encoding: Encoding::Zstd,
    },
    TypeRule {
        native_types: &["tinyint"],
        shape: TypeShape::Fixed("smallint"),
        encoding: Encoding::Az64,
    },
    TypeRule {
        native_types: &["datetime", "datetime2", "smalldatetime"],
        shape: TypeShape::Fixed("timestamp"),
        encoding: Encoding::Az64,
    },
    // `timestamp` is SQL Server's row version, not a point in time.
    TypeRule {
        native_types: &["timestamp"],
        shape: TypeShape::Fixed("varchar(100)"),
        encoding: Encoding::Zstd,
    },
    TypeRule {
        native_types: &["datetimeoffset"],
        shape: TypeShape::Fixed("timestamptz"),
        encoding: Encoding::Zstd,
    },
    TypeRule {
        native_types: &["numeric", "decimal"],
        shape: TypeShape::SizedDecimal,
        encoding: Encoding::Az64,
    },
    TypeRule {
        native_types: &["money"],
        shape: TypeShape::Fixed("decimal(15,4)"),
        encoding: Encoding::Az64,
    },
    TypeRule {
        native_types: &["smallmoney"],
        shape: TypeShape::Fixed("decimal(6,4)"),
        encoding: Encoding::Az64,
    },
];

/// Object-storage sources carry no catalog, so every column takes the fallback.
pub(super) const S3: &[TypeRule] = &[];
