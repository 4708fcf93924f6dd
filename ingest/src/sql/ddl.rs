//! Fixed warehouse statements.

use pg_escape::{quote_identifier, quote_literal};

use crate::sql::TRACKING_COLUMN;
use crate::types::QualifiedTable;

/// Column type and encoding of the tracking column.
pub const TRACKING_COLUMN_DEFINITION: &str = "timestamp encode zstd";

pub fn truncate_table(table: &QualifiedTable) -> String {
    format!("TRUNCATE TABLE {table}")
}

pub fn create_schema(schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", quote_identifier(schema))
}

/// Returns the create statement for `table` with evenly distributed rows.
///
/// `column_definitions` are complete fragments as produced by the type mapper.
pub fn create_table(table: &QualifiedTable, column_definitions: &[String]) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} ({}) DISTSTYLE EVEN",
        column_definitions.join(", ")
    )
}

pub fn create_table_like(table: &QualifiedTable, like: &QualifiedTable) -> String {
    format!("CREATE TABLE {table} (LIKE {like})")
}

/// Returns the column definition fragment of the tracking column.
pub fn tracking_column_definition() -> String {
    format!("{TRACKING_COLUMN} {TRACKING_COLUMN_DEFINITION}")
}

pub fn add_tracking_column(table: &QualifiedTable) -> String {
    format!(
        "ALTER TABLE {table} ADD COLUMN {}",
        tracking_column_definition()
    )
}

/// Stamps every row of `table` with `load_time`.
pub fn update_tracking_column(table: &QualifiedTable, load_time: &str) -> String {
    format!(
        "UPDATE {table} SET {TRACKING_COLUMN} = {}",
        quote_literal(load_time)
    )
}

pub fn max_value(table: &QualifiedTable, column: &str) -> String {
    format!("SELECT MAX({}) FROM {table}", quote_identifier(column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_statements() {
        let staging = QualifiedTable::new("staging", "crm_customer");
        let destination = QualifiedTable::new("crm", "customer");

        assert_eq!(truncate_table(&staging), "TRUNCATE TABLE staging.crm_customer");
        assert_eq!(create_schema("crm"), "CREATE SCHEMA IF NOT EXISTS crm");
        assert_eq!(
            create_table_like(&staging, &destination),
            "CREATE TABLE staging.crm_customer (LIKE crm.customer)"
        );
        assert_eq!(
            add_tracking_column(&destination),
            "ALTER TABLE crm.customer ADD COLUMN load_dts timestamp encode zstd"
        );
        assert_eq!(
            update_tracking_column(&staging, "2024-05-01 10:00:00"),
            "UPDATE staging.crm_customer SET load_dts = '2024-05-01 10:00:00'"
        );
        assert_eq!(
            max_value(&staging, "updated_at"),
            "SELECT MAX(updated_at) FROM staging.crm_customer"
        );
    }

    #[test]
    fn create_table_lists_definitions_in_order() {
        let table = QualifiedTable::new("crm", "customer");
        let definitions = vec![
            "id integer encode az64 SORTKEY".to_string(),
            "email varchar(256) encode zstd".to_string(),
            tracking_column_definition(),
        ];

        assert_eq!(
            create_table(&table, &definitions),
            "CREATE TABLE IF NOT EXISTS crm.customer (id integer encode az64 SORTKEY, \
             email varchar(256) encode zstd, load_dts timestamp encode zstd) DISTSTYLE EVEN"
        );
    }
}
