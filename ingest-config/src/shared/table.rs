use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::shared::UpdateMethod;

/// Per-column settings of an incremental extraction.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncrementalColumnDeclaration {
    /// Predicate template with `{load_column}` and `{param_value}` placeholders.
    #[serde(default)]
    pub load_expression: Option<String>,
    /// Threshold used before the first bookmark is stored.
    #[serde(default)]
    pub initial_value: Option<String>,
}

/// Raw declaration of one table, as written under the `tables` key.
///
/// Every optional field is resolved against the pipeline settings and, for database sources,
/// against live source metadata.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableDeclaration {
    pub update_method: UpdateMethod,
    #[serde(default)]
    pub destination_table: Option<String>,
    #[serde(default)]
    pub staging_table: Option<String>,
    /// Object key of the export artifact inside the pipeline bucket.
    #[serde(default)]
    pub s3_object: Option<String>,
    /// Extra COPY options appended after the pipeline-level ones.
    #[serde(default)]
    pub table_copy_params: Option<String>,
    #[serde(default)]
    pub column_inclusions: Option<Vec<String>>,
    #[serde(default)]
    pub update_keys: Option<Vec<String>>,
    /// Single-key maps of column name to the SQL expression selected in its place.
    #[serde(default)]
    pub column_transformations: Vec<BTreeMap<String, String>>,
    #[serde(default)]
    pub sort_key: Option<String>,
    /// Whether the `load_dts` tracking column must exist and be stamped on load.
    #[serde(default)]
    pub include_load_dts: bool,
    /// Single-key maps of column name to its incremental settings.
    #[serde(default)]
    pub incremental_load_columns: Vec<BTreeMap<String, Option<IncrementalColumnDeclaration>>>,
}

impl TableDeclaration {
    /// Creates a declaration with only the update method set.
    pub fn new(update_method: UpdateMethod) -> Self {
        Self {
            update_method,
            destination_table: None,
            staging_table: None,
            s3_object: None,
            table_copy_params: None,
            column_inclusions: None,
            update_keys: None,
            column_transformations: Vec::new(),
            sort_key: None,
            include_load_dts: false,
            incremental_load_columns: Vec::new(),
        }
    }

    /// Returns the column transformations merged into a single map.
    ///
    /// Later entries win when the same column is listed twice.
    pub fn transformations(&self) -> BTreeMap<String, String> {
        self.column_transformations
            .iter()
            .flat_map(|entry| entry.iter())
            .map(|(column, expression)| (column.clone(), expression.clone()))
            .collect()
    }

    /// Returns the incremental columns in declaration order.
    pub fn incremental_columns(
        &self,
    ) -> impl Iterator<Item = (&str, IncrementalColumnDeclaration)> + '_ {
        self.incremental_load_columns
            .iter()
            .flat_map(|entry| entry.iter())
            .map(|(column, settings)| (column.as_str(), settings.clone().unwrap_or_default()))
    }
}
