use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::load::Config;
use crate::shared::{PipelineConfig, TableDeclaration, ValidationError};

/// A complete ingestion declaration: pipeline settings plus the tables to load.
///
/// Pipeline fields sit at the top level of the document, next to the `tables` list:
///
/// ```yaml
/// dag_name: crm_daily
/// source_schema: ac_shopping
/// destination_schema: ac_shopping_crm
/// s3_bucket_name: ac-shopping-datalake
/// tables:
///   - customer:
///       update_method: merge
///       include_load_dts: true
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestionConfig {
    #[serde(flatten)]
    pub pipeline: PipelineConfig,
    /// Single-key maps of source table name to its declaration, in load order.
    pub tables: Vec<BTreeMap<String, TableDeclaration>>,
}

impl Config for IngestionConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

impl IngestionConfig {
    /// Validates the pipeline settings and the table list.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.pipeline.validate()?;

        let mut seen = HashSet::new();
        let mut count = 0;
        for (table, _) in self.table_declarations() {
            count += 1;
            if !seen.insert(table) {
                return Err(ValidationError::DuplicateTable(table.to_string()));
            }
        }

        if count == 0 {
            return Err(ValidationError::NoTables);
        }

        Ok(())
    }

    /// Returns the declared tables in declaration order.
    pub fn table_declarations(&self) -> impl Iterator<Item = (&str, &TableDeclaration)> + '_ {
        self.tables
            .iter()
            .flat_map(|entry| entry.iter())
            .map(|(table, declaration)| (table.as_str(), declaration))
    }

    /// Returns the declaration of `table`, if declared.
    pub fn table_declaration(&self, table: &str) -> Option<&TableDeclaration> {
        self.table_declarations()
            .find(|(name, _)| *name == table)
            .map(|(_, declaration)| declaration)
    }
}
