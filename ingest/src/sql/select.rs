use std::collections::BTreeMap;

use ingest_config::shared::SourcePlatform;

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::sql::{StatementBuilder, require_non_empty, required_params};

/// Parameters of the extraction query run against a database source.
#[derive(Debug, Clone)]
pub struct SelectParams {
    pub source_platform: SourcePlatform,
    pub schema: String,
    pub table: String,
    pub columns: Vec<String>,
    /// Expressions selected in place of the named columns.
    pub transformations: BTreeMap<String, String>,
    /// Predicates joined with `AND` into the `WHERE` clause.
    pub predicates: Vec<String>,
}

/// Builds `SELECT {columns} FROM {schema}.{table}[ WHERE {predicates}]` with every identifier
/// quoted for the source platform.
#[derive(Debug, Clone, Default)]
pub struct SelectStatementBuilder {
    params: Option<SelectParams>,
}

impl StatementBuilder for SelectStatementBuilder {
    type Params = SelectParams;

    fn set_params(mut self, params: SelectParams) -> Self {
        self.params = Some(params);
        self
    }

    fn build(&self) -> IngestResult<String> {
        let params = required_params(&self.params, "select")?;
        require_non_empty(&params.schema, "schema", "select")?;
        require_non_empty(&params.table, "table", "select")?;

        if params.columns.is_empty() {
            bail!(
                ErrorKind::ConfigError,
                "Statement parameter is empty",
                format!("no columns are selected from `{}`", params.table)
            );
        }

        let quote = params.source_platform.identifier_quote();
        let columns = params
            .columns
            .iter()
            .map(|column| match params.transformations.get(column) {
                Some(expression) => expression.clone(),
                None => quote_with(column, quote),
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut statement = format!(
            "SELECT {columns} FROM {}.{}",
            quote_with(&params.schema, quote),
            quote_with(&params.table, quote)
        );

        let predicates: Vec<&str> = params
            .predicates
            .iter()
            .map(|predicate| predicate.trim())
            .filter(|predicate| !predicate.is_empty())
            .collect();
        if !predicates.is_empty() {
            statement.push_str(" WHERE ");
            statement.push_str(&predicates.join(" AND "));
        }

        Ok(statement)
    }
}

/// Wraps `identifier` in `quote`, doubling any embedded quote character.
fn quote_with(identifier: &str, quote: char) -> String {
    let mut quoted = String::with_capacity(identifier.len() + 2);
    quoted.push(quote);
    for c in identifier.chars() {
        if c == quote {
            quoted.push(c);
        }
        quoted.push(c);
    }
    quoted.push(quote);
    quoted
}
