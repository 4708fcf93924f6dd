use pg_escape::{quote_identifier, quote_literal};

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::sql::{StatementBuilder, require_non_empty, required_params};
use crate::types::QualifiedTable;

/// Parameters of a bulk load from object storage into a warehouse table.
#[derive(Debug, Clone)]
pub struct CopyParams {
    pub table: QualifiedTable,
    /// Explicit target column list, `None` to load every column in table order.
    pub columns: Option<Vec<String>>,
    /// Full object path, e.g. `s3://bucket/dag/customer.csv.gz`.
    pub path: String,
    pub iam_role: Option<String>,
    /// Format options appended verbatim.
    pub options: String,
}

/// Builds `COPY {table}[ ({columns})] FROM '{path}'[ IAM_ROLE '{role}'] {options}`.
#[derive(Debug, Clone, Default)]
pub struct CopyStatementBuilder {
    params: Option<CopyParams>,
}

impl StatementBuilder for CopyStatementBuilder {
    type Params = CopyParams;

    fn set_params(mut self, params: CopyParams) -> Self {
        self.params = Some(params);
        self
    }

    fn build(&self) -> IngestResult<String> {
        let params = required_params(&self.params, "copy")?;
        require_non_empty(&params.path, "path", "copy")?;

        let mut statement = format!("COPY {}", params.table);

        if let Some(columns) = &params.columns {
            if columns.is_empty() {
                bail!(
                    ErrorKind::ConfigError,
                    "Statement parameter is empty",
                    format!("the copy column list of `{}` is empty", params.table)
                );
            }
            statement.push_str(&format!(" ({})", quote_columns(columns)));
        }

        statement.push_str(&format!(" FROM {}", quote_literal(&params.path)));

        if let Some(role) = params.iam_role.as_deref().filter(|role| !role.trim().is_empty()) {
            statement.push_str(&format!(" IAM_ROLE {}", quote_literal(role)));
        }

        let options = params.options.trim();
        if !options.is_empty() {
            statement.push(' ');
            statement.push_str(options);
        }

        Ok(statement)
    }
}

/// Parameters of the delete half of a merge.
#[derive(Debug, Clone)]
pub struct DeleteParams {
    pub target: QualifiedTable,
    pub staging: QualifiedTable,
    pub keys: Vec<String>,
}

/// Builds `DELETE FROM {target} USING {staging} WHERE {target}.{key} = {staging}.{key} AND ...`.
#[derive(Debug, Clone, Default)]
pub struct DeleteStatementBuilder {
    params: Option<DeleteParams>,
}

impl StatementBuilder for DeleteStatementBuilder {
    type Params = DeleteParams;

    fn set_params(mut self, params: DeleteParams) -> Self {
        self.params = Some(params);
        self
    }

    fn build(&self) -> IngestResult<String> {
        let params = required_params(&self.params, "delete")?;

        if params.keys.is_empty() {
            bail!(
                ErrorKind::ConfigError,
                "Statement parameter is empty",
                format!("no update keys are set for `{}`", params.target)
            );
        }

        let conditions = params
            .keys
            .iter()
            .map(|key| {
                let key = quote_identifier(key);
                format!("{}.{key} = {}.{key}", params.target, params.staging)
            })
            .collect::<Vec<_>>()
            .join(" AND ");

        Ok(format!(
            "DELETE FROM {} USING {} WHERE {conditions}",
            params.target, params.staging
        ))
    }
}

/// Parameters of an append from staging.
#[derive(Debug, Clone)]
pub struct AppendParams {
    pub target: QualifiedTable,
    pub staging: QualifiedTable,
}

/// Builds `INSERT INTO {target} SELECT * FROM {staging}`.
#[derive(Debug, Clone, Default)]
pub struct AppendStatementBuilder {
    params: Option<AppendParams>,
}

impl StatementBuilder for AppendStatementBuilder {
    type Params = AppendParams;

    fn set_params(mut self, params: AppendParams) -> Self {
        self.params = Some(params);
        self
    }

    fn build(&self) -> IngestResult<String> {
        let params = required_params(&self.params, "append")?;

        Ok(format!(
            "INSERT INTO {} SELECT * FROM {}",
            params.target, params.staging
        ))
    }
}

fn quote_columns(columns: &[String]) -> String {
    columns
        .iter()
        .map(|column| quote_identifier(column))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> QualifiedTable {
        QualifiedTable::new("ac_shopping_crm", "customer")
    }

    fn staging() -> QualifiedTable {
        QualifiedTable::new("staging", "ac_shopping_crm_customer")
    }

    #[test]
    fn copy_with_columns_and_role() {
        let statement = CopyStatementBuilder::default()
            .set_params(CopyParams {
                table: staging(),
                columns: Some(vec!["id".to_string(), "email".to_string()]),
                path: "s3://ac-shopping-datalake/crm_daily/customer.csv.gz".to_string(),
                iam_role: Some("arn:aws:iam::123456789012:role/loader".to_string()),
                options: "CSV GZIP IGNOREHEADER 1".to_string(),
            })
            .build()
            .unwrap();

        assert_eq!(
            statement,
            "COPY staging.ac_shopping_crm_customer (id, email) \
             FROM 's3://ac-shopping-datalake/crm_daily/customer.csv.gz' \
             IAM_ROLE 'arn:aws:iam::123456789012:role/loader' CSV GZIP IGNOREHEADER 1"
        );
    }

    #[test]
    fn copy_without_columns_or_role() {
        let statement = CopyStatementBuilder::default()
            .set_params(CopyParams {
                table: staging(),
                columns: None,
                path: "s3://bucket/key.csv.gz".to_string(),
                iam_role: None,
                options: String::new(),
            })
            .build()
            .unwrap();

        assert_eq!(
            statement,
            "COPY staging.ac_shopping_crm_customer FROM 's3://bucket/key.csv.gz'"
        );
    }

    #[test]
    fn copy_rejects_empty_column_list() {
        let err = CopyStatementBuilder::default()
            .set_params(CopyParams {
                table: staging(),
                columns: Some(Vec::new()),
                path: "s3://bucket/key.csv.gz".to_string(),
                iam_role: None,
                options: String::new(),
            })
            .build()
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }

    #[test]
    fn delete_joins_every_key() {
        let statement = DeleteStatementBuilder::default()
            .set_params(DeleteParams {
                target: target(),
                staging: staging(),
                keys: vec!["id".to_string(), "customer_id".to_string()],
            })
            .build()
            .unwrap();

        assert_eq!(
            statement,
            "DELETE FROM ac_shopping_crm.customer USING staging.ac_shopping_crm_customer \
             WHERE ac_shopping_crm.customer.id = staging.ac_shopping_crm_customer.id \
             AND ac_shopping_crm.customer.customer_id = staging.ac_shopping_crm_customer.customer_id"
        );
    }

    #[test]
    fn delete_without_keys_is_a_config_error() {
        let err = DeleteStatementBuilder::default()
            .set_params(DeleteParams {
                target: target(),
                staging: staging(),
                keys: Vec::new(),
            })
            .build()
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }

    #[test]
    fn append_is_deterministic() {
        let builder = AppendStatementBuilder::default().set_params(AppendParams {
            target: target(),
            staging: staging(),
        });

        let first = builder.build().unwrap();
        assert_eq!(
            first,
            "INSERT INTO ac_shopping_crm.customer SELECT * FROM staging.ac_shopping_crm_customer"
        );
        assert_eq!(builder.build().unwrap(), first);
        assert!(AppendStatementBuilder::default().build().is_err());
    }
}
