use std::fmt;

use pg_escape::quote_identifier;

/// A schema-qualified table name.
///
/// Renders as `schema.table`, quoting either part only when it is not a plain lowercase
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedTable {
    pub schema: String,
    pub table: String,
}

impl QualifiedTable {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for QualifiedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            quote_identifier(&self.schema),
            quote_identifier(&self.table)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(
            QualifiedTable::new("ac_shopping_crm", "customer").to_string(),
            "ac_shopping_crm.customer"
        );
        assert_eq!(
            QualifiedTable::new("Sales", "Order").to_string(),
            "\"Sales\".\"Order\""
        );
    }
}
