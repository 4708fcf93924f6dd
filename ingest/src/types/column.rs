use serde::{Deserialize, Serialize};

/// Column metadata read from a source or destination catalog.
///
/// Mirrors the `information_schema.columns` fields the type mapper needs. Descriptors only
/// live for the duration of a reconciliation or configuration resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Native type name as reported by the catalog, e.g. `character varying`.
    pub data_type: String,
    pub character_maximum_length: Option<u32>,
    pub numeric_precision: Option<u32>,
    pub numeric_scale: Option<u32>,
    pub ordinal_position: u32,
}

impl ColumnDescriptor {
    /// Creates a descriptor without sizing information.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, ordinal_position: u32) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            character_maximum_length: None,
            numeric_precision: None,
            numeric_scale: None,
            ordinal_position,
        }
    }

    /// Sets the declared character length.
    pub fn with_length(mut self, length: u32) -> Self {
        self.character_maximum_length = Some(length);
        self
    }

    /// Sets the declared numeric precision and scale.
    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.numeric_precision = Some(precision);
        self.numeric_scale = Some(scale);
        self
    }
}
