//! Value types shared by the engine components.

mod column;
mod table;

pub use column::ColumnDescriptor;
pub use table::QualifiedTable;
