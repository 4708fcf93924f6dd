//! Warehouse ingestion engine.
//!
//! Moves table-shaped data from source databases, or files already sitting in object storage,
//! into a columnar warehouse. Each declared table is resolved into a [`table::TableConfig`],
//! its warehouse tables are reconciled by [`schema::SchemaReconciler`], and a
//! [`pipeline::TableRunner`] drives it through extraction, staging and one of the update
//! methods. External systems are reached through the connector traits in [`source`],
//! [`destination`], [`object_store`], [`secrets`] and [`store`].

pub mod destination;
pub mod error;
mod macros;
pub mod mapping;
pub mod object_store;
pub mod pipeline;
pub mod schema;
pub mod secrets;
pub mod source;
pub mod sql;
pub mod store;
pub mod table;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
