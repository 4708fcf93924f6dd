//! Declarative configuration for warehouse ingestion pipelines.
//!
//! The types in [`shared`] mirror the YAML documents that describe a pipeline and its tables.
//! Loading helpers live in [`load`].

mod environment;
pub mod load;
pub mod shared;

pub use environment::Environment;
