//! Orchestration of table runs.
//!
//! A table run is an explicit state machine: [`next_phase`] decides the order of phases from the
//! resolved [`crate::table::TableConfig`] alone, and [`TableRunner`] executes the action of each
//! phase against the connectors. [`Ingestion`] runs the declared tables in order.

mod ingestion;
mod phase;
mod runner;

pub use ingestion::Ingestion;
pub use phase::{IngestionPhase, next_phase};
pub use runner::{
    Connectors, EXPORT_DELIMITER, PROCESSING_FOLDER, RunOutcome, TableRunReport, TableRunner,
};
