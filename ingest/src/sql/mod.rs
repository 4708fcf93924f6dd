//! SQL text generation for source extraction and warehouse loading.
//!
//! Parameterized statements go through a [`StatementBuilder`]; statements that only need a table
//! name are plain functions in [`ddl`].

pub mod ddl;
mod load;
mod select;

pub use load::{
    AppendParams, AppendStatementBuilder, CopyParams, CopyStatementBuilder, DeleteParams,
    DeleteStatementBuilder,
};
pub use select::{SelectParams, SelectStatementBuilder};

use crate::error::{ErrorKind, IngestResult};
use crate::ingest_error;

/// Name of the load timestamp column stamped on staged rows.
pub const TRACKING_COLUMN: &str = "load_dts";

/// A builder producing the text of one SQL statement.
///
/// Builders are plain values: [`StatementBuilder::set_params`] stores the parameters and
/// [`StatementBuilder::build`] renders them, so the same parameters always render the same text.
pub trait StatementBuilder: Default {
    type Params;

    /// Stores `params` and returns the builder.
    fn set_params(self, params: Self::Params) -> Self;

    /// Renders the statement.
    ///
    /// Fails with [`ErrorKind::ConfigError`] when no parameters were set or a required one is
    /// empty.
    fn build(&self) -> IngestResult<String>;
}

/// Returns the stored parameters or a configuration error naming the statement.
fn required_params<'a, P>(params: &'a Option<P>, statement: &'static str) -> IngestResult<&'a P> {
    params.as_ref().ok_or_else(|| {
        ingest_error!(
            ErrorKind::ConfigError,
            "Statement parameters are missing",
            format!("no parameters were set on the {statement} builder")
        )
    })
}

/// Fails when a required parameter is empty.
fn require_non_empty(value: &str, field: &'static str, statement: &'static str) -> IngestResult<()> {
    if value.trim().is_empty() {
        return Err(ingest_error!(
            ErrorKind::ConfigError,
            "Statement parameter is empty",
            format!("`{field}` of the {statement} statement must not be empty")
        ));
    }

    Ok(())
}
