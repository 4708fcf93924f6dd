//! Shared configuration types for ingestion pipelines.

mod base;
mod ingestion;
mod pipeline;
mod platform;
mod table;

pub use base::ValidationError;
pub use ingestion::IngestionConfig;
pub use pipeline::{
    DEFAULT_BOOKMARK, DEFAULT_COPY_EXTRA_PARAMS, DEFAULT_DESTINATION_CREDENTIALS,
    DEFAULT_STAGING_SCHEMA, PipelineConfig,
};
pub use platform::{DestinationPlatform, SourcePlatform, UpdateMethod};
pub use table::{IncrementalColumnDeclaration, TableDeclaration};
