use serde::{Deserialize, Serialize};

use crate::shared::{DestinationPlatform, SourcePlatform, ValidationError};

/// COPY options applied when the declaration does not override them.
pub const DEFAULT_COPY_EXTRA_PARAMS: &str =
    "CSV GZIP delimiter AS ',' NULL AS 'NULL' TRUNCATECOLUMNS IGNOREHEADER 1";

/// Credential reference used for the warehouse when none is declared.
pub const DEFAULT_DESTINATION_CREDENTIALS: &str = "redshift_ac_master";

/// Schema holding staging tables when none is declared.
pub const DEFAULT_STAGING_SCHEMA: &str = "staging";

/// Threshold used for an incremental column that has never been bookmarked.
pub const DEFAULT_BOOKMARK: &str = "1900-01-01 00:00:00";

fn default_copy_extra_params() -> String {
    DEFAULT_COPY_EXTRA_PARAMS.to_string()
}

fn default_destination_credentials() -> String {
    DEFAULT_DESTINATION_CREDENTIALS.to_string()
}

fn default_staging_schema() -> String {
    DEFAULT_STAGING_SCHEMA.to_string()
}

fn default_bookmark() -> String {
    DEFAULT_BOOKMARK.to_string()
}

/// Pipeline-level settings shared by every table of an ingestion job.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Name of the job. Prefixes bookmark keys and default object keys.
    pub dag_name: String,
    /// Platform rows are read from.
    #[serde(default)]
    pub source_platform: SourcePlatform,
    /// Platform rows are loaded into.
    #[serde(default)]
    pub destination_platform: DestinationPlatform,
    /// Schema tables are read from on a database source.
    #[serde(default)]
    pub source_schema: Option<String>,
    /// Schema destination tables live in.
    pub destination_schema: String,
    /// Schema staging tables live in.
    #[serde(default = "default_staging_schema")]
    pub staging_schema: String,
    /// Bucket export artifacts are uploaded to.
    pub s3_bucket_name: String,
    /// Reference to the source credentials, resolved by a secret provider.
    #[serde(default)]
    pub source_credentials: Option<String>,
    /// Reference to the warehouse credentials, resolved by a secret provider.
    #[serde(default = "default_destination_credentials")]
    pub destination_credentials: String,
    /// Options appended to every COPY statement.
    #[serde(default = "default_copy_extra_params")]
    pub copy_extra_params: String,
    /// Role the warehouse assumes to read from the bucket.
    #[serde(default)]
    pub iam_role: Option<String>,
    /// First-run threshold for incremental columns without a declared initial value.
    #[serde(default = "default_bookmark")]
    pub default_bookmark: String,
}

impl PipelineConfig {
    /// Validates pipeline configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dag_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("dag_name"));
        }

        if self.destination_schema.trim().is_empty() {
            return Err(ValidationError::EmptyField("destination_schema"));
        }

        if self.staging_schema.trim().is_empty() {
            return Err(ValidationError::EmptyField("staging_schema"));
        }

        if self.s3_bucket_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("s3_bucket_name"));
        }

        if self.source_platform.is_database()
            && self
                .source_schema
                .as_deref()
                .is_none_or(|schema| schema.trim().is_empty())
        {
            return Err(ValidationError::MissingSourceSchema(
                self.source_platform.to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the source schema, or an empty string for object-storage sources.
    pub fn source_schema(&self) -> &str {
        self.source_schema.as_deref().unwrap_or_default()
    }
}
