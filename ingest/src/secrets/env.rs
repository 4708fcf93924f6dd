use crate::error::{ErrorKind, IngestResult};
use crate::ingest_error;
use crate::secrets::{Credential, SecretProvider};

/// Prefix of the environment variables read by [`EnvSecretProvider::new`].
pub const DEFAULT_SECRET_ENV_PREFIX: &str = "INGEST_SECRET_";

/// [`SecretProvider`] reading credential documents from environment variables.
///
/// The reference `redshift_ac_master` is read from `INGEST_SECRET_REDSHIFT_AC_MASTER`: the
/// reference is upper-cased and every character that is not ASCII alphanumeric becomes `_`.
#[derive(Debug, Clone)]
pub struct EnvSecretProvider {
    prefix: String,
}

impl EnvSecretProvider {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_SECRET_ENV_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the environment variable holding the document of `reference`.
    pub fn variable_name(&self, reference: &str) -> String {
        let suffix: String = reference
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();

        format!("{}{suffix}", self.prefix)
    }
}

impl Default for EnvSecretProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretProvider for EnvSecretProvider {
    async fn resolve(&self, reference: &str) -> IngestResult<Credential> {
        let variable = self.variable_name(reference);

        let document = std::env::var(&variable).map_err(|err| {
            ingest_error!(
                ErrorKind::SecretResolutionFailed,
                "Secret reference could not be resolved",
                format!("reading `{variable}` for `{reference}` failed: {err}"),
                source: err
            )
        })?;

        Credential::from_json(&document).map_err(|err| {
            ingest_error!(
                ErrorKind::SecretResolutionFailed,
                "Secret document is invalid",
                format!("the document in `{variable}` could not be parsed"),
                source: err
            )
        })
    }
}
