use std::fmt;
use std::future::Future;

use ingest_config::shared::PipelineConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::{ErrorKind, IngestResult};
use crate::ingest_error;

/// Connection credentials resolved from a secret reference.
///
/// Deserializes from the JSON document a secrets backend stores for a database, e.g.
/// `{"username": "loader", "password": "...", "host": "...", "port": 5439, "dbname": "dw"}`.
#[derive(Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: SecretString,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub dbname: Option<String>,
}

impl Credential {
    /// Parses a credential document.
    pub fn from_json(document: &str) -> IngestResult<Self> {
        let credential: Credential = serde_json::from_str(document)?;

        if credential.username.trim().is_empty() {
            return Err(ingest_error!(
                ErrorKind::SecretResolutionFailed,
                "Credential is incomplete",
                "the credential document has an empty username"
            ));
        }

        Ok(credential)
    }

    /// Returns the password.
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .finish()
    }
}

/// Trait for backends that turn credential references into [`Credential`]s.
///
/// References are the opaque names carried by the pipeline configuration, such as
/// `redshift_ac_master`.
pub trait SecretProvider {
    /// Resolves `reference`.
    ///
    /// Fails with [`ErrorKind::SecretResolutionFailed`] when the reference is unknown or its
    /// document cannot be parsed.
    fn resolve(&self, reference: &str) -> impl Future<Output = IngestResult<Credential>> + Send;
}

/// Credentials needed to open the connectors of one pipeline.
#[derive(Debug)]
pub struct PipelineCredentials {
    /// `None` for sources that are not databases.
    pub source: Option<Credential>,
    pub destination: Credential,
}

/// Resolves the source and destination credentials referenced by `pipeline`.
pub async fn resolve_pipeline_credentials<P>(
    provider: &P,
    pipeline: &PipelineConfig,
) -> IngestResult<PipelineCredentials>
where
    P: SecretProvider,
{
    let source = match (&pipeline.source_credentials, pipeline.source_platform.is_database()) {
        (Some(reference), true) => Some(provider.resolve(reference).await?),
        (None, true) => {
            return Err(ingest_error!(
                ErrorKind::ConfigError,
                "Source credentials are missing",
                format!(
                    "`source_credentials` is required for a `{}` source",
                    pipeline.source_platform
                )
            ));
        }
        (_, false) => None,
    };

    let destination = provider.resolve(&pipeline.destination_credentials).await?;

    Ok(PipelineCredentials {
        source,
        destination,
    })
}
