mod base;
mod env;

pub use base::{Credential, PipelineCredentials, SecretProvider, resolve_pipeline_credentials};
pub use env::{DEFAULT_SECRET_ENV_PREFIX, EnvSecretProvider};
