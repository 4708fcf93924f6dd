use std::collections::HashMap;

use crate::error::{ErrorKind, IngestResult};
use crate::ingest_error;
use crate::secrets::{Credential, SecretProvider};

/// [`SecretProvider`] serving credential documents registered up front.
#[derive(Debug, Clone, Default)]
pub struct MemorySecretProvider {
    documents: HashMap<String, String>,
}

impl MemorySecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the JSON credential document of `reference`.
    pub fn with_document(mut self, reference: &str, document: &str) -> Self {
        self.documents
            .insert(reference.to_string(), document.to_string());
        self
    }
}

impl SecretProvider for MemorySecretProvider {
    async fn resolve(&self, reference: &str) -> IngestResult<Credential> {
        let Some(document) = self.documents.get(reference) else {
            return Err(ingest_error!(
                ErrorKind::SecretResolutionFailed,
                "Secret reference could not be resolved",
                reference
            ));
        };

        Credential::from_json(document)
    }
}
