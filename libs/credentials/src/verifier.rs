use tracing::{debug, error, instrument};

use crate::bearer::Credential;
use crate::store::{CredentialRecord, SharedCredentialStore, StoreError};

/// Result of a single store lookup before it is collapsed to allow/deny.
#[derive(Debug)]
pub enum LookupOutcome {
    Found(CredentialRecord),
    NotFound,
    Failed(StoreError),
}

impl LookupOutcome {
    /// Only a found record authorizes; store failures deny.
    pub fn is_authorized(&self) -> bool {
        matches!(self, LookupOutcome::Found(_))
    }
}

/// Checks credentials against a durable store with one lookup per call.
#[derive(Clone)]
pub struct CredentialVerifier {
    store: SharedCredentialStore,
}

impl CredentialVerifier {
    pub fn new(store: SharedCredentialStore) -> Self {
        Self { store }
    }

    #[instrument(name = "credentials.lookup", skip_all)]
    pub async fn lookup(&self, credential: &Credential) -> LookupOutcome {
        match self.store.lookup(credential.as_str()).await {
            Ok(Some(record)) => LookupOutcome::Found(record),
            Ok(None) => LookupOutcome::NotFound,
            Err(err) => LookupOutcome::Failed(err),
        }
    }

    pub async fn verify(&self, credential: &Credential) -> bool {
        let outcome = self.lookup(credential).await;
        match &outcome {
            LookupOutcome::Found(_) => {}
            LookupOutcome::NotFound => debug!("credential not found"),
            LookupOutcome::Failed(err) => {
                error!(error = %err, "credential lookup failed; denying request");
            }
        }
        outcome.is_authorized()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::anyhow;
    use async_trait::async_trait;
    use tracing_test::traced_test;

    use super::*;
    use crate::store::{CredentialStore, InMemoryCredentialStore};

    struct UnreachableStore;

    #[async_trait]
    impl CredentialStore for UnreachableStore {
        async fn lookup(&self, _credential: &str) -> Result<Option<CredentialRecord>, StoreError> {
            Err(StoreError::Backend(anyhow!("connection refused")))
        }
    }

    #[tokio::test]
    async fn found_record_verifies() {
        let store = InMemoryCredentialStore::with_credentials(["abc123"]);
        let verifier = CredentialVerifier::new(Arc::new(store));
        assert!(verifier.verify(&Credential::new("abc123")).await);
        assert!(
            verifier
                .lookup(&Credential::new("abc123"))
                .await
                .is_authorized()
        );
    }

    #[tokio::test]
    async fn missing_record_is_denied() {
        let verifier = CredentialVerifier::new(Arc::new(InMemoryCredentialStore::new()));
        assert!(!verifier.verify(&Credential::new("abc123")).await);
        assert!(matches!(
            verifier.lookup(&Credential::new("")).await,
            LookupOutcome::NotFound
        ));
    }

    #[tokio::test]
    #[traced_test]
    async fn store_failure_fails_closed_and_is_logged() {
        let verifier = CredentialVerifier::new(Arc::new(UnreachableStore));
        let outcome = verifier.lookup(&Credential::new("abc123")).await;
        assert!(matches!(outcome, LookupOutcome::Failed(_)));
        assert!(!outcome.is_authorized());

        assert!(!verifier.verify(&Credential::new("abc123")).await);
        assert!(logs_contain("credential lookup failed"));
        assert!(logs_contain("connection refused"));
        assert!(!logs_contain("abc123"));
    }
}
