use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CredentialRecord, CredentialStore, StoreError};

/// Map-backed store used in tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    inner: Arc<RwLock<HashMap<String, CredentialRecord>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials<I, S>(credentials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let map = credentials
            .into_iter()
            .map(|c| {
                let c = c.into();
                (c.clone(), CredentialRecord::new(c))
            })
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn insert(&self, record: CredentialRecord) {
        let mut guard = self.inner.write().await;
        guard.insert(record.credential.clone(), record);
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn lookup(&self, credential: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.inner.read().await.get(credential).cloned())
    }
}
