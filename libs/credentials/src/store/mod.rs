//! Durable credential stores.
//!
//! The gateway only ever reads from a store: records are written by whatever
//! process issues credentials. A lookup has three results: a record, no
//! record, or a [`StoreError`].

mod jetstream;
mod memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use jetstream::NatsKvCredentialStore;
pub use memory::InMemoryCredentialStore;
pub use sqlite::SqliteCredentialStore;

/// Record held for an issued credential. Only its existence matters to the
/// gateway; `attributes` is carried through as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub credential: String,
    #[serde(default)]
    pub attributes: Value,
}

impl CredentialRecord {
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
            attributes: Value::Null,
        }
    }

    /// Decodes stored bytes as JSON attributes, falling back to `null`.
    pub fn from_stored(credential: impl Into<String>, raw: &[u8]) -> Self {
        Self {
            credential: credential.into(),
            attributes: serde_json::from_slice(raw).unwrap_or(Value::Null),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("invalid credential table name `{0}`")]
    InvalidTable(String),
    #[error("credential table `{0}` does not exist")]
    MissingTable(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Point lookup by credential value.
    async fn lookup(&self, credential: &str) -> Result<Option<CredentialRecord>, StoreError>;
}

pub type SharedCredentialStore = Arc<dyn CredentialStore>;

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub(crate) fn validate_table_name(table: &str) -> Result<(), StoreError> {
    let mut chars = table.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTable(table.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stored_json_becomes_attributes() {
        let record = CredentialRecord::from_stored("t", br#"{"app":"billing"}"#);
        assert_eq!(record.attributes, json!({ "app": "billing" }));
    }

    #[test]
    fn non_json_payload_keeps_record() {
        let record = CredentialRecord::from_stored("t", b"\x00not json");
        assert_eq!(record.credential, "t");
        assert_eq!(record.attributes, Value::Null);
    }

    #[test]
    fn table_names_are_plain_identifiers() {
        assert!(validate_table_name("Applications").is_ok());
        assert!(validate_table_name("_apps_2").is_ok());
        for bad in ["", "2apps", "apps;drop", "app-keys", "a b", "\"apps\""] {
            assert!(
                matches!(validate_table_name(bad), Err(StoreError::InvalidTable(_))),
                "{bad}"
            );
        }
    }
}
