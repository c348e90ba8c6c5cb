use anyhow::{Context, anyhow};
use async_nats::jetstream::{Context as JsContext, kv};
use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{CredentialRecord, CredentialStore, StoreError};

/// Credentials held in a JetStream key-value bucket, one key per credential.
///
/// The bucket belongs to the issuing process and is never created here.
#[derive(Clone)]
pub struct NatsKvCredentialStore {
    bucket: kv::Store,
}

impl NatsKvCredentialStore {
    pub async fn open(js: &JsContext, bucket: &str) -> anyhow::Result<Self> {
        let bucket = js
            .get_key_value(bucket)
            .await
            .with_context(|| format!("open credential bucket {bucket}"))?;
        Ok(Self { bucket })
    }
}

#[async_trait]
impl CredentialStore for NatsKvCredentialStore {
    #[instrument(name = "credentials.kv_lookup", skip_all)]
    async fn lookup(&self, credential: &str) -> Result<Option<CredentialRecord>, StoreError> {
        let Some(key) = storable_key(credential) else {
            return Ok(None);
        };
        let entry = self
            .bucket
            .get(key)
            .await
            .map_err(|err| StoreError::Backend(anyhow!(err).context("credential kv get")))?;
        Ok(entry.map(|raw| CredentialRecord::from_stored(credential, &raw)))
    }
}

/// Returns the credential as a bucket key, or `None` when no key in the
/// bucket could ever hold it.
fn storable_key(credential: &str) -> Option<&str> {
    if is_valid_key(credential) {
        Some(credential)
    } else {
        debug!(
            len = credential.len(),
            "credential is not a valid kv key; treating as unknown"
        );
        None
    }
}

/// NATS KV keys: non-empty, `[-/_=.a-zA-Z0-9]`, no leading or trailing `.`.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && !key.ends_with('.')
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'/' | b'_' | b'=' | b'.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn token_alphabet_is_accepted() {
        assert!(is_valid_key("abc123"));
        assert!(is_valid_key("eyJhbGciOi.eyJzdWIi.c2ln-_="));
        assert!(is_valid_key("team/app"));
    }

    #[test]
    fn keys_the_bucket_cannot_hold_are_rejected() {
        for key in ["", "a b", "a+b", "a*", "a>b", ".abc", "abc.", "tok\u{e9}n"] {
            assert!(!is_valid_key(key), "{key:?}");
        }
    }

    #[test]
    #[traced_test]
    fn unstorable_credential_is_unknown_and_logged_at_debug() {
        assert_eq!(storable_key("abc123"), Some("abc123"));
        assert_eq!(storable_key("secret+token"), None);
        assert!(logs_contain("not a valid kv key"));
        assert!(!logs_contain("secret+token"));
        assert!(!logs_contain("ERROR"));
    }
}
