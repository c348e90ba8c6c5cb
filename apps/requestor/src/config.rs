use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_NATS_URL: &str = "nats://127.0.0.1:4222";
pub const DEFAULT_QUEUE_SUBJECT: &str = "requestor.notifications";
pub const DEFAULT_QUEUE_STREAM: &str = "NOTIFICATIONS";
pub const DEFAULT_CREDENTIALS_TABLE: &str = "Applications";
pub const DEFAULT_SQLITE_PATH: &str = "applications.db";

/// Where issued credentials are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialBackend {
    /// JetStream key-value bucket named after the credentials table.
    JetStream,
    Sqlite { path: PathBuf },
}

impl CredentialBackend {
    pub fn name(&self) -> &'static str {
        match self {
            CredentialBackend::JetStream => "jetstream",
            CredentialBackend::Sqlite { .. } => "sqlite",
        }
    }
}

/// Process configuration, read once at startup and fixed afterwards.
#[derive(Debug, Clone)]
pub struct RequestorConfig {
    pub addr: SocketAddr,
    pub nats_url: String,
    pub queue_subject: String,
    pub queue_stream: String,
    pub credentials_table: String,
    pub credential_backend: CredentialBackend,
}

impl RequestorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind = get("BIND", DEFAULT_BIND);
        let addr: SocketAddr = bind
            .parse()
            .with_context(|| format!("invalid BIND address `{bind}`"))?;

        let credential_backend = match get("CREDENTIAL_STORE", "jetstream")
            .to_lowercase()
            .as_str()
        {
            "jetstream" | "nats" | "kv" => CredentialBackend::JetStream,
            "sqlite" => CredentialBackend::Sqlite {
                path: PathBuf::from(get("CREDENTIAL_SQLITE_PATH", DEFAULT_SQLITE_PATH)),
            },
            other => bail!("unsupported CREDENTIAL_STORE `{other}` (expected jetstream or sqlite)"),
        };

        let queue_subject = get("REQUESTOR_QUEUE_SUBJECT", DEFAULT_QUEUE_SUBJECT);
        if queue_subject.contains(['*', '>', ' ']) {
            bail!("REQUESTOR_QUEUE_SUBJECT must be a concrete subject, got `{queue_subject}`");
        }

        Ok(Self {
            addr,
            nats_url: get("NATS_URL", DEFAULT_NATS_URL),
            queue_subject,
            queue_stream: get("REQUESTOR_QUEUE_STREAM", DEFAULT_QUEUE_STREAM),
            credentials_table: get("APPLICATIONS_TABLE", DEFAULT_CREDENTIALS_TABLE),
            credential_backend,
        })
    }
}
