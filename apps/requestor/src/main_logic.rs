use std::sync::Arc;

use anyhow::{Context, Result};
use async_nats::jetstream;
use axum::serve;
use credentials::{
    CredentialVerifier, NatsKvCredentialStore, SharedCredentialStore, SqliteCredentialStore,
};
use requestor_bus::JetStreamBusClient;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{CredentialBackend, RequestorConfig};
use crate::forward::RequestForwarder;
use crate::http::{GatewayState, build_router};

/// Connects the shared clients, then serves until Ctrl-C.
pub async fn run(config: RequestorConfig) -> Result<()> {
    let nats = async_nats::connect(&config.nats_url)
        .await
        .with_context(|| format!("connect to NATS at {}", config.nats_url))?;

    let bus = JetStreamBusClient::new(nats.clone());
    bus.ensure_stream(&config.queue_stream, &config.queue_subject)
        .await?;

    let store: SharedCredentialStore = match &config.credential_backend {
        CredentialBackend::JetStream => {
            let js = jetstream::new(nats.clone());
            Arc::new(NatsKvCredentialStore::open(&js, &config.credentials_table).await?)
        }
        CredentialBackend::Sqlite { path } => Arc::new(
            SqliteCredentialStore::open(path, &config.credentials_table)
                .with_context(|| format!("open credential database {}", path.display()))?,
        ),
    };
    info!(
        backend = config.credential_backend.name(),
        table = %config.credentials_table,
        subject = %config.queue_subject,
        "intake pipeline ready"
    );

    let state = GatewayState::new(
        CredentialVerifier::new(store),
        RequestForwarder::new(Arc::new(bus), config.queue_subject.clone()),
    );
    let router = build_router(state);
    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("bind {}", config.addr))?;
    info!("requestor listening on {}", config.addr);

    serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
