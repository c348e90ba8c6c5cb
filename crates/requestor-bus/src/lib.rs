//! Queue client abstraction used by the intake gateway.
//!
//! Producers hand a JSON value to a [`BusClient`] and get back the identifier
//! the queue assigned to the message. Nothing here retries or deduplicates.

use async_nats::jetstream::{self, Context as JsContext, stream};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

#[derive(thiserror::Error, Debug)]
pub enum BusError {
    #[error("failed to encode queue payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Publish(#[from] anyhow::Error),
}

/// Acknowledgment returned by the queue for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub message_id: String,
}

#[async_trait]
pub trait BusClient: Send + Sync {
    async fn publish_value(&self, subject: &str, payload: Value)
    -> Result<PublishReceipt, BusError>;
}

pub type SharedBusClient = Arc<dyn BusClient>;

/// JetStream producer. The stream sequence from the publish ack is the message id.
#[derive(Clone)]
pub struct JetStreamBusClient {
    context: JsContext,
}

impl JetStreamBusClient {
    pub fn new(client: async_nats::Client) -> Self {
        Self {
            context: jetstream::new(client),
        }
    }

    /// Loads the stream bound to `subject`, creating it when missing.
    pub async fn ensure_stream(&self, name: &str, subject: &str) -> anyhow::Result<()> {
        self.context
            .get_or_create_stream(stream::Config {
                name: name.to_string(),
                subjects: vec![subject.to_string()],
                ..Default::default()
            })
            .await
            .map_err(|err| anyhow::anyhow!(err).context(format!("ensure stream {name}")))?;
        Ok(())
    }
}

#[async_trait]
impl BusClient for JetStreamBusClient {
    #[instrument(name = "bus.publish", skip(self, payload), fields(subject = %subject))]
    async fn publish_value(
        &self,
        subject: &str,
        payload: Value,
    ) -> Result<PublishReceipt, BusError> {
        let bytes = serde_json::to_vec(&payload)?;
        let ack = self
            .context
            .publish(subject.to_string(), bytes.into())
            .await
            .map_err(|err| BusError::Publish(anyhow::Error::new(err)))?
            .await
            .map_err(|err| BusError::Publish(anyhow::Error::new(err)))?;
        debug!(stream = %ack.stream, sequence = ack.sequence, "publish acknowledged");
        Ok(PublishReceipt {
            message_id: ack.sequence.to_string(),
        })
    }
}

/// Records published messages and hands out `mem-<n>` identifiers.
#[derive(Clone, Default)]
pub struct InMemoryBusClient {
    published: Arc<Mutex<Vec<(String, Value)>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryBusClient {
    pub async fn take_published(&self) -> Vec<(String, Value)> {
        let mut guard = self.published.lock().await;
        std::mem::take(&mut *guard)
    }
}

#[async_trait]
impl BusClient for InMemoryBusClient {
    async fn publish_value(
        &self,
        subject: &str,
        payload: Value,
    ) -> Result<PublishReceipt, BusError> {
        let mut guard = self.published.lock().await;
        guard.push((subject.to_string(), payload));
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PublishReceipt {
            message_id: format!("mem-{id}"),
        })
    }
}

pub fn to_value<T: Serialize>(payload: &T) -> Result<Value, BusError> {
    Ok(serde_json::to_value(payload)?)
}
