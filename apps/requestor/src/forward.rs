use requestor_bus::{BusError, PublishReceipt, SharedBusClient, to_value};
use tracing::instrument;

use crate::models::NotificationRequest;

/// Hands validated requests to the queue. One publish attempt per call.
#[derive(Clone)]
pub struct RequestForwarder {
    bus: SharedBusClient,
    subject: String,
}

impl RequestForwarder {
    pub fn new(bus: SharedBusClient, subject: impl Into<String>) -> Self {
        Self {
            bus,
            subject: subject.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[instrument(name = "forward", skip_all, fields(subject = %self.subject))]
    pub async fn forward(&self, request: &NotificationRequest) -> Result<PublishReceipt, BusError> {
        let payload = to_value(request)?;
        self.bus.publish_value(&self.subject, payload).await
    }
}
