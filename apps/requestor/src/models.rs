use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound notification request. Forwarded to the queue as-is.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NotificationRequest {
    pub recipient: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl NotificationRequest {
    pub fn new(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            message: message.into(),
            subject: None,
            channel: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Checks the fields serde cannot: required text must not be blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.recipient.trim().is_empty() {
            return Err("recipient must not be empty".into());
        }
        if self.message.trim().is_empty() {
            return Err("message must not be empty".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QueuedResponse {
    pub message_id: String,
    pub status: String,
}

impl QueuedResponse {
    pub fn queued(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            status: "queued".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiError {
    pub detail: String,
}
