use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    debug_handler,
    extract::{Extension, Json, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use credentials::{Credential, CredentialVerifier, bearer_from_headers};
use metrics::counter;
use requestor_bus::{BusError, PublishReceipt};
use serde_json::json;
use tracing::{error, info, warn};

use crate::forward::RequestForwarder;
use crate::models::{ApiError, NotificationRequest, QueuedResponse};
use crate::reqid::with_request_id;

/// Shared clients injected into every request.
#[derive(Clone)]
pub struct GatewayState {
    pub verifier: CredentialVerifier,
    pub forwarder: RequestForwarder,
}

impl GatewayState {
    pub fn new(verifier: CredentialVerifier, forwarder: RequestForwarder) -> Self {
        Self {
            verifier,
            forwarder,
        }
    }
}

/// Every way an intake request can end short of being queued.
#[derive(thiserror::Error, Debug)]
pub enum IntakeError {
    #[error("{}", .0.body_text())]
    InvalidBody(JsonRejection),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("JWT token required. Provide Authorization: Bearer <token> header.")]
    MissingCredential,
    #[error("Invalid or missing JWT token in database.")]
    InvalidCredential,
    #[error(transparent)]
    Forwarding(#[from] BusError),
}

impl IntakeError {
    pub fn status(&self) -> StatusCode {
        match self {
            IntakeError::InvalidBody(_) | IntakeError::InvalidRequest(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            IntakeError::MissingCredential | IntakeError::InvalidCredential => {
                StatusCode::UNAUTHORIZED
            }
            IntakeError::Forwarding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            IntakeError::InvalidBody(_) | IntakeError::InvalidRequest(_) => "invalid_request",
            IntakeError::MissingCredential => "missing_credential",
            IntakeError::InvalidCredential => "invalid_credential",
            IntakeError::Forwarding(_) => "forward_failed",
        }
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiError {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/request", post(submit_request))
        .layer(middleware::from_fn(with_request_id))
        .layer(Extension(Arc::new(state)))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

#[debug_handler]
async fn submit_request(
    Extension(state): Extension<Arc<GatewayState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<QueuedResponse>, IntakeError> {
    let result = match decode_request(&headers, &body) {
        Ok(request) => process_request(&state, bearer_from_headers(&headers), request).await,
        Err(err) => Err(err),
    };

    let outcome = match &result {
        Ok(_) => "queued",
        Err(err) => err.outcome(),
    };
    counter!("requestor_intake_total", "outcome" => outcome).increment(1);

    result.map(|receipt| Json(QueuedResponse::queued(receipt.message_id)))
}

/// Decodes the body as JSON. A missing `content-type` is parsed anyway; a
/// declared non-JSON type is rejected.
fn decode_request(headers: &HeaderMap, body: &[u8]) -> Result<NotificationRequest, IntakeError> {
    if let Some(content_type) = headers.get(CONTENT_TYPE) {
        if !is_json_content_type(content_type.to_str().unwrap_or_default()) {
            return Err(IntakeError::InvalidRequest(
                "Expected request with `Content-Type: application/json`".into(),
            ));
        }
    }
    let Json(request) =
        Json::<NotificationRequest>::from_bytes(body).map_err(IntakeError::InvalidBody)?;
    Ok(request)
}

fn is_json_content_type(value: &str) -> bool {
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Runs one request through the intake pipeline.
///
/// Validation happens before any credential work, a missing credential never
/// reaches the store, and only a verified request is forwarded.
pub async fn process_request(
    state: &GatewayState,
    credential: Option<Credential>,
    request: NotificationRequest,
) -> Result<PublishReceipt, IntakeError> {
    request.validate().map_err(IntakeError::InvalidRequest)?;

    let credential = credential.ok_or(IntakeError::MissingCredential)?;
    if !state.verifier.verify(&credential).await {
        warn!("rejected request with unverified credential");
        return Err(IntakeError::InvalidCredential);
    }

    let receipt = state.forwarder.forward(&request).await.map_err(|err| {
        error!(subject = %state.forwarder.subject(), error = %err, "failed to enqueue notification request");
        IntakeError::Forwarding(err)
    })?;

    info!(
        message_id = %receipt.message_id,
        payload = %serde_json::to_string(&request).unwrap_or_default(),
        "notification request queued"
    );
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use credentials::InMemoryCredentialStore;
    use requestor_bus::InMemoryBusClient;
    use tracing_test::traced_test;

    fn state(bus: Arc<InMemoryBusClient>) -> GatewayState {
        let store = InMemoryCredentialStore::with_credentials(["abc123"]);
        GatewayState::new(
            CredentialVerifier::new(Arc::new(store)),
            RequestForwarder::new(bus, "requestor.notifications"),
        )
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            IntakeError::MissingCredential.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            IntakeError::InvalidCredential.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            IntakeError::InvalidRequest("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        let forwarding = IntakeError::Forwarding(BusError::Publish(anyhow!("stream offline")));
        assert_eq!(forwarding.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(forwarding.to_string(), "stream offline");
    }

    #[test]
    fn json_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("Application/JSON; charset=utf-8"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type(""));
    }

    #[test]
    fn body_decoding_ignores_missing_content_type() {
        let headers = HeaderMap::new();
        let request = decode_request(&headers, br#"{"recipient":"u1","message":"hi"}"#).unwrap();
        assert_eq!(request, NotificationRequest::new("u1", "hi"));

        let err = decode_request(&headers, b"{not json").unwrap_err();
        assert!(matches!(err, IntakeError::InvalidBody(_)));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn credential_messages_differ() {
        assert_ne!(
            IntakeError::MissingCredential.to_string(),
            IntakeError::InvalidCredential.to_string()
        );
    }

    #[tokio::test]
    async fn absent_credential_short_circuits() {
        let bus = Arc::new(InMemoryBusClient::default());
        let err = process_request(&state(bus.clone()), None, NotificationRequest::new("u1", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::MissingCredential));
        assert!(bus.take_published().await.is_empty());
    }

    #[tokio::test]
    async fn invalid_request_is_checked_before_credentials() {
        let bus = Arc::new(InMemoryBusClient::default());
        let err = process_request(&state(bus.clone()), None, NotificationRequest::new("", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::InvalidRequest(_)));
    }

    #[tokio::test]
    #[traced_test]
    async fn success_writes_audit_log() {
        let bus = Arc::new(InMemoryBusClient::default());
        let receipt = process_request(
            &state(bus.clone()),
            Some(Credential::new("abc123")),
            NotificationRequest::new("u1", "hi"),
        )
        .await
        .unwrap();
        assert_eq!(receipt.message_id, "mem-1");
        assert!(logs_contain("notification request queued"));
        assert!(logs_contain("mem-1"));
        assert!(logs_contain(r#""recipient":"u1""#));
    }
}
