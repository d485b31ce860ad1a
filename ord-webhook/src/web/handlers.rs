//! Webhook endpoint handlers.
//!
//! The webhook handler only:
//! 1. Verifies the `ordinals-sig` signature over the raw body
//! 2. Validates the body into an [`InscriptionJob`]
//! 3. Enqueues the job and returns immediately
//!
//! A 200 means the job was accepted, not that it succeeded. Download and
//! wallet failures happen later and only show up in the logs.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::queue::{DispatchError, Dispatcher, InscriptionJob, InvalidJob};
use crate::web::signature::{verify_signature, SIGNATURE_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: Config, dispatcher: Dispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Inscription Webhook
// =============================================================================

/// JSON body of `POST /webhook`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    pub file_url: String,
    pub fee_rate: f64,
    pub address: String,
}

/// Webhook response body.
#[derive(Debug, Serialize, PartialEq)]
pub struct WebhookResponse {
    pub result: String,
}

impl WebhookResponse {
    fn ok() -> Self {
        Self {
            result: "OK".to_string(),
        }
    }

    fn error() -> Self {
        Self {
            result: "Error".to_string(),
        }
    }
}

/// Ways a webhook call can fail before the job is accepted.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature missing or wrong.
    #[error("invalid signature")]
    Unauthorized,

    /// Body is not the expected JSON shape.
    #[error("invalid body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// Body parsed but a field failed validation.
    #[error("invalid job: {0}")]
    InvalidJob(#[from] InvalidJob),

    /// The worker is gone.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        match self {
            WebhookError::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookResponse::error()),
            )
                .into_response(),
        }
    }
}

/// Inscription webhook endpoint.
///
/// # Response
///
/// - 200 `{"result":"OK"}`: job enqueued
/// - 401 (empty): missing or invalid `ordinals-sig`
/// - 500 `{"result":"Error"}`: body invalid or worker unavailable
pub async fn inscription_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    info!(
        has_signature = signature.is_some(),
        body_length = body.len(),
        "webhook_received"
    );

    // Nothing is parsed or fetched until the signature checks out.
    if !verify_signature(signature, &body, state.config.ordinals_secret.as_bytes()) {
        warn!("webhook_signature_invalid");
        return Err(WebhookError::Unauthorized);
    }

    let job = parse_job(&body).map_err(|e| {
        error!(error = %e, "webhook_setup_failed");
        e
    })?;

    let job_id = job.job_id;
    state.dispatcher.dispatch(job).map_err(|e| {
        error!(job_id = %job_id, error = %e, "webhook_dispatch_failed");
        WebhookError::from(e)
    })?;

    info!(job_id = %job_id, "webhook_accepted");

    Ok(Json(WebhookResponse::ok()))
}

fn parse_job(body: &[u8]) -> Result<InscriptionJob, WebhookError> {
    let request: WebhookRequest = serde_json::from_slice(body)?;
    Ok(InscriptionJob::new(
        &request.file_url,
        request.fee_rate,
        request.address,
    )?)
}
