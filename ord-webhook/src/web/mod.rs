//! Web server module for the inscription webhook.
//!
//! This module provides a thin web server that:
//! - Verifies the `ordinals-sig` HMAC over the raw body
//! - Hands the validated job to the inscription worker
//! - Returns 200 OK without waiting for the inscription
//!
//! Downloading and wallet commands happen in [`crate::worker`].

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    health, inscription_webhook, AppState, HealthResponse, WebhookError, WebhookRequest,
    WebhookResponse,
};
pub use signature::{compute_signature, verify_signature, SIGNATURE_HEADER};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(inscription_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
