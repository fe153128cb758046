//! Webhook endpoint handlers.
//!
//! The Stripe handler keeps the request body as raw bytes; the signature
//! covers those exact bytes, so nothing may parse or re-encode them first.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::error::RelayError;
use crate::forward::HttpTransport;
use crate::relay::relay_webhook;
use crate::web::signature::{SignatureError, StripeVerifier, SIGNATURE_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub transport: HttpTransport,
}

impl AppState {
    pub fn new(config: Config, transport: HttpTransport) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }
}

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/stripe-webhook", post(stripe_webhook))
        .route("/webhooks/stripe", post(stripe_webhook))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check endpoint.
pub async fn health() -> &'static str {
    "ok"
}

// =============================================================================
// Stripe Webhook
// =============================================================================

/// Stripe webhook endpoint.
///
/// This endpoint:
/// 1. Verifies the `Stripe-Signature` header against the raw body
/// 2. Drops event types outside the allow-list with 200
/// 3. Forwards the simplified event and answers 200, or 502 if that fails
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    info!(
        body_length = body.len(),
        has_signature = headers.contains_key(SIGNATURE_HEADER),
        "stripe_webhook_received"
    );

    let signature = match headers.get(SIGNATURE_HEADER).map(|v| v.to_str()) {
        None => None,
        Some(Ok(value)) => Some(value),
        Some(Err(_)) => {
            warn!("stripe_signature_not_ascii");
            return RelayError::InvalidSignature(SignatureError::MalformedHeader(
                "header is not visible ASCII",
            ))
            .into_response();
        }
    };

    let verifier = StripeVerifier::from_config(&state.config);
    let result = relay_webhook(
        &state.config,
        verifier.as_ref(),
        &state.transport,
        signature,
        &body,
    )
    .await;

    match result {
        Ok(relayed) => relayed.into_response(),
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                error!(error = %e, status_code = status.as_u16(), "stripe_webhook_failed");
            } else {
                warn!(error = %e, status_code = status.as_u16(), "stripe_webhook_rejected");
            }
            e.into_response()
        }
    }
}
