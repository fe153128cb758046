//! Request orchestration.
//!
//! Runs one inbound webhook through the pipeline:
//!
//! ```text
//! signature → verify → allow-list → simplify → deliver
//! ```
//!
//! The first step that fails decides the response; nothing is retried here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::RelayError;
use crate::event::{is_allowed, simplify, ForwardEnvelope};
use crate::forward::{deliver, ForwardOutcome, Transport, MAX_HOPS};
use crate::web::signature::SignatureVerifier;

/// Successful terminal states of a relayed webhook.
#[derive(Debug)]
pub enum Relayed {
    /// Downstream accepted the envelope.
    Delivered(ForwardOutcome),
    /// The event type is not on the allow-list.
    Ignored { event_type: String },
}

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        match self {
            Relayed::Delivered(_) => (StatusCode::OK, "delivered").into_response(),
            Relayed::Ignored { .. } => (StatusCode::OK, "ignored").into_response(),
        }
    }
}

/// Verify, filter, simplify and forward one webhook.
///
/// `body` must be the exact bytes received; `signature` is the raw
/// signature header value. `verifier` is `None` when no signing secret is
/// configured.
pub async fn relay_webhook<V: SignatureVerifier, T: Transport>(
    config: &Config,
    verifier: Option<&V>,
    transport: &T,
    signature: Option<&str>,
    body: &[u8],
) -> Result<Relayed, RelayError> {
    let signature = signature.ok_or_else(|| {
        warn!("stripe_signature_missing");
        RelayError::MissingSignature
    })?;

    let verifier = verifier.ok_or(RelayError::ServerMisconfigured("STRIPE_WEBHOOK_SECRET"))?;

    let event = verifier
        .verify(body, signature)
        .map_err(|e| {
            warn!(error = %e, body_length = body.len(), "stripe_signature_invalid");
            RelayError::from(e)
        })?;

    info!(
        event_id = %event.id,
        event_type = %event.event_type,
        "stripe_event_verified"
    );

    if !is_allowed(&event.event_type, &config.allowed_event_types) {
        info!(
            event_id = %event.id,
            event_type = %event.event_type,
            "stripe_event_ignored"
        );
        return Ok(Relayed::Ignored {
            event_type: event.event_type,
        });
    }

    let url = config
        .forward_url
        .as_ref()
        .ok_or(RelayError::ServerMisconfigured("FORWARD_URL"))?;
    let shared_secret = config
        .forward_shared_secret
        .as_deref()
        .ok_or(RelayError::ServerMisconfigured("FORWARD_SHARED_SECRET"))?;

    let envelope = ForwardEnvelope {
        shared_secret: shared_secret.to_string(),
        event_id: event.id.clone(),
        event_type: event.event_type.clone(),
        data: simplify(&event),
    };

    let outcome = deliver(transport, url, &envelope, MAX_HOPS).await?;

    if outcome.ok {
        Ok(Relayed::Delivered(outcome))
    } else {
        warn!(
            event_id = %event.id,
            status_code = outcome.status,
            final_url = %outcome.final_url,
            hops = outcome.hop_count,
            response = %truncate(&outcome.body, LOGGED_BODY_CHARS),
            "forward_failed"
        );
        Err(RelayError::ForwardFailed {
            status: outcome.status,
            body: outcome.body,
        })
    }
}

/// How much of a rejected downstream body is logged.
const LOGGED_BODY_CHARS: usize = 200;

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
