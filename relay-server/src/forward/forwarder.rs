//! Redirect-preserving delivery of envelopes.
//!
//! Redirects are followed by hand so every hop is re-sent as a POST with the
//! same body. Client-side redirect handling would turn a 302/303 into a GET
//! and drop the payload.

use tracing::{info, warn};
use url::Url;

use super::transport::{HopResponse, Transport};
use crate::error::RelayError;
use crate::event::ForwardEnvelope;

/// Maximum number of request/response exchanges per delivery.
pub const MAX_HOPS: usize = 5;

/// How much of the last response body goes into an exhaustion report.
const EXHAUSTED_BODY_CHARS: usize = 200;

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardOutcome {
    pub ok: bool,
    /// Final HTTP status, or 0 when the redirect limit was reached.
    pub status: u16,
    pub final_url: String,
    pub body: String,
    /// Redirects followed before the final response.
    pub hop_count: usize,
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// POST `envelope` to `url`, following up to `max_hops` exchanges.
///
/// Non-2xx responses and an exhausted redirect chain come back as an outcome
/// with `ok == false`; only transport failures are returned as errors.
pub async fn deliver<T: Transport>(
    transport: &T,
    url: &Url,
    envelope: &ForwardEnvelope,
    max_hops: usize,
) -> Result<ForwardOutcome, RelayError> {
    let body = serde_json::to_vec(envelope)
        .map_err(|e| RelayError::Internal(format!("failed to serialize envelope: {}", e)))?;

    let mut current = url.clone();
    let mut last: Option<HopResponse> = None;

    for hop in 0..max_hops {
        info!(
            event_id = %envelope.event_id,
            url = %current,
            hop = hop,
            "forward_hop"
        );

        let response = transport.post(&current, &body).await?;

        if (200..300).contains(&response.status) {
            info!(
                event_id = %envelope.event_id,
                status_code = response.status,
                final_url = %current,
                hops = hop,
                "forward_complete"
            );
            return Ok(ForwardOutcome {
                ok: true,
                status: response.status,
                final_url: current.to_string(),
                body: response.body,
                hop_count: hop,
            });
        }

        let next = if is_redirect(response.status) {
            response.location.as_deref().map(|loc| current.join(loc))
        } else {
            None
        };

        match next {
            Some(Ok(next)) => {
                info!(
                    event_id = %envelope.event_id,
                    status_code = response.status,
                    from = %current,
                    to = %next,
                    "forward_redirect"
                );
                current = next;
                last = Some(response);
            }
            Some(Err(e)) => {
                warn!(
                    event_id = %envelope.event_id,
                    status_code = response.status,
                    error = %e,
                    "forward_redirect_location_invalid"
                );
                return Ok(failure(response, &current, hop));
            }
            None => {
                warn!(
                    event_id = %envelope.event_id,
                    status_code = response.status,
                    url = %current,
                    "forward_rejected"
                );
                return Ok(failure(response, &current, hop));
            }
        }
    }

    let last_body = last.map(|r| r.body).unwrap_or_default();
    let truncated: String = last_body.chars().take(EXHAUSTED_BODY_CHARS).collect();

    warn!(
        event_id = %envelope.event_id,
        hops = max_hops,
        last_url = %current,
        "forward_exhausted"
    );

    Ok(ForwardOutcome {
        ok: false,
        status: 0,
        final_url: current.to_string(),
        body: format!(
            "redirect limit reached after {} hops; last response: {}",
            max_hops, truncated
        ),
        hop_count: max_hops,
    })
}

fn failure(response: HopResponse, url: &Url, hop: usize) -> ForwardOutcome {
    ForwardOutcome {
        ok: false,
        status: response.status,
        final_url: url.to_string(),
        body: response.body,
        hop_count: hop,
    }
}
