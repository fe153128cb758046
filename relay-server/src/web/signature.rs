//! Stripe webhook signature verification.
//!
//! Stripe signs webhook requests using HMAC-SHA256.
//! Reference: https://docs.stripe.com/webhooks#verify-manually

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::warn;

use crate::config::Config;
use crate::event::VerifiedEvent;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the Stripe signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Reasons a signed payload is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header is malformed: {0}")]
    MalformedHeader(&'static str),
    #[error("signature timestamp is outside the tolerance window")]
    Stale,
    #[error("no signature matches the payload")]
    Mismatch,
    #[error("signed payload is not a valid event: {0}")]
    InvalidPayload(String),
}

/// Verification strategy for inbound webhook payloads.
pub trait SignatureVerifier {
    /// Authenticate `payload` against `header` and parse it into an event.
    fn verify(&self, payload: &[u8], header: &str) -> Result<VerifiedEvent, SignatureError>;
}

/// Stripe's `t=<timestamp>,v1=<hex>` scheme.
pub struct StripeVerifier<'a> {
    secret: &'a str,
    tolerance_secs: u64,
}

impl<'a> StripeVerifier<'a> {
    /// `tolerance_secs` of 0 disables the replay window.
    pub fn new(secret: &'a str, tolerance_secs: u64) -> Self {
        Self {
            secret,
            tolerance_secs,
        }
    }

    /// Verifier for the configured signing secret, if one is set.
    pub fn from_config(config: &'a Config) -> Option<Self> {
        config
            .stripe_webhook_secret
            .as_deref()
            .map(|secret| Self::new(secret, config.signature_tolerance_secs))
    }

    /// Verify against an explicit clock, in Unix seconds.
    pub fn verify_at(
        &self,
        payload: &[u8],
        header: &str,
        now: i64,
    ) -> Result<VerifiedEvent, SignatureError> {
        let parsed = parse_header(header)?;

        if self.tolerance_secs > 0 {
            let age = now.abs_diff(parsed.timestamp);
            if age > self.tolerance_secs {
                warn!(
                    webhook_time = parsed.timestamp,
                    current_time = now,
                    age_seconds = age,
                    max_age_seconds = self.tolerance_secs,
                    "stripe_signature_stale"
                );
                return Err(SignatureError::Stale);
            }
        }

        let expected = expected_signature(self.secret, parsed.timestamp_raw, payload)?;

        // Any v1 entry may match; Stripe sends several while a secret is rolled.
        let matched = parsed.signatures.iter().any(|candidate| {
            hex::decode(candidate)
                .map(|bytes| bool::from(expected.as_slice().ct_eq(bytes.as_slice())))
                .unwrap_or(false)
        });

        if !matched {
            warn!(
                candidates = parsed.signatures.len(),
                "stripe_signature_mismatch"
            );
            return Err(SignatureError::Mismatch);
        }

        parse_event(payload)
    }
}

impl SignatureVerifier for StripeVerifier<'_> {
    fn verify(&self, payload: &[u8], header: &str) -> Result<VerifiedEvent, SignatureError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        self.verify_at(payload, header, now)
    }
}

struct ParsedHeader<'h> {
    timestamp: i64,
    timestamp_raw: &'h str,
    signatures: Vec<&'h str>,
}

fn parse_header(header: &str) -> Result<ParsedHeader<'_>, SignatureError> {
    let mut timestamp_raw = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp_raw = Some(value),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp_raw =
        timestamp_raw.ok_or(SignatureError::MalformedHeader("missing timestamp"))?;
    let timestamp = timestamp_raw
        .parse::<i64>()
        .map_err(|_| SignatureError::MalformedHeader("timestamp is not an integer"))?;

    if signatures.is_empty() {
        return Err(SignatureError::MalformedHeader("missing v1 signature"));
    }

    Ok(ParsedHeader {
        timestamp,
        timestamp_raw,
        signatures,
    })
}

/// HMAC-SHA256(secret, "<timestamp>.<payload>").
fn expected_signature(
    secret: &str,
    timestamp: &str,
    payload: &[u8],
) -> Result<Vec<u8>, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Mismatch)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn parse_event(payload: &[u8]) -> Result<VerifiedEvent, SignatureError> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| SignatureError::InvalidPayload(e.to_string()))?;

    let id = value
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| SignatureError::InvalidPayload("missing event id".to_string()))?;
    let event_type = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SignatureError::InvalidPayload("missing event type".to_string()))?;
    let object = value
        .get("data")
        .and_then(|data| data.get("object"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(Map::new);

    Ok(VerifiedEvent {
        id: id.to_string(),
        event_type: event_type.to_string(),
        object,
    })
}

/// Build a valid `Stripe-Signature` header for `payload`.
#[cfg(test)]
pub(crate) fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let signature = expected_signature(secret, &timestamp.to_string(), payload).unwrap();
    format!("t={},v1={}", timestamp, hex::encode(signature))
}
