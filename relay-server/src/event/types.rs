//! Event types for the relay pipeline.
//!
//! This module defines:
//! - `VerifiedEvent`: the authenticated form of an inbound Stripe event
//! - `SimplifiedPayload`: the compact view forwarded downstream
//! - `ForwardEnvelope`: the JSON document POSTed to the destination

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Type prefix that selects the invoice variant.
pub const INVOICE_PREFIX: &str = "invoice.";

/// A Stripe event whose signature has been checked.
///
/// Only the signature verifier constructs these.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedEvent {
    pub id: String,
    pub event_type: String,
    /// The event's `data.object`, kept untyped.
    pub object: Map<String, Value>,
}

/// Which simplified shape an event type maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Invoice,
    Generic,
}

impl EventKind {
    /// Classify an event type by its domain prefix.
    pub fn classify(event_type: &str) -> Self {
        if event_type.starts_with(INVOICE_PREFIX) {
            EventKind::Invoice
        } else {
            EventKind::Generic
        }
    }
}

/// Simplified event data sent downstream.
///
/// Serialized without a tag; the envelope's `type` tells the receiver which
/// shape to expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SimplifiedPayload {
    Invoice(InvoiceSummary),
    Generic(GenericSummary),
}

/// Billing-relevant fields of an invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub invoice_id: String,
    pub status: String,
    pub hosted_invoice_url: String,
    /// Major currency units; `None` when the source had no amount.
    pub amount_due: Option<f64>,
    pub currency: String,
    /// ISO-8601 UTC, empty when absent.
    pub created_at: String,
    /// ISO-8601 UTC, empty when absent.
    pub paid_at: String,
    pub customer: String,
    pub number: String,
    pub metadata: BTreeMap<String, String>,
}

/// Identifying fields of any non-invoice event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericSummary {
    pub raw_type: String,
    pub object_id: String,
    pub object_type: String,
}

/// Wire payload POSTed to the downstream endpoint.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardEnvelope {
    pub shared_secret: String,
    pub event_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: SimplifiedPayload,
}

// Debug output must not carry the shared secret into logs.
impl std::fmt::Debug for ForwardEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardEnvelope")
            .field("event_id", &self.event_id)
            .field("event_type", &self.event_type)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}
