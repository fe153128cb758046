//! Reduce a verified Stripe event to the fields downstream billing needs.
//!
//! Every source field is optional. Missing or mistyped values fall back to a
//! default so that simplification never fails:
//! - text fields become `""`
//! - `amount_due` becomes `None`
//! - timestamps become `""`
//! - `metadata` becomes an empty map

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat};
use serde_json::{Map, Value};

use super::types::{EventKind, GenericSummary, InvoiceSummary, SimplifiedPayload, VerifiedEvent};

/// Simplify a verified event into the variant selected by its type.
pub fn simplify(event: &VerifiedEvent) -> SimplifiedPayload {
    match EventKind::classify(&event.event_type) {
        EventKind::Invoice => SimplifiedPayload::Invoice(simplify_invoice(&event.object)),
        EventKind::Generic => SimplifiedPayload::Generic(GenericSummary {
            raw_type: event.event_type.clone(),
            object_id: text(&event.object, "id"),
            object_type: text(&event.object, "object"),
        }),
    }
}

fn simplify_invoice(invoice: &Map<String, Value>) -> InvoiceSummary {
    let paid_at = invoice
        .get("status_transitions")
        .and_then(Value::as_object)
        .map(|transitions| timestamp(transitions, "paid_at"))
        .unwrap_or_default();

    InvoiceSummary {
        invoice_id: text(invoice, "id"),
        status: text(invoice, "status"),
        hosted_invoice_url: text(invoice, "hosted_invoice_url"),
        amount_due: minor_to_major(invoice, "amount_due"),
        currency: text(invoice, "currency"),
        created_at: timestamp(invoice, "created"),
        paid_at,
        customer: customer_id(invoice),
        number: text(invoice, "number"),
        metadata: metadata(invoice),
    }
}

/// String field, or `""` when absent or not a string.
fn text(object: &Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Unix seconds rendered as `YYYY-MM-DDTHH:MM:SS.sssZ`, or `""`.
fn timestamp(object: &Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Integer minor units (cents) converted to major units.
fn minor_to_major(object: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = object.get(key)?;
    value
        .as_i64()
        .map(|cents| cents as f64 / 100.0)
        .or_else(|| value.as_f64().map(|cents| cents / 100.0))
}

/// `customer` is either an id or, when expanded, a customer object.
fn customer_id(invoice: &Map<String, Value>) -> String {
    match invoice.get("customer") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Object(customer)) => text(customer, "id"),
        _ => String::new(),
    }
}

fn metadata(object: &Map<String, Value>) -> BTreeMap<String, String> {
    let Some(entries) = object.get("metadata").and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    entries
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(event_type: &str, object: Value) -> VerifiedEvent {
        VerifiedEvent {
            id: "evt_test".to_string(),
            event_type: event_type.to_string(),
            object: object.as_object().cloned().unwrap_or_default(),
        }
    }

    fn invoice(payload: &SimplifiedPayload) -> &InvoiceSummary {
        match payload {
            SimplifiedPayload::Invoice(summary) => summary,
            other => panic!("expected invoice variant, got {:?}", other),
        }
    }

    #[test]
    fn test_simplify_full_invoice() {
        let event = event(
            "invoice.paid",
            json!({
                "id": "in_123",
                "object": "invoice",
                "status": "paid",
                "hosted_invoice_url": "https://invoice.stripe.com/i/in_123",
                "amount_due": 1050,
                "currency": "usd",
                "created": 1700000000,
                "status_transitions": { "paid_at": 1700003600 },
                "customer": "cus_42",
                "number": "ABC-0001",
                "metadata": { "plan": "pro", "seats": 5, "trial": false, "nested": {} }
            }),
        );

        let payload = simplify(&event);
        let summary = invoice(&payload);

        assert_eq!(summary.invoice_id, "in_123");
        assert_eq!(summary.status, "paid");
        assert_eq!(summary.hosted_invoice_url, "https://invoice.stripe.com/i/in_123");
        assert_eq!(summary.amount_due, Some(10.5));
        assert_eq!(summary.currency, "usd");
        assert_eq!(summary.created_at, "2023-11-14T22:13:20.000Z");
        assert_eq!(summary.paid_at, "2023-11-14T23:13:20.000Z");
        assert_eq!(summary.customer, "cus_42");
        assert_eq!(summary.number, "ABC-0001");
        assert_eq!(summary.metadata.get("plan").map(String::as_str), Some("pro"));
        assert_eq!(summary.metadata.get("seats").map(String::as_str), Some("5"));
        assert_eq!(summary.metadata.get("trial").map(String::as_str), Some("false"));
        assert!(!summary.metadata.contains_key("nested"));
    }

    #[test]
    fn test_simplify_empty_invoice_defaults() {
        let payload = simplify(&event("invoice.payment_failed", json!({})));
        let summary = invoice(&payload);

        assert_eq!(summary.invoice_id, "");
        assert_eq!(summary.amount_due, None);
        assert_eq!(summary.created_at, "");
        assert_eq!(summary.paid_at, "");
        assert_eq!(summary.customer, "");
        assert!(summary.metadata.is_empty());
    }

    #[test]
    fn test_simplify_zero_amount_is_not_null() {
        let payload = simplify(&event("invoice.paid", json!({ "amount_due": 0 })));
        assert_eq!(invoice(&payload).amount_due, Some(0.0));
    }

    #[test]
    fn test_simplify_mistyped_fields_degrade() {
        let payload = simplify(&event(
            "invoice.paid",
            json!({
                "id": 17,
                "amount_due": "1050",
                "created": "yesterday",
                "status_transitions": "paid",
                "metadata": ["a", "b"],
                "customer": null
            }),
        ));
        let summary = invoice(&payload);

        assert_eq!(summary.invoice_id, "");
        assert_eq!(summary.amount_due, None);
        assert_eq!(summary.created_at, "");
        assert_eq!(summary.paid_at, "");
        assert_eq!(summary.customer, "");
        assert!(summary.metadata.is_empty());
    }

    #[test]
    fn test_simplify_expanded_customer() {
        let payload = simplify(&event(
            "invoice.paid",
            json!({ "customer": { "id": "cus_9", "object": "customer" } }),
        ));
        assert_eq!(invoice(&payload).customer, "cus_9");
    }

    #[test]
    fn test_simplify_null_paid_at() {
        let payload = simplify(&event(
            "invoice.finalized",
            json!({ "status_transitions": { "paid_at": null } }),
        ));
        assert_eq!(invoice(&payload).paid_at, "");
    }

    #[test]
    fn test_simplify_generic_event() {
        let payload = simplify(&event(
            "customer.subscription.updated",
            json!({ "id": "sub_1", "object": "subscription", "status": "active" }),
        ));

        assert_eq!(
            payload,
            SimplifiedPayload::Generic(GenericSummary {
                raw_type: "customer.subscription.updated".to_string(),
                object_id: "sub_1".to_string(),
                object_type: "subscription".to_string(),
            })
        );
    }

    #[test]
    fn test_simplify_is_deterministic() {
        let event = event(
            "invoice.paid",
            json!({ "id": "in_1", "amount_due": 999, "metadata": { "b": "2", "a": "1" } }),
        );

        let first = simplify(&event);
        let second = simplify(&event);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
