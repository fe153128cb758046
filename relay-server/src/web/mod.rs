//! Web server module for handling inbound Stripe webhooks.
//!
//! This module provides:
//! - The axum router with health and webhook routes
//! - Stripe signature verification over the raw request body

pub mod handlers;
pub mod signature;

pub use handlers::{health, router, stripe_webhook, AppState};
pub use signature::{SignatureError, SignatureVerifier, StripeVerifier, SIGNATURE_HEADER};
