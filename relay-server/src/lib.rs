//! Stripe relay - verifies Stripe webhooks and forwards a simplified event.
//!
//! ## Architecture
//!
//! ```text
//! Stripe → Web Server → verify → allow-list → simplify → Forwarder → Destination
//! ```
//!
//! The forwarder follows downstream redirects itself so that every hop stays
//! a POST carrying the original body.

pub mod config;
pub mod error;
pub mod event;
pub mod forward;
pub mod relay;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::RelayError;
pub use event::{ForwardEnvelope, SimplifiedPayload, VerifiedEvent};
pub use forward::{deliver, ForwardOutcome, HttpTransport, Transport, MAX_HOPS};
pub use relay::{relay_webhook, Relayed};
pub use web::AppState;
