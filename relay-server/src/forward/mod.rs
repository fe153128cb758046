//! Downstream delivery module.
//!
//! This module provides:
//! - `Transport`: a single JSON POST, with `HttpTransport` as the real client
//! - `deliver()`: the redirect loop that keeps POST and the body on every hop

pub mod forwarder;
pub mod transport;

pub use forwarder::{deliver, ForwardOutcome, MAX_HOPS};
pub use transport::{HopResponse, HttpTransport, Transport, TransportError};
