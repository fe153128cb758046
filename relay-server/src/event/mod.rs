//! Event handling module.
//!
//! Once a webhook is authenticated, its event flows through:
//!
//! ```text
//! VerifiedEvent → is_allowed() → simplify() → ForwardEnvelope
//! ```

pub mod filter;
pub mod simplify;
pub mod types;

pub use filter::is_allowed;
pub use simplify::simplify;
pub use types::{
    EventKind, ForwardEnvelope, GenericSummary, InvoiceSummary, SimplifiedPayload, VerifiedEvent,
    INVOICE_PREFIX,
};
