//! Allow-list filtering of event types.

use std::collections::HashSet;

/// Check whether an event type is in the configured allow-list.
///
/// Exact, case-sensitive match; no wildcards.
pub fn is_allowed(event_type: &str, allowed: &HashSet<String>) -> bool {
    allowed.contains(event_type)
}
