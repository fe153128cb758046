//! Configuration module for environment variable parsing.
//!
//! Configuration is read once at start-up. Missing values are reported but do
//! not stop the process; each request checks what it needs at first use.

use std::collections::HashSet;
use std::env;

use tracing::warn;
use url::Url;

/// Event types forwarded when `ALLOWED_EVENT_TYPES` is not set.
pub const DEFAULT_ALLOWED_EVENT_TYPES: &[&str] = &[
    "invoice.paid",
    "invoice.payment_succeeded",
    "invoice.payment_failed",
];

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Stripe endpoint signing secret (`whsec_...`)
    pub stripe_webhook_secret: Option<String>,

    /// Downstream destination for simplified events
    pub forward_url: Option<Url>,

    /// Secret sent downstream in every envelope
    pub forward_shared_secret: Option<String>,

    /// Event types that are forwarded; everything else is acknowledged and dropped
    pub allowed_event_types: HashSet<String>,

    /// Maximum age in seconds for a signature timestamp, 0 disables the check
    pub signature_tolerance_secs: u64,

    /// Per-hop timeout for downstream requests in milliseconds
    pub forward_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            stripe_webhook_secret: None,
            forward_url: None,
            forward_shared_secret: None,
            allowed_event_types: DEFAULT_ALLOWED_EVENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            signature_tolerance_secs: 300, // 5 minutes, matches Stripe's libraries
            forward_timeout_ms: 10_000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),

            stripe_webhook_secret: non_blank("STRIPE_WEBHOOK_SECRET"),

            forward_url: non_blank("FORWARD_URL").and_then(|raw| match Url::parse(&raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(env_var = "FORWARD_URL", error = %e, "Invalid URL, treating as unset");
                    None
                }
            }),

            forward_shared_secret: non_blank("FORWARD_SHARED_SECRET"),

            allowed_event_types: parse_csv("ALLOWED_EVENT_TYPES")
                .map(|types| types.into_iter().collect())
                .unwrap_or(defaults.allowed_event_types),

            signature_tolerance_secs: env::var("STRIPE_SIGNATURE_TOLERANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.signature_tolerance_secs),

            forward_timeout_ms: env::var("FORWARD_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.forward_timeout_ms),
        }
    }

    /// Warn about every required value that is missing.
    ///
    /// Requests needing a missing value are answered with 500 until it is set.
    pub fn log_missing(&self) {
        if self.stripe_webhook_secret.is_none() {
            warn!(env_var = "STRIPE_WEBHOOK_SECRET", "config_value_missing");
        }
        if self.forward_url.is_none() {
            warn!(env_var = "FORWARD_URL", "config_value_missing");
        }
        if self.forward_shared_secret.is_none() {
            warn!(env_var = "FORWARD_SHARED_SECRET", "config_value_missing");
        }
        if self.allowed_event_types.is_empty() {
            warn!(env_var = "ALLOWED_EVENT_TYPES", "allow_list_empty_all_events_ignored");
        }
    }
}

fn non_blank(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        env::set_var("TEST_RELAY_CSV", "invoice.paid, invoice.voided,, ");
        let result = parse_csv("TEST_RELAY_CSV");
        assert_eq!(
            result,
            Some(vec!["invoice.paid".to_string(), "invoice.voided".to_string()])
        );
        env::remove_var("TEST_RELAY_CSV");
    }

    #[test]
    fn test_parse_csv_unset() {
        assert_eq!(parse_csv("TEST_RELAY_CSV_NONEXISTENT"), None);
    }

    #[test]
    fn test_non_blank() {
        env::set_var("TEST_RELAY_BLANK", "   ");
        assert_eq!(non_blank("TEST_RELAY_BLANK"), None);
        env::set_var("TEST_RELAY_BLANK", " value ");
        assert_eq!(non_blank("TEST_RELAY_BLANK"), Some("value".to_string()));
        env::remove_var("TEST_RELAY_BLANK");
    }

    // Only test allowed to set the real variable names.
    #[test]
    fn test_from_env() {
        env::set_var("FORWARD_URL", "not a url");
        env::set_var("ALLOWED_EVENT_TYPES", "customer.created, invoice.voided,");
        env::set_var("STRIPE_SIGNATURE_TOLERANCE", "soon");
        env::set_var("FORWARD_TIMEOUT_MS", "-5");
        env::set_var("FORWARD_SHARED_SECRET", "  ");

        let config = Config::from_env();
        assert!(config.forward_url.is_none());
        assert!(config.forward_shared_secret.is_none());
        assert_eq!(config.allowed_event_types.len(), 2);
        assert!(config.allowed_event_types.contains("customer.created"));
        assert!(config.allowed_event_types.contains("invoice.voided"));
        assert!(!config.allowed_event_types.contains("invoice.paid"));
        assert_eq!(config.signature_tolerance_secs, 300);
        assert_eq!(config.forward_timeout_ms, 10_000);

        env::set_var("FORWARD_URL", "https://billing.example.com/stripe");
        env::set_var("STRIPE_SIGNATURE_TOLERANCE", "0");
        env::set_var("FORWARD_TIMEOUT_MS", "2500");

        let config = Config::from_env();
        assert_eq!(
            config.forward_url.as_ref().map(Url::as_str),
            Some("https://billing.example.com/stripe")
        );
        assert_eq!(config.signature_tolerance_secs, 0);
        assert_eq!(config.forward_timeout_ms, 2500);

        for name in [
            "FORWARD_URL",
            "ALLOWED_EVENT_TYPES",
            "STRIPE_SIGNATURE_TOLERANCE",
            "FORWARD_TIMEOUT_MS",
            "FORWARD_SHARED_SECRET",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_default_allow_list() {
        let config = Config::default();
        assert_eq!(config.allowed_event_types.len(), 3);
        assert!(config.allowed_event_types.contains("invoice.paid"));
        assert!(config.allowed_event_types.contains("invoice.payment_succeeded"));
        assert!(config.allowed_event_types.contains("invoice.payment_failed"));
        assert!(config.forward_url.is_none());
    }
}
