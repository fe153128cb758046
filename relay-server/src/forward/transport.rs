//! HTTP transport for downstream delivery.
//!
//! The transport performs exactly one POST per call and never follows
//! redirects itself; redirect handling lives in the forwarder.

use std::future::Future;
use std::time::Duration;

use reqwest::{header, redirect, Client};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

/// Upper bound on how much of a downstream response body is kept.
pub const MAX_RESPONSE_BODY_BYTES: usize = 64 * 1024;

/// A single request/response exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopResponse {
    pub status: u16,
    /// Raw `Location` header value, if any.
    pub location: Option<String>,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to downstream timed out")]
    Timeout,
    #[error("request to downstream failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// Sends one JSON POST and reports the raw response.
pub trait Transport {
    fn post(
        &self,
        url: &Url,
        body: &[u8],
    ) -> impl Future<Output = Result<HopResponse, TransportError>> + Send;
}

/// `reqwest` transport with redirects disabled.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport whose requests each time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(timeout)
            .user_agent(concat!("stripe-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn post(&self, url: &Url, body: &[u8]) -> Result<HopResponse, TransportError> {
        let mut response = self
            .client
            .post(url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.to_vec())
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "forward_request_error");
                TransportError::from(e)
            })?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Bounded read: stop buffering once the cap is reached.
        let mut buf = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let remaining = MAX_RESPONSE_BODY_BYTES - buf.len();
            if chunk.len() >= remaining {
                buf.extend_from_slice(&chunk[..remaining]);
                break;
            }
            buf.extend_from_slice(&chunk);
        }

        debug!(
            url = %url,
            status_code = status,
            body_length = buf.len(),
            has_location = location.is_some(),
            "forward_response_read"
        );

        Ok(HopResponse {
            status,
            location,
            body: String::from_utf8_lossy(&buf).into_owned(),
        })
    }
}
