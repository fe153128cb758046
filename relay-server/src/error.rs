//! Error taxonomy for the relay pipeline.
//!
//! Each variant maps to the status code that tells Stripe whether to retry:
//! 400 is a permanent rejection, 500 and 502 are retried.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::forward::TransportError;
use crate::web::signature::SignatureError;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("missing signature header")]
    MissingSignature,

    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("server misconfigured: {0} is not set")]
    ServerMisconfigured(&'static str),

    #[error("downstream responded with status {status}")]
    ForwardFailed { status: u16, body: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingSignature | RelayError::InvalidSignature(_) => {
                StatusCode::BAD_REQUEST
            }
            RelayError::ServerMisconfigured(_) | RelayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::ForwardFailed { .. } | RelayError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short plain-text body returned to the caller.
    pub fn response_text(&self) -> &'static str {
        match self {
            RelayError::MissingSignature => "missing signature",
            RelayError::InvalidSignature(_) => "invalid signature",
            RelayError::ServerMisconfigured(_) => "server misconfigured",
            RelayError::ForwardFailed { .. } | RelayError::Transport(_) => "forward failed",
            RelayError::Internal(_) => "internal error",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status_code(), self.response_text()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(RelayError::MissingSignature.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::InvalidSignature(SignatureError::Mismatch).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::ServerMisconfigured("FORWARD_URL").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RelayError::ForwardFailed { status: 0, body: String::new() }.status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            RelayError::Transport(TransportError::Timeout).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            RelayError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_response_text_has_no_detail() {
        let err = RelayError::ForwardFailed {
            status: 401,
            body: "shared secret rejected".to_string(),
        };
        assert_eq!(err.response_text(), "forward failed");
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
