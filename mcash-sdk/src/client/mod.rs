//! HTTP client for the mCASH merchant API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the wire objects do not pull in `reqwest`.
//!
//! Layers, from the wire up:
//!
//! - [`Transport`]: sends one request. [`HttpTransport`] is the reqwest
//!   implementation and owns the authentication headers.
//! - [`RequestExecutor`]: bounded retry on 5xx responses.
//! - [`MerchantApi`]: typed one-shot calls.

mod executor;
mod merchant;
mod transport;

pub use executor::{MAX_ATTEMPTS, RequestExecutor};
pub use merchant::MerchantApi;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};

pub use reqwest::{Method, StatusCode};

use crate::config::ConfigError;

/// Boxed transport failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by the SDK HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection-level failure (DNS, TLS, connection reset, …).
    #[error("network error: {0}")]
    Network(BoxError),

    /// The server kept answering 5xx until the retry budget ran out.
    #[error("server error after {attempts} attempts: status {status}, body: {body}")]
    TransientServer {
        status: StatusCode,
        body: String,
        attempts: u32,
    },

    /// The server returned a non-2xx, non-5xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// Response body could not be deserialized, or request body serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The endpoint URL could not be built.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Failures where the remote state is unknown and a later attempt may
    /// succeed unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_) | ClientError::TransientServer { .. }
        )
    }

    /// HTTP status attached to the error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::TransientServer { status, .. } | ClientError::Api { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let network = ClientError::Network("connection refused".into());
        assert!(network.is_transient());
        assert_eq!(network.status(), None);

        let server = ClientError::TransientServer {
            status: StatusCode::BAD_GATEWAY,
            body: String::new(),
            attempts: MAX_ATTEMPTS,
        };
        assert!(server.is_transient());

        let api = ClientError::Api {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert!(!api.is_transient());
        assert_eq!(api.status(), Some(StatusCode::NOT_FOUND));
    }
}
