//! Client configuration for the mCASH merchant API.
//!
//! A [`ClientConfig`] is built once and handed to every collaborator at
//! construction. It is never mutated afterwards, so several clients pointing
//! at different endpoints can live in one process.

mod credentials;

pub use credentials::{AuthMethod, Credentials};

use url::Url;

/// Production endpoint of the merchant API.
pub const DEFAULT_BASE_URL: &str = "https://api.mca.sh/merchant/v1";

/// Errors raised while building a [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid auth method {0:?}, only SECRET is supported")]
    UnsupportedAuthMethod(String),
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("base url {0} cannot carry a path")]
    OpaqueBaseUrl(Url),
    #[error("invalid header value for {header}")]
    InvalidHeader { header: &'static str },
}

/// Immutable configuration shared by the transport, the typed API and the
/// pollers.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the merchant API, e.g. `https://api.mca.sh/merchant/v1`.
    pub base_url: Url,
    /// Sent as `X-Mcash-Merchant`.
    pub merchant_id: String,
    /// Sent as `X-Mcash-User`.
    pub user_id: String,
    pub credentials: Credentials,
    /// Point-of-sale id attached to new payment requests.
    pub pos_id: String,
    /// Ledger that payment requests settle into and whose reports get closed.
    pub ledger: String,
    /// Sent as `X-Testbed-Token` when present.
    pub testbed_token: Option<String>,
}

impl ClientConfig {
    /// Create a configuration.
    ///
    /// * `base_url`: root of the merchant API (see [`DEFAULT_BASE_URL`]).
    /// * `credentials`: validated auth method and key.
    /// * `pos_id` / `ledger`: defaults attached to payment requests.
    pub fn new(
        base_url: Url,
        merchant_id: impl Into<String>,
        user_id: impl Into<String>,
        credentials: Credentials,
        pos_id: impl Into<String>,
        ledger: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::OpaqueBaseUrl(base_url));
        }
        Ok(Self {
            base_url,
            merchant_id: merchant_id.into(),
            user_id: user_id.into(),
            credentials,
            pos_id: pos_id.into(),
            ledger: ledger.into(),
            testbed_token: None,
        })
    }

    pub fn with_testbed_token(mut self, token: impl Into<String>) -> Self {
        self.testbed_token = Some(token.into());
        self
    }

    /// Build an absolute endpoint URL from a path relative to the API root.
    ///
    /// `path` must start with `/`. Unlike [`Url::join`], the base path is
    /// kept, so `/payment_request/` under `https://host/merchant/v1` becomes
    /// `https://host/merchant/v1/payment_request/`.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> Result<ClientConfig, ConfigError> {
        ClientConfig::new(
            Url::parse(base)?,
            "merchant",
            "user",
            Credentials::secret("key"),
            "pos",
            "ledger-1",
        )
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let config = config(DEFAULT_BASE_URL).unwrap();
        let url = config.endpoint("/payment_request/abc/outcome/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.mca.sh/merchant/v1/payment_request/abc/outcome/"
        );
    }

    #[test]
    fn test_endpoint_with_trailing_slash_base() {
        let config = config("https://testbed.example.com/merchant/v1/").unwrap();
        let url = config.endpoint("/ledger/").unwrap();
        assert_eq!(url.as_str(), "https://testbed.example.com/merchant/v1/ledger/");
    }

    #[test]
    fn test_rejects_opaque_base_url() {
        let result = config("mailto:someone@example.com");
        assert!(matches!(result, Err(ConfigError::OpaqueBaseUrl(_))));
    }
}
