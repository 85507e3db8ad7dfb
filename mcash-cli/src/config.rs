//! TOML configuration of the command line client.
//!
//! Maps `mcash.toml` onto the SDK's [`ClientConfig`]:
//!
//! ```toml
//! [api]
//! base_url = "https://api.mca.sh/merchant/v1"
//! testbed_token = "..."
//!
//! [merchant]
//! merchant_id = "..."
//! user_id = "..."
//! auth_method = "SECRET"
//! secret = "..."
//!
//! [pos]
//! pos_id = "..."
//! ledger = "..."
//! ```

use std::path::Path;

use mcash_sdk::config::{
    ClientConfig, ConfigError as SdkConfigError, Credentials, DEFAULT_BASE_URL,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("invalid client configuration: {0}")]
    ClientError(#[from] SdkConfigError),
}

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api: ApiConfig,
    pub merchant: MerchantConfig,
    pub pos: PosConfig,
}

/// API endpoint section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as `X-Testbed-Token` when talking to the test environment.
    #[serde(default)]
    pub testbed_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            testbed_token: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Merchant identity and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantConfig {
    pub merchant_id: String,
    pub user_id: String,
    #[serde(default = "default_auth_method")]
    pub auth_method: String,
    pub secret: String,
}

fn default_auth_method() -> String {
    "SECRET".to_string()
}

/// Point of sale the client acts for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosConfig {
    pub pos_id: String,
    pub ledger: String,
}

impl FileConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate and convert into the client configuration.
    pub fn into_client_config(self) -> Result<ClientConfig, ConfigError> {
        let base_url = Url::parse(&self.api.base_url).map_err(SdkConfigError::from)?;
        let credentials = Credentials::parse(&self.merchant.auth_method, self.merchant.secret)?;
        let config = ClientConfig::new(
            base_url,
            self.merchant.merchant_id,
            self.merchant.user_id,
            credentials,
            self.pos.pos_id,
            self.pos.ledger,
        )?;
        Ok(match self.api.testbed_token {
            Some(token) => config.with_testbed_token(token),
            None => config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[merchant]
merchant_id = "shop"
user_id = "till"
secret = "s3cret"

[pos]
pos_id = "pos-1"
ledger = "ledger-1"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let file: FileConfig = toml::from_str(MINIMAL).unwrap();
        assert_eq!(file.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(file.merchant.auth_method, "SECRET");

        let config = file.into_client_config().unwrap();
        assert_eq!(config.base_url.as_str(), "https://api.mca.sh/merchant/v1");
        assert_eq!(config.ledger, "ledger-1");
        assert_eq!(config.testbed_token, None);
    }

    #[test]
    fn test_full_config() {
        let toml_str = r#"
[api]
base_url = "https://mcashtestbed.appspot.com/merchant/v1/"
testbed_token = "tb-token"

[merchant]
merchant_id = "shop"
user_id = "till"
auth_method = "SECRET"
secret = "s3cret"

[pos]
pos_id = "pos-1"
ledger = "ledger-1"
"#;
        let config = toml::from_str::<FileConfig>(toml_str)
            .unwrap()
            .into_client_config()
            .unwrap();
        assert_eq!(config.testbed_token.as_deref(), Some("tb-token"));
        assert_eq!(config.credentials.authorization(), "SECRET s3cret");
    }

    #[test]
    fn test_unsupported_auth_method() {
        let toml_str = MINIMAL.replace("secret = \"s3cret\"", "auth_method = \"RSA\"\nsecret = \"k\"");
        let err = toml::from_str::<FileConfig>(&toml_str)
            .unwrap()
            .into_client_config()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ClientError(SdkConfigError::UnsupportedAuthMethod(_))
        ));
    }

    #[test]
    fn test_invalid_base_url() {
        let toml_str = format!("[api]\nbase_url = \"not a url\"\n{MINIMAL}");
        let err = toml::from_str::<FileConfig>(&toml_str)
            .unwrap()
            .into_client_config()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ClientError(SdkConfigError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_missing_section_fails() {
        assert!(toml::from_str::<FileConfig>("[merchant]\nmerchant_id = \"x\"").is_err());
    }
}
