//! Merchant API credentials.

use std::fmt;
use std::str::FromStr;

use super::ConfigError;

/// Authorization scheme of the merchant API.
///
/// The API only accepts the `SECRET` scheme; anything else is rejected while
/// the configuration is built rather than on the first request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    Secret,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Secret => "SECRET",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SECRET" => Ok(AuthMethod::Secret),
            other => Err(ConfigError::UnsupportedAuthMethod(other.to_owned())),
        }
    }
}

/// Auth method plus key, rendered into the `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub method: AuthMethod,
    key: String,
}

impl Credentials {
    /// Credentials using the `SECRET` scheme.
    pub fn secret(key: impl Into<String>) -> Self {
        Self {
            method: AuthMethod::Secret,
            key: key.into(),
        }
    }

    /// Parse the method name as given in configuration files.
    pub fn parse(method: &str, key: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            method: method.parse()?,
            key: key.into(),
        })
    }

    /// Value of the `Authorization` header, e.g. `SECRET abc123`.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.method, self.key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("method", &self.method)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_header() {
        let credentials = Credentials::parse("SECRET", "abc123").unwrap();
        assert_eq!(credentials.authorization(), "SECRET abc123");
    }

    #[test]
    fn test_rejects_other_methods() {
        let err = Credentials::parse("RSA", "abc123").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedAuthMethod(m) if m == "RSA"));
        assert!("secret".parse::<AuthMethod>().is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", Credentials::secret("top-secret"));
        assert!(!rendered.contains("top-secret"));
    }
}
