//! Transport seam between the executor and the network.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::ClientError;
use crate::config::{ClientConfig, ConfigError};

/// Media type of merchant API v1 responses.
pub const ACCEPT_MERCHANT_V1: &str = "application/vnd.mcash.api.merchant.v1+json";

pub const MERCHANT_HEADER: &str = "X-Mcash-Merchant";
pub const USER_HEADER: &str = "X-Mcash-User";
pub const TESTBED_TOKEN_HEADER: &str = "X-Testbed-Token";

/// One request to the merchant API, replayable across retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    /// JSON body, already serialized.
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: Url) -> Self {
        Self::new(Method::PUT, url)
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }
}

/// Status and raw body of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Turn a non-2xx response into [`ClientError::Api`].
    pub fn error_for_status(self) -> Result<Self, ClientError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Api {
                status: self.status,
                body: self.body,
            })
        }
    }

    /// Check the status, then deserialize the body.
    pub fn parse<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let response = self.error_for_status()?;
        serde_json::from_str(&response.body).map_err(ClientError::Json)
    }
}

/// Sends a single request and returns whatever the server answered.
///
/// Implementations must not retry and must not treat any status code as an
/// error; only connection-level failures are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError>;
}

/// [`Transport`] backed by `reqwest`.
///
/// The authentication and content negotiation headers are assembled once
/// from the [`ClientConfig`] and attached to every request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    headers: HeaderMap,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            http: Client::new(),
            headers: default_headers(config)?,
        })
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(self.headers.clone());
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok(ApiResponse { status, body })
    }
}

/// Headers required on every merchant API request.
pub fn default_headers(config: &ClientConfig) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-mcash-merchant"),
        header_value(MERCHANT_HEADER, &config.merchant_id)?,
    );
    headers.insert(
        HeaderName::from_static("x-mcash-user"),
        header_value(USER_HEADER, &config.user_id)?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_MERCHANT_V1));
    let mut authorization = header_value("Authorization", &config.credentials.authorization())?;
    authorization.set_sensitive(true);
    headers.insert(AUTHORIZATION, authorization);
    if let Some(token) = &config.testbed_token {
        headers.insert(
            HeaderName::from_static("x-testbed-token"),
            header_value(TESTBED_TOKEN_HEADER, token)?,
        );
    }
    Ok(headers)
}

fn header_value(header: &'static str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeader { header })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, DEFAULT_BASE_URL};

    fn config() -> ClientConfig {
        ClientConfig::new(
            Url::parse(DEFAULT_BASE_URL).unwrap(),
            "merchant-1",
            "user-1",
            Credentials::secret("s3cr3t"),
            "pos-1",
            "ledger-1",
        )
        .unwrap()
    }

    #[test]
    fn test_default_headers() {
        let headers = default_headers(&config()).unwrap();
        assert_eq!(headers[MERCHANT_HEADER], "merchant-1");
        assert_eq!(headers[USER_HEADER], "user-1");
        assert_eq!(headers[ACCEPT], ACCEPT_MERCHANT_V1);
        assert_eq!(headers[AUTHORIZATION], "SECRET s3cr3t");
        assert!(headers.get(TESTBED_TOKEN_HEADER).is_none());
    }

    #[test]
    fn test_testbed_token_header() {
        let headers = default_headers(&config().with_testbed_token("tb-token")).unwrap();
        assert_eq!(headers[TESTBED_TOKEN_HEADER], "tb-token");
    }

    #[test]
    fn test_rejects_invalid_header_value() {
        let mut config = config();
        config.user_id = "bad\nuser".to_string();
        let err = default_headers(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeader { header } if header == USER_HEADER));
    }

    #[test]
    fn test_parse_checks_status() {
        let err = ApiResponse::new(StatusCode::FORBIDDEN, "nope")
            .parse::<serde_json::Value>()
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status, .. } if status == StatusCode::FORBIDDEN));

        let value: serde_json::Value = ApiResponse::new(StatusCode::OK, r#"{"id":"x"}"#)
            .parse()
            .unwrap();
        assert_eq!(value["id"], "x");
    }
}
