//! Typed one-shot calls against the merchant API.
//!
//! Every method issues one logical request through the [`RequestExecutor`]
//! (so 5xx answers are retried) and returns a typed result. Non-2xx answers
//! surface as [`ClientError::Api`].

use std::sync::Arc;

use tracing::warn;
use url::Url;

use super::{ApiRequest, ClientError, HttpTransport, RequestExecutor, Transport};
use crate::config::ClientConfig;
use crate::objects::payment_request::{CreatePaymentRequest, UpdatePaymentRequest};
use crate::objects::{
    LedgerDetail, LedgerOverview, NewPaymentRequest, NewShortlink, PaymentAction,
    PaymentRequestOutcome, ReportInfo, ResourceId, ShortlinkLastScan,
};

/// Typed HTTP client for the merchant API.
///
/// Cheap to clone; clones share the configuration and the transport.
#[derive(Debug, Clone)]
pub struct MerchantApi {
    config: Arc<ClientConfig>,
    executor: RequestExecutor,
}

impl MerchantApi {
    /// Create a client sending requests with `reqwest`.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client on top of a custom [`Transport`].
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            executor: RequestExecutor::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `POST /payment_request/`: open a sale on the configured POS and
    /// ledger.
    pub async fn create_payment_request(
        &self,
        request: &NewPaymentRequest,
    ) -> Result<ResourceId, ClientError> {
        let url = self.config.endpoint("/payment_request/")?;
        let body = CreatePaymentRequest::sale(request, &self.config.pos_id, &self.config.ledger);
        let request = ApiRequest::post(url).json(&body)?;
        self.executor.execute(&request).await?.parse()
    }

    /// `GET /payment_request/{tid}/outcome/`: current outcome of a payment
    /// request.
    pub async fn get_payment_request_outcome(
        &self,
        ticket_id: &str,
    ) -> Result<PaymentRequestOutcome, ClientError> {
        let url = self.config.endpoint(&format!(
            "/payment_request/{}/outcome/",
            urlencoding::encode(ticket_id)
        ))?;
        self.executor.execute(&ApiRequest::get(url)).await?.parse()
    }

    /// `PUT /payment_request/{tid}/` with action `capture`.
    pub async fn capture_payment_request(
        &self,
        ticket_id: &str,
        callback_uri: Option<&str>,
    ) -> Result<(), ClientError> {
        self.update_payment_request(ticket_id, PaymentAction::Capture, callback_uri)
            .await
    }

    /// `PUT /payment_request/{tid}/` with action `abort`.
    pub async fn abort_payment_request(
        &self,
        ticket_id: &str,
        callback_uri: Option<&str>,
    ) -> Result<(), ClientError> {
        self.update_payment_request(ticket_id, PaymentAction::Abort, callback_uri)
            .await
    }

    async fn update_payment_request(
        &self,
        ticket_id: &str,
        action: PaymentAction,
        callback_uri: Option<&str>,
    ) -> Result<(), ClientError> {
        let url = self.config.endpoint(&format!(
            "/payment_request/{}/",
            urlencoding::encode(ticket_id)
        ))?;
        let body = UpdatePaymentRequest {
            action,
            ledger: &self.config.ledger,
            callback_uri,
        };
        let request = ApiRequest::put(url).json(&body)?;
        self.executor.execute(&request).await?.error_for_status()?;
        Ok(())
    }

    /// `POST /shortlink/`: register a new shortlink.
    pub async fn create_shortlink(&self, shortlink: &NewShortlink) -> Result<ResourceId, ClientError> {
        let url = self.config.endpoint("/shortlink/")?;
        let request = ApiRequest::post(url).json(shortlink)?;
        self.executor.execute(&request).await?.parse()
    }

    /// `GET /shortlink/{id}/last_scan/?ttl={ttl}`: last scan no older than
    /// `ttl_secs` seconds.
    pub async fn get_shortlink_last_scan(
        &self,
        shortlink_id: &str,
        ttl_secs: u64,
    ) -> Result<ShortlinkLastScan, ClientError> {
        let url = self.config.endpoint(&format!(
            "/shortlink/{}/last_scan/?ttl={ttl_secs}",
            urlencoding::encode(shortlink_id)
        ))?;
        self.executor.execute(&ApiRequest::get(url)).await?.parse()
    }

    /// `GET /ledger/`: URIs of all ledgers visible to the merchant.
    pub async fn get_ledger_overview(&self) -> Result<LedgerOverview, ClientError> {
        let url = self.config.endpoint("/ledger/")?;
        self.executor.execute(&ApiRequest::get(url)).await?.parse()
    }

    /// `GET /ledger/{ledger}/`.
    pub async fn get_ledger_detail(&self, ledger: &str) -> Result<LedgerDetail, ClientError> {
        let url = self
            .config
            .endpoint(&format!("/ledger/{}/", urlencoding::encode(ledger)))?;
        self.executor.execute(&ApiRequest::get(url)).await?.parse()
    }

    /// `GET /ledger/{ledger}/report/{report_id}/`.
    pub async fn get_report_info(
        &self,
        ledger: &str,
        report_id: &str,
    ) -> Result<ReportInfo, ClientError> {
        let url = self.report_url(ledger, report_id)?;
        self.get_report_info_at(url.as_str()).await
    }

    /// `GET {uri}` on an absolute report URI, as found in
    /// [`LedgerDetail::open_report_uri`].
    pub async fn get_report_info_at(&self, uri: &str) -> Result<ReportInfo, ClientError> {
        let url = Url::parse(uri)?;
        self.executor.execute(&ApiRequest::get(url)).await?.parse()
    }

    /// `PUT /ledger/{ledger}/report/{report_id}/`: request the report to be
    /// closed.
    pub async fn close_report(&self, ledger: &str, report_id: &str) -> Result<(), ClientError> {
        let url = self.report_url(ledger, report_id)?;
        self.close_report_at(url.as_str()).await
    }

    /// `PUT {uri}` on an absolute report URI.
    pub async fn close_report_at(&self, uri: &str) -> Result<(), ClientError> {
        let url = Url::parse(uri)?;
        self.executor
            .execute(&ApiRequest::put(url))
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Check that the API host accepts TCP connections.
    pub async fn is_ready(&self) -> bool {
        let url = &self.config.base_url;
        let (Some(host), Some(port)) = (url.host_str(), url.port_or_known_default()) else {
            warn!(base_url = %url, "Base URL has no host to probe");
            return false;
        };
        match tokio::net::TcpStream::connect((host, port)).await {
            Ok(_) => true,
            Err(e) => {
                warn!(host, port, error = %e, "Merchant API host unreachable");
                false
            }
        }
    }

    fn report_url(&self, ledger: &str, report_id: &str) -> Result<Url, url::ParseError> {
        self.config.endpoint(&format!(
            "/ledger/{}/report/{}/",
            urlencoding::encode(ledger),
            urlencoding::encode(report_id)
        ))
    }
}
