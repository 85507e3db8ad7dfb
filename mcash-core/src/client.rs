//! Client façade.

use std::sync::Arc;

use mcash_sdk::client::{ClientError, MerchantApi, Transport};
use mcash_sdk::config::ClientConfig;
use mcash_sdk::objects::{PaymentRequestOutcome, ReportInfo, ShortlinkLastScan};
use time::OffsetDateTime;
use tracing::info;

use crate::error::WorkflowError;
use crate::events::EventKind;
use crate::listeners::{ListenerId, Subscription};
use crate::policies::{self, PaymentOutcomePolicy, ReportClosePolicy, ShortlinkScanPolicy};
use crate::poller::Poller;

/// mCASH merchant client with event notification.
///
/// Owns the typed API and one [`Poller`] per [`EventKind`]. Starting a poll
/// of a kind replaces the poll of that kind already running; kinds run
/// independently of each other.
///
/// Must be created inside a Tokio runtime. Call [`close`](Self::close) to
/// stop every poll and drop every listener; dropping the client stops the
/// polls without waiting for them.
pub struct MerchantClient {
    api: MerchantApi,
    payments: Poller<PaymentRequestOutcome>,
    shortlinks: Poller<ShortlinkLastScan>,
    reports: Poller<ReportInfo>,
}

impl MerchantClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::from_api(MerchantApi::new(config)?))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self::from_api(MerchantApi::with_transport(config, transport))
    }

    pub fn from_api(api: MerchantApi) -> Self {
        Self {
            api,
            payments: Poller::new(EventKind::PaymentFinished),
            shortlinks: Poller::new(EventKind::ShortlinkScanned),
            reports: Poller::new(EventKind::ReportClosed),
        }
    }

    /// One-shot API calls.
    pub fn api(&self) -> &MerchantApi {
        &self.api
    }

    pub fn config(&self) -> &ClientConfig {
        self.api.config()
    }

    pub fn payments(&self) -> &Poller<PaymentRequestOutcome> {
        &self.payments
    }

    pub fn shortlinks(&self) -> &Poller<ShortlinkLastScan> {
        &self.shortlinks
    }

    pub fn reports(&self) -> &Poller<ReportInfo> {
        &self.reports
    }

    // Payment finished

    pub fn add_payment_finished_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&PaymentRequestOutcome) + Send + Sync + 'static,
    {
        self.payments.add_listener(listener)
    }

    pub fn remove_payment_finished_listener(&self, id: ListenerId) -> bool {
        self.payments.remove_listener(id)
    }

    pub fn subscribe_payment_finished(&self) -> Subscription<PaymentRequestOutcome> {
        self.payments.subscribe()
    }

    /// Poll the outcome of `ticket_id` every second until it is `ok` or
    /// `fail`, capturing it when it turns `auth`.
    pub fn start_payment_finished_listener(&self, ticket_id: &str) {
        self.payments
            .start(PaymentOutcomePolicy::new(self.api.clone(), ticket_id));
    }

    // Shortlink scanned

    pub fn add_shortlink_scanned_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ShortlinkLastScan) + Send + Sync + 'static,
    {
        self.shortlinks.add_listener(listener)
    }

    pub fn remove_shortlink_scanned_listener(&self, id: ListenerId) -> bool {
        self.shortlinks.remove_listener(id)
    }

    pub fn subscribe_shortlink_scanned(&self) -> Subscription<ShortlinkLastScan> {
        self.shortlinks.subscribe()
    }

    /// Poll `shortlink_id` every second for a scan made after `start_time`.
    pub fn start_shortlink_scanned_listener(&self, shortlink_id: &str, start_time: OffsetDateTime) {
        self.shortlinks.start(ShortlinkScanPolicy::new(
            self.api.clone(),
            shortlink_id,
            start_time,
        ));
    }

    // Report closed

    pub fn add_report_closed_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ReportInfo) + Send + Sync + 'static,
    {
        self.reports.add_listener(listener)
    }

    pub fn remove_report_closed_listener(&self, id: ListenerId) -> bool {
        self.reports.remove_listener(id)
    }

    pub fn subscribe_report_closed(&self) -> Subscription<ReportInfo> {
        self.reports.subscribe()
    }

    /// Close the open report of the configured ledger, then poll it every
    /// two seconds until it is `closed`.
    ///
    /// The close itself runs on the calling task; its failures are returned
    /// here and no poll is started.
    pub async fn start_report_closed_listener(&self) -> Result<(), WorkflowError> {
        let report_uri = policies::begin_close(&self.api).await?;
        self.reports
            .start(ReportClosePolicy::new(self.api.clone(), report_uri));
        Ok(())
    }

    /// Stop every poll, drop every listener and wait until no poll task is
    /// left running.
    ///
    /// Must not be awaited from inside a listener of this client.
    pub async fn close(&self) {
        tokio::join!(
            self.payments.close(),
            self.shortlinks.close(),
            self.reports.close(),
        );
        info!("Merchant client closed");
    }
}
