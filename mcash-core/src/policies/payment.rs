//! Payment outcome polling.
//!
//! `pending` keeps polling. `auth` captures the payment once and keeps
//! polling until the capture shows up as `ok`. `ok` and `fail` finish the
//! poll with the full outcome.

use std::time::Duration;

use async_trait::async_trait;
use mcash_sdk::client::MerchantApi;
use mcash_sdk::objects::{PaymentRequestOutcome, PaymentStatus};
use tracing::{debug, info, warn};

use crate::events::EventKind;
use crate::poller::{Check, PollPolicy};

pub struct PaymentOutcomePolicy {
    api: MerchantApi,
    ticket_id: String,
}

impl PaymentOutcomePolicy {
    pub fn new(api: MerchantApi, ticket_id: impl Into<String>) -> Self {
        Self {
            api,
            ticket_id: ticket_id.into(),
        }
    }

    async fn capture(&self) {
        info!(ticket_id = %self.ticket_id, "Payment authorized, capturing");
        if let Err(e) = self.api.capture_payment_request(&self.ticket_id, None).await {
            warn!(ticket_id = %self.ticket_id, error = %e, "Capture failed");
        }
    }
}

#[async_trait]
impl PollPolicy for PaymentOutcomePolicy {
    type Event = PaymentRequestOutcome;

    fn target(&self) -> &str {
        &self.ticket_id
    }

    fn interval(&self) -> Duration {
        EventKind::PaymentFinished.interval()
    }

    async fn check(&mut self) -> Check<PaymentRequestOutcome> {
        let outcome = match self.api.get_payment_request_outcome(&self.ticket_id).await {
            Ok(outcome) => outcome,
            Err(e) => return Check::Abort(e),
        };

        match &outcome.status {
            PaymentStatus::Ok | PaymentStatus::Fail => Check::Terminal(outcome),
            PaymentStatus::Auth => {
                self.capture().await;
                Check::Continue
            }
            PaymentStatus::Pending => Check::Continue,
            PaymentStatus::Other(status) => {
                debug!(ticket_id = %self.ticket_id, status, "Unknown payment status");
                Check::Continue
            }
        }
    }
}
