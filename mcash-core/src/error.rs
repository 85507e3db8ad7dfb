//! Errors of the report close workflow.

use mcash_sdk::client::ClientError;
use mcash_sdk::objects::ReportStatus;
use thiserror::Error;

/// Failures of the precondition chain run before a report close is polled.
///
/// None of these are retried; they are returned to the caller of
/// [`MerchantClient::start_report_closed_listener`](crate::MerchantClient::start_report_closed_listener).
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No ledger URI contains the configured ledger name.
    #[error("Could not find selected ledger.")]
    LedgerNotFound { ledger: String },

    /// The open report is not in status `open`.
    #[error("Already closed or closing report.")]
    ReportNotOpen { status: ReportStatus },

    /// The close request was sent but the report did not move on.
    #[error("Close report failed.")]
    CloseFailed { status: ReportStatus },

    /// A request of the chain failed.
    #[error("request failed: {0}")]
    Client(#[from] ClientError),
}
