//! Wire objects of the mCASH merchant API.

pub mod datetime;
pub mod ledger;
pub mod payment_request;
pub mod shortlink;

use serde::{Deserialize, Serialize};

pub use ledger::{LedgerDetail, LedgerOverview, ReportInfo, ReportStatus};
pub use payment_request::{
    Capture, NewPaymentRequest, PaymentAction, PaymentRequestOutcome, PaymentStatus,
};
pub use shortlink::{NewShortlink, ShortlinkLastScan};

/// Identifier returned by the API when a resource is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub id: String,
}
