//! What each poller checks.

pub mod payment;
pub mod report;
pub mod shortlink;

pub use payment::PaymentOutcomePolicy;
pub use report::{ReportClosePolicy, begin_close};
pub use shortlink::ShortlinkScanPolicy;
