//! Event kinds delivered to listeners.
//!
//! Each kind has its own poller and its own registry:
//!
//! | Kind | Event payload |
//! |---|---|
//! | `PaymentFinished` | `PaymentRequestOutcome` with status `ok` or `fail` |
//! | `ShortlinkScanned` | `ShortlinkLastScan` carrying a scan id |
//! | `ReportClosed` | `ReportInfo` with status `closed` |

use std::time::Duration;

/// Kind of event a poller produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PaymentFinished,
    ShortlinkScanned,
    ReportClosed,
}

impl EventKind {
    /// Fixed delay between two checks of this kind.
    pub fn interval(&self) -> Duration {
        match self {
            EventKind::PaymentFinished => Duration::from_millis(1000),
            EventKind::ShortlinkScanned => Duration::from_millis(1000),
            EventKind::ReportClosed => Duration::from_millis(2000),
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::PaymentFinished => write!(f, "payment_finished"),
            EventKind::ShortlinkScanned => write!(f, "shortlink_scanned"),
            EventKind::ReportClosed => write!(f, "report_closed"),
        }
    }
}
