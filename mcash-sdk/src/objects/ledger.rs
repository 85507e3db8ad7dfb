//! Ledger and settlement report objects.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Response of `GET /ledger/`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerOverview {
    #[serde(default)]
    pub uris: Vec<String>,
}

impl LedgerOverview {
    /// First ledger URI containing `ledger` as a substring.
    pub fn find(&self, ledger: &str) -> Option<&str> {
        self.uris
            .iter()
            .map(String::as_str)
            .find(|uri| uri.contains(ledger))
    }
}

/// Response of `GET /ledger/{ledger}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDetail {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Absolute URI of the report currently collecting transactions.
    pub open_report_uri: String,
}

/// Lifecycle of a settlement report: `open → closing → closed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReportStatus {
    Open,
    Closing,
    Closed,
    Other(String),
}

impl From<String> for ReportStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "open" => ReportStatus::Open,
            "closing" => ReportStatus::Closing,
            "closed" => ReportStatus::Closed,
            _ => ReportStatus::Other(value),
        }
    }
}

impl From<ReportStatus> for String {
    fn from(value: ReportStatus) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Open => write!(f, "open"),
            ReportStatus::Closing => write!(f, "closing"),
            ReportStatus::Closed => write!(f, "closed"),
            ReportStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Response of `GET` on a report URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportInfo {
    pub status: ReportStatus,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub ledger: Option<String>,
    #[serde(default, with = "super::datetime::option")]
    pub close_time: Option<OffsetDateTime>,
    #[serde(default)]
    pub callback_uri: Option<String>,
}
