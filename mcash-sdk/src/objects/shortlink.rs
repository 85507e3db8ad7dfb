//! Shortlink objects.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Body of `POST /shortlink/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShortlink {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_uri: Option<String>,
}

/// Response of `GET /shortlink/{id}/last_scan/`.
///
/// A scan happened inside the requested window when `id` is present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShortlinkLastScan {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub argstring: Option<String>,
    #[serde(default, with = "super::datetime::option")]
    pub scan_time: Option<OffsetDateTime>,
}

impl ShortlinkLastScan {
    pub fn is_scanned(&self) -> bool {
        self.id.is_some()
    }
}
