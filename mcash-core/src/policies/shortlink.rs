//! Shortlink scan polling.

use std::time::Duration;

use async_trait::async_trait;
use mcash_sdk::client::{ClientError, MerchantApi, StatusCode};
use mcash_sdk::objects::ShortlinkLastScan;
use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::debug;

use crate::events::EventKind;
use crate::poller::{Check, PollPolicy};

/// Polls the last scan of a shortlink inside a window that starts at the
/// caller-supplied start time and grows with every check.
pub struct ShortlinkScanPolicy {
    api: MerchantApi,
    shortlink_id: String,
    /// Time already elapsed since the start time when the policy was built.
    offset: Duration,
    armed_at: Instant,
}

impl ShortlinkScanPolicy {
    pub fn new(api: MerchantApi, shortlink_id: impl Into<String>, start_time: OffsetDateTime) -> Self {
        let since_start = OffsetDateTime::now_utc() - start_time;
        // A start time in the future counts as now.
        let offset = Duration::try_from(since_start).unwrap_or(Duration::ZERO);
        Self {
            api,
            shortlink_id: shortlink_id.into(),
            offset,
            armed_at: Instant::now(),
        }
    }

    /// Whole seconds since the start time.
    pub fn ttl(&self) -> u64 {
        (self.offset + self.armed_at.elapsed()).as_secs()
    }
}

#[async_trait]
impl PollPolicy for ShortlinkScanPolicy {
    type Event = ShortlinkLastScan;

    fn target(&self) -> &str {
        &self.shortlink_id
    }

    fn interval(&self) -> Duration {
        EventKind::ShortlinkScanned.interval()
    }

    async fn check(&mut self) -> Check<ShortlinkLastScan> {
        let ttl = self.ttl();
        match self.api.get_shortlink_last_scan(&self.shortlink_id, ttl).await {
            Ok(scan) if scan.is_scanned() => Check::Terminal(scan),
            Ok(_) => Check::Continue,
            Err(ClientError::Api { status, .. }) if status == StatusCode::NOT_FOUND => {
                debug!(shortlink_id = %self.shortlink_id, ttl, "No scan in window");
                Check::Continue
            }
            Err(e) => Check::Abort(e),
        }
    }
}
