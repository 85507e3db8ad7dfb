//! Report closing: the precondition chain and the poll that follows it.

use std::time::Duration;

use async_trait::async_trait;
use mcash_sdk::client::MerchantApi;
use mcash_sdk::objects::{ReportInfo, ReportStatus};
use tracing::{debug, info};

use crate::error::WorkflowError;
use crate::events::EventKind;
use crate::poller::{Check, PollPolicy};

/// Ask the API to close the open report of the configured ledger.
///
/// 1. The ledger overview must list a URI containing the configured ledger.
/// 2. The ledger detail gives the open report URI.
/// 3. That report must be `open`.
/// 4. The report is closed.
/// 5. A re-fetch must show it `closing` or `closed`.
///
/// Returns the report URI to poll until the report is `closed`.
pub async fn begin_close(api: &MerchantApi) -> Result<String, WorkflowError> {
    let ledger = api.config().ledger.as_str();

    let overview = api.get_ledger_overview().await?;
    let Some(ledger_uri) = overview.find(ledger) else {
        return Err(WorkflowError::LedgerNotFound {
            ledger: ledger.to_owned(),
        });
    };
    debug!(ledger, ledger_uri, "Found ledger");

    let detail = api.get_ledger_detail(ledger).await?;
    let report_uri = detail.open_report_uri;

    let report = api.get_report_info_at(&report_uri).await?;
    if report.status != ReportStatus::Open {
        return Err(WorkflowError::ReportNotOpen {
            status: report.status,
        });
    }

    api.close_report_at(&report_uri).await?;

    let report = api.get_report_info_at(&report_uri).await?;
    match report.status {
        ReportStatus::Closing | ReportStatus::Closed => {
            info!(ledger, report_uri, status = %report.status, "Report close requested");
            Ok(report_uri)
        }
        status => Err(WorkflowError::CloseFailed { status }),
    }
}

/// Polls a report until it is `closed`.
pub struct ReportClosePolicy {
    api: MerchantApi,
    report_uri: String,
}

impl ReportClosePolicy {
    pub fn new(api: MerchantApi, report_uri: impl Into<String>) -> Self {
        Self {
            api,
            report_uri: report_uri.into(),
        }
    }
}

#[async_trait]
impl PollPolicy for ReportClosePolicy {
    type Event = ReportInfo;

    fn target(&self) -> &str {
        &self.report_uri
    }

    fn interval(&self) -> Duration {
        EventKind::ReportClosed.interval()
    }

    async fn check(&mut self) -> Check<ReportInfo> {
        match self.api.get_report_info_at(&self.report_uri).await {
            Ok(report) if report.status == ReportStatus::Closed => Check::Terminal(report),
            Ok(_) => Check::Continue,
            Err(e) => Check::Abort(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcash_sdk::client::{ClientError, Method};
    use mcash_sdk::config::{ClientConfig, Credentials, DEFAULT_BASE_URL};
    use mcash_sdk::testkit::{Reply, ScriptedTransport};
    use std::sync::Arc;
    use url::Url;

    const REPORT_URI: &str = "https://api.mca.sh/merchant/v1/ledger/ledger-1/report/9/";
    const REPORT: &str = "/ledger/ledger-1/report/9/";

    fn api(transport: &ScriptedTransport) -> MerchantApi {
        let config = ClientConfig::new(
            Url::parse(DEFAULT_BASE_URL).unwrap(),
            "merchant",
            "user",
            Credentials::secret("key"),
            "pos-1",
            "ledger-1",
        )
        .unwrap();
        MerchantApi::with_transport(config, Arc::new(transport.clone()))
    }

    fn report(status: &str) -> Reply {
        Reply::json(200, format!(r#"{{"status": "{status}"}}"#))
    }

    fn ledger_routes() -> ScriptedTransport {
        ScriptedTransport::new()
            .on(
                Method::GET,
                "/ledger/",
                [Reply::json(
                    200,
                    r#"{"uris": ["https://api.mca.sh/merchant/v1/ledger/ledger-1/"]}"#,
                )],
            )
            .on(
                Method::GET,
                "/ledger/ledger-1/",
                [Reply::json(
                    200,
                    format!(r#"{{"open_report_uri": "{REPORT_URI}"}}"#),
                )],
            )
    }

    #[tokio::test]
    async fn test_missing_ledger_stops_after_overview() {
        let transport = ScriptedTransport::new().on(
            Method::GET,
            "/ledger/",
            [Reply::json(200, r#"{"uris": ["https://api.mca.sh/merchant/v1/ledger/other/"]}"#)],
        );
        let err = begin_close(&api(&transport)).await.unwrap_err();
        assert!(matches!(err, WorkflowError::LedgerNotFound { ref ledger } if ledger == "ledger-1"));
        assert_eq!(err.to_string(), "Could not find selected ledger.");
        assert_eq!(transport.total(), 1);
    }

    #[tokio::test]
    async fn test_report_not_open() {
        let transport = ledger_routes().on(Method::GET, REPORT, [report("closing")]);
        let err = begin_close(&api(&transport)).await.unwrap_err();
        assert_eq!(err.to_string(), "Already closed or closing report.");
        assert_eq!(transport.count(Method::PUT, REPORT), 0);
    }

    #[tokio::test]
    async fn test_close_failed() {
        let transport = ledger_routes()
            .on(Method::GET, REPORT, [report("open"), report("open")])
            .on(Method::PUT, REPORT, [Reply::status(202)]);
        let err = begin_close(&api(&transport)).await.unwrap_err();
        assert!(matches!(err, WorkflowError::CloseFailed { status: ReportStatus::Open }));
        assert_eq!(err.to_string(), "Close report failed.");
        assert_eq!(transport.count(Method::PUT, REPORT), 1);
    }

    #[tokio::test]
    async fn test_close_requested() {
        let transport = ledger_routes()
            .on(Method::GET, REPORT, [report("open"), report("closing")])
            .on(Method::PUT, REPORT, [Reply::status(202)]);
        let uri = begin_close(&api(&transport)).await.unwrap();
        assert_eq!(uri, REPORT_URI);
        assert_eq!(transport.total(), 5);
    }

    #[tokio::test]
    async fn test_close_request_error_is_returned() {
        let transport = ledger_routes()
            .on(Method::GET, REPORT, [report("open")])
            .on(Method::PUT, REPORT, [Reply::json(403, "denied")]);
        let err = begin_close(&api(&transport)).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Client(ClientError::Api { .. })));
    }

    #[tokio::test]
    async fn test_poll_terminal_only_on_closed() {
        let transport =
            ScriptedTransport::new().on(Method::GET, REPORT, [report("closing"), report("closed")]);
        let mut policy = ReportClosePolicy::new(api(&transport), REPORT_URI);
        assert!(matches!(policy.check().await, Check::Continue));
        match policy.check().await {
            Check::Terminal(info) => assert_eq!(info.status, ReportStatus::Closed),
            other => panic!("expected terminal, got {other:?}"),
        }
    }
}
