//! Payment request objects.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Seconds a new payment request stays open for the customer.
pub const PAYMENT_REQUEST_EXPIRES_IN: u32 = 300;

/// Status of a payment request as reported by its outcome.
///
/// Parsed case-insensitively. Statuses this crate does not know about are
/// kept verbatim in [`PaymentStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    /// Waiting for the customer to approve.
    Pending,
    /// Approved by the customer, waiting for capture.
    Auth,
    /// Captured.
    Ok,
    /// Rejected, aborted or expired.
    Fail,
    Other(String),
}

impl PaymentStatus {
    /// Whether the payment request has reached its final state.
    pub fn is_final(&self) -> bool {
        matches!(self, PaymentStatus::Ok | PaymentStatus::Fail)
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "pending" => PaymentStatus::Pending,
            "auth" => PaymentStatus::Auth,
            "ok" => PaymentStatus::Ok,
            "fail" => PaymentStatus::Fail,
            _ => PaymentStatus::Other(value),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(value: PaymentStatus) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Auth => write!(f, "auth"),
            PaymentStatus::Ok => write!(f, "ok"),
            PaymentStatus::Fail => write!(f, "fail"),
            PaymentStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

/// One capture performed against a payment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub additional_amount: Option<Decimal>,
    #[serde(default, with = "super::datetime::option")]
    pub timestamp: Option<OffsetDateTime>,
}

/// Snapshot of `GET /payment_request/{tid}/outcome/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequestOutcome {
    pub status: PaymentStatus,
    #[serde(default)]
    pub status_code: Option<i32>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub additional_amount: Option<Decimal>,
    #[serde(default)]
    pub auth_amount: Option<Decimal>,
    #[serde(default)]
    pub auth_additional_amount: Option<Decimal>,
    #[serde(default)]
    pub captures: Vec<Capture>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default, with = "super::datetime::option")]
    pub date_modified: Option<OffsetDateTime>,
    #[serde(default, with = "super::datetime::option")]
    pub date_expires: Option<OffsetDateTime>,
    #[serde(default)]
    pub credit: bool,
    #[serde(default)]
    pub interchange_fee: Option<Decimal>,
    #[serde(default)]
    pub transaction_fee: Option<Decimal>,
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(default)]
    pub report_uri: Option<String>,
    #[serde(default)]
    pub ledger: Option<String>,
    #[serde(default)]
    pub attachment_uri: Option<String>,
    #[serde(default)]
    pub pos_id: Option<String>,
    #[serde(default)]
    pub pos_tid: Option<String>,
    #[serde(default)]
    pub tid: Option<String>,
}

/// Caller-supplied part of a new payment request.
///
/// `pos_id`, `ledger`, the action and the expiry come from the client
/// configuration when the request is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentRequest {
    /// Point-of-sale ticket id chosen by the merchant.
    pub pos_tid: String,
    /// Scan token identifying the customer.
    pub customer: String,
    pub amount: Decimal,
    pub currency: String,
    /// Tip or other additional amount. Only sent when positive.
    pub additional_amount: Decimal,
    /// Let the customer edit the additional amount. Ignored when
    /// `additional_amount` is positive.
    pub additional_edit: bool,
    pub callback_uri: Option<String>,
    pub allow_credit: bool,
}

/// Body of `POST /payment_request/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePaymentRequest<'a> {
    pub action: &'static str,
    pub pos_id: &'a str,
    pub pos_tid: &'a str,
    pub customer: &'a str,
    pub currency: &'a str,
    #[serde(serialize_with = "crate::money::serialize")]
    pub amount: Decimal,
    #[serde(serialize_with = "crate::money::option::serialize")]
    pub additional_amount: Option<Decimal>,
    pub additional_edit: bool,
    pub expires_in: u32,
    pub ledger: &'a str,
    pub allow_credit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_uri: Option<&'a str>,
}

impl<'a> CreatePaymentRequest<'a> {
    /// Assemble the wire body for a sale on `pos_id` settling into `ledger`.
    pub fn sale(request: &'a NewPaymentRequest, pos_id: &'a str, ledger: &'a str) -> Self {
        let (additional_amount, additional_edit) = if request.additional_amount > Decimal::ZERO {
            (Some(request.additional_amount), false)
        } else {
            (None, request.additional_edit)
        };
        Self {
            action: "SALE",
            pos_id,
            pos_tid: &request.pos_tid,
            customer: &request.customer,
            currency: &request.currency,
            amount: request.amount,
            additional_amount,
            additional_edit,
            expires_in: PAYMENT_REQUEST_EXPIRES_IN,
            ledger,
            allow_credit: request.allow_credit,
            callback_uri: request.callback_uri.as_deref(),
        }
    }
}

/// Action applied through `PUT /payment_request/{tid}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentAction {
    Capture,
    Abort,
}

impl std::fmt::Display for PaymentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentAction::Capture => write!(f, "capture"),
            PaymentAction::Abort => write!(f, "abort"),
        }
    }
}

/// Body of `PUT /payment_request/{tid}/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdatePaymentRequest<'a> {
    pub action: PaymentAction,
    pub ledger: &'a str,
    pub callback_uri: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_outcome_parsing() {
        let json = r#"{
            "status": "OK",
            "status_code": 2000,
            "currency": "NOK",
            "amount": "12.50",
            "captures": [{"amount": "12.50", "timestamp": "2014-03-07 13:45:09"}],
            "date_modified": "2014-03-07 13:45:09",
            "date_expires": null,
            "ledger": "ledger-1",
            "tid": "tid-1"
        }"#;
        let outcome: PaymentRequestOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome.status, PaymentStatus::Ok);
        assert!(outcome.status.is_final());
        assert_eq!(outcome.amount, Some(Decimal::from_str("12.50").unwrap()));
        assert_eq!(outcome.captures.len(), 1);
        assert!(outcome.date_modified.is_some());
        assert!(outcome.date_expires.is_none());
    }

    #[test]
    fn test_unknown_status_is_kept() {
        let status = PaymentStatus::from("refunded".to_string());
        assert_eq!(status, PaymentStatus::Other("refunded".to_string()));
        assert!(!status.is_final());
        assert_eq!(status.to_string(), "refunded");
    }

    #[test]
    fn test_sale_body_without_additional_amount() {
        let request = NewPaymentRequest {
            pos_tid: "pos-tid".to_string(),
            customer: "token".to_string(),
            amount: Decimal::from_str("12.5").unwrap(),
            currency: "NOK".to_string(),
            additional_amount: Decimal::ZERO,
            additional_edit: true,
            callback_uri: None,
            allow_credit: false,
        };
        let body = serde_json::to_value(CreatePaymentRequest::sale(&request, "pos", "ledger")).unwrap();
        assert_eq!(body["action"], "SALE");
        assert_eq!(body["amount"], "12.50");
        assert!(body["additional_amount"].is_null());
        assert_eq!(body["additional_edit"], true);
        assert_eq!(body["expires_in"], 300);
        assert!(body.get("callback_uri").is_none());
    }

    #[test]
    fn test_sale_body_with_additional_amount_disables_edit() {
        let request = NewPaymentRequest {
            pos_tid: "pos-tid".to_string(),
            customer: "token".to_string(),
            amount: Decimal::from(100),
            currency: "NOK".to_string(),
            additional_amount: Decimal::from_str("99.995").unwrap(),
            additional_edit: true,
            callback_uri: Some("https://example.com/cb".to_string()),
            allow_credit: true,
        };
        let body = serde_json::to_value(CreatePaymentRequest::sale(&request, "pos", "ledger")).unwrap();
        assert_eq!(body["amount"], "100.00");
        assert_eq!(body["additional_amount"], "100.00");
        assert_eq!(body["additional_edit"], false);
        assert_eq!(body["callback_uri"], "https://example.com/cb");
    }
}
