//! Payment status reconciliation from gateway notifications.

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::db::{self, Pool};
use crate::model::PaymentStatus;

/// Gateway webhook body. Fields we do not use are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub order_id: String,
    /// Missing or null is treated as `pending`.
    #[serde(default)]
    pub transaction_status: Option<String>,
    #[serde(default)]
    pub fraud_status: Option<String>,
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Booking not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Local status for an upstream transaction status.
pub fn map_status(transaction_status: &str, fraud_status: Option<&str>) -> PaymentStatus {
    match transaction_status {
        "capture" if fraud_status == Some("accept") => PaymentStatus::Success,
        "capture" => PaymentStatus::Pending,
        "settlement" => PaymentStatus::Success,
        "pending" => PaymentStatus::Pending,
        "deny" | "expire" | "failure" => PaymentStatus::Failed,
        "cancel" => PaymentStatus::Cancelled,
        _ => PaymentStatus::Pending,
    }
}

/// Overwrite the booking's payment status. Replays are harmless.
#[instrument(skip_all, fields(order_id = %notification.order_id))]
pub async fn reconcile(pool: &Pool, notification: &Notification) -> Result<PaymentStatus, ReconcileError> {
    let transaction_status = notification
        .transaction_status
        .as_deref()
        .unwrap_or("pending");
    let status = map_status(transaction_status, notification.fraud_status.as_deref());
    if !db::update_payment_status(pool, &notification.order_id, status).await? {
        warn!(%transaction_status, "notification for unknown booking");
        return Err(ReconcileError::NotFound);
    }
    info!(
        %transaction_status,
        status = status.as_str(),
        "payment status updated"
    );
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table() {
        let cases = [
            ("capture", Some("accept"), PaymentStatus::Success),
            ("capture", Some("challenge"), PaymentStatus::Pending),
            ("capture", None, PaymentStatus::Pending),
            ("settlement", None, PaymentStatus::Success),
            ("pending", None, PaymentStatus::Pending),
            ("deny", None, PaymentStatus::Failed),
            ("cancel", None, PaymentStatus::Cancelled),
            ("expire", None, PaymentStatus::Failed),
            ("failure", None, PaymentStatus::Failed),
            ("refund", None, PaymentStatus::Pending),
            ("", None, PaymentStatus::Pending),
        ];
        for (tx, fraud, expected) in cases {
            assert_eq!(map_status(tx, fraud), expected, "{tx} / {fraud:?}");
        }
    }

    #[test]
    fn notification_ignores_extra_fields() {
        let n: Notification = serde_json::from_str(
            r#"{"order_id":"BOOK-1","transaction_status":"settlement","gross_amount":"774.00"}"#,
        )
        .unwrap();
        assert_eq!(n.order_id, "BOOK-1");
        assert_eq!(n.transaction_status.as_deref(), Some("settlement"));
        assert!(n.fraud_status.is_none());
    }

    #[test]
    fn notification_status_may_be_absent() {
        let missing: Notification = serde_json::from_str(r#"{"order_id":"BOOK-1"}"#).unwrap();
        assert!(missing.transaction_status.is_none());
        let null: Notification =
            serde_json::from_str(r#"{"order_id":"BOOK-1","transaction_status":null}"#).unwrap();
        assert!(null.transaction_status.is_none());
    }
}
