use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LiquidationWarning,
    RateChange,
    TransactionComplete,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::LiquidationWarning => "liquidation_warning",
            AlertKind::RateChange => "rate_change",
            AlertKind::TransactionComplete => "transaction_complete",
        }
    }
}

/// A notification raised for a user. Immutable once created; `read` is the
/// only field that ever changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub payload: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAlertEvent {
    pub user_id: Uuid,
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub payload: serde_json::Value,
}

impl AlertEvent {
    pub fn new(create_alert: CreateAlertEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: create_alert.user_id,
            kind: create_alert.kind,
            title: create_alert.title,
            message: create_alert.message,
            payload: create_alert.payload,
            read: false,
            created_at: Utc::now(),
        }
    }
}
