use serde::{Deserialize, Serialize};

use crate::constants::{MS_PER_HOUR, MSG_RELOAD_FAILED};

/// Earnings per hour for a session; zero for an empty session.
pub fn hourly_rate(duration_ms: u64, amount: f64) -> f64 {
    if duration_ms == 0 {
        0.0
    } else {
        amount * MS_PER_HOUR / duration_ms as f64
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransactionStatus {
    #[default]
    #[serde(rename = "ซื้อ", alias = "buy")]
    Buy,
    #[serde(rename = "ขาย", alias = "sell")]
    Sell,
    #[serde(rename = "เทริน", alias = "trade")]
    Trade,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 3] = [Self::Buy, Self::Sell, Self::Trade];

    pub fn label(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Trade => "trade",
        }
    }
}

// ---------------------------------------------------------------------------
// File-backed documents
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    pub id: String,
    pub date: String,
    pub duration: u64,
    pub amount: f64,
    pub hourly_rate: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub status: TransactionStatus,
    pub item: String,
    pub date_time: String,
    #[serde(default)]
    pub rain_price: f64,
    #[serde(default)]
    pub baht_price: f64,
    #[serde(default)]
    pub note: String,
}

#[derive(Deserialize)]
pub struct DeleteDocumentQuery {
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// Remote store rows
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimerRecordRow {
    pub id: i64,
    pub created_at: String,
    pub date: String,
    pub duration: u64,
    pub amount: f64,
    pub hourly_rate: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewTimerRecord {
    pub date: String,
    pub duration: u64,
    pub amount: f64,
    pub hourly_rate: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TimerRecordPatch {
    pub amount: f64,
    pub hourly_rate: f64,
}

impl TimerRecordPatch {
    /// Duration is fixed once a record exists, so only the amount moves the rate.
    pub fn for_record(record: &TimerRecordRow, amount: f64) -> Self {
        Self {
            amount,
            hourly_rate: hourly_rate(record.duration, amount),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub id: i64,
    pub created_at: String,
    pub status: TransactionStatus,
    pub item: String,
    pub date_time: String,
    pub rain_price: f64,
    pub baht_price: f64,
    pub note: Option<String>,
}

/// Mutable transaction fields, shared by insert and update.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TransactionValues {
    pub status: TransactionStatus,
    pub item: String,
    pub rain_price: f64,
    pub baht_price: f64,
    pub note: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewTransaction {
    #[serde(flatten)]
    pub values: TransactionValues,
    pub date_time: String,
}

/// Editor input as typed by the user; prices stay text until submission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct TransactionForm {
    pub status: TransactionStatus,
    pub item: String,
    pub rain_price: String,
    pub baht_price: String,
    pub note: String,
}

impl From<&TransactionRow> for TransactionForm {
    fn from(row: &TransactionRow) -> Self {
        Self {
            status: row.status,
            item: row.item.clone(),
            rain_price: row.rain_price.to_string(),
            baht_price: row.baht_price.to_string(),
            note: row.note.clone().unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
pub struct CreateTimerRecordPayload {
    pub duration: u64,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct UpdateTimerRecordPayload {
    pub amount: String,
}

/// List response. After a write the list is absent, with a warning, when the
/// write went through but the re-read failed.
#[derive(Serialize, Debug)]
pub struct TimerRecordsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<TimerRecordRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

impl TimerRecordsResponse {
    pub fn new(records: Vec<TimerRecordRow>) -> Self {
        Self::reloaded(Some(records))
    }

    pub fn reloaded(records: Option<Vec<TimerRecordRow>>) -> Self {
        let warning = records.is_none().then_some(MSG_RELOAD_FAILED);
        Self { records, warning }
    }
}

#[derive(Serialize, Debug)]
pub struct TransactionsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<TransactionRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

impl TransactionsResponse {
    pub fn new(transactions: Vec<TransactionRow>) -> Self {
        Self::reloaded(Some(transactions))
    }

    pub fn reloaded(transactions: Option<Vec<TransactionRow>>) -> Self {
        let warning = transactions.is_none().then_some(MSG_RELOAD_FAILED);
        Self {
            transactions,
            warning,
        }
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct RegisterResponse {
    pub user: PublicUser,
    pub verify_email: bool,
    pub message: &'static str,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub user: PublicUser,
    pub redirect_to: &'static str,
}
