//! Record kinds shared by the file and remote adapters.
//!
//! Each persisted entity type is described once by a marker type; the
//! adapters are generic over these descriptions so the four CRUD operations
//! are written a single time and instantiated per kind.

use axum::http::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::constants::*;
use crate::models::{
    NewTimerRecord, NewTransaction, TimerRecord, TimerRecordPatch, TimerRecordRow, Transaction,
    TransactionRow, TransactionValues, hourly_rate,
};
use crate::utils::{validate_date, validate_item_name, validate_note, validate_positive_amount, validate_price};

/// Shape of a kind as stored in a local JSON document.
pub trait DocumentKind: Send + Sync + 'static {
    type Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Document file name under the data directory.
    const FILE_NAME: &'static str;
    /// Name of the single array inside the document.
    const COLLECTION: &'static str;
    /// Key used for a single record in responses.
    const SINGULAR: &'static str;
    /// Capitalized noun for messages.
    const LABEL: &'static str;

    fn id(record: &Self::Record) -> &str;

    fn set_id(record: &mut Self::Record, id: String);

    /// Validates an incoming record and normalizes derived fields.
    fn prepare(record: Self::Record) -> Result<Self::Record, (StatusCode, String)>;
}

/// Shape of a kind as stored in a remote table.
pub trait RemoteKind: Send + Sync + 'static {
    type Row: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;
    type Insert: Serialize + Send + Sync;
    type Patch: Serialize + Send + Sync;

    const TABLE: &'static str;
    /// Column used for newest-first ordering.
    const ORDER_COLUMN: &'static str;
    const LABEL: &'static str;
}

#[derive(Debug, Clone, Copy)]
pub struct TimerRecords;

#[derive(Debug, Clone, Copy)]
pub struct Transactions;

impl DocumentKind for TimerRecords {
    type Record = TimerRecord;

    const FILE_NAME: &'static str = TIMER_RECORDS_FILE;
    const COLLECTION: &'static str = "records";
    const SINGULAR: &'static str = "record";
    const LABEL: &'static str = "Record";

    fn id(record: &TimerRecord) -> &str {
        &record.id
    }

    fn set_id(record: &mut TimerRecord, id: String) {
        record.id = id;
    }

    fn prepare(mut record: TimerRecord) -> Result<TimerRecord, (StatusCode, String)> {
        require_id(&record.id)?;
        validate_date(&record.date)?;
        validate_positive_amount(record.amount)?;
        record.hourly_rate = hourly_rate(record.duration, record.amount);
        Ok(record)
    }
}

impl DocumentKind for Transactions {
    type Record = Transaction;

    const FILE_NAME: &'static str = TRANSACTIONS_FILE;
    const COLLECTION: &'static str = "transactions";
    const SINGULAR: &'static str = "transaction";
    const LABEL: &'static str = "Transaction";

    fn id(transaction: &Transaction) -> &str {
        &transaction.id
    }

    fn set_id(transaction: &mut Transaction, id: String) {
        transaction.id = id;
    }

    fn prepare(transaction: Transaction) -> Result<Transaction, (StatusCode, String)> {
        require_id(&transaction.id)?;
        validate_item_name(&transaction.item)?;
        validate_note(&transaction.note)?;
        validate_price(transaction.rain_price, "Rain price")?;
        validate_price(transaction.baht_price, "Baht price")?;
        Ok(transaction)
    }
}

impl RemoteKind for TimerRecords {
    type Row = TimerRecordRow;
    type Insert = NewTimerRecord;
    type Patch = TimerRecordPatch;

    const TABLE: &'static str = TIMER_RECORDS_TABLE;
    const ORDER_COLUMN: &'static str = "date";
    const LABEL: &'static str = "Record";
}

impl RemoteKind for Transactions {
    type Row = TransactionRow;
    type Insert = NewTransaction;
    type Patch = TransactionValues;

    const TABLE: &'static str = TRANSACTIONS_TABLE;
    const ORDER_COLUMN: &'static str = "date_time";
    const LABEL: &'static str = "Transaction";
}

fn require_id(id: &str) -> Result<(), (StatusCode, String)> {
    if id.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, ERR_ID_REQUIRED.to_string()));
    }
    Ok(())
}
