//! Per-account interaction state: the active tab, the one dialog that may be
//! open, and the session timer.
//!
//! The workspace never talks to a store. Submitting a dialog validates its
//! input and hands back the store action to perform; the caller reports back
//! with [`Workspace::complete`] once the action has been applied.

use std::time::Duration;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_PLACEHOLDER_AMOUNT;
use crate::models::{
    NewTimerRecord, TimerRecordPatch, TimerRecordRow, TransactionForm, TransactionRow,
    TransactionValues,
};
use crate::timer::{TimerEngine, TimerError, TimerSnapshot};
use crate::utils::{parse_positive_amount, validate_transaction_form};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Timer,
    Summary,
    #[serde(rename = "buysell")]
    BuySell,
    Backup,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dialog {
    #[default]
    None,
    ConfirmSave {
        amount: String,
    },
    EditRecord {
        record: TimerRecordRow,
        amount: String,
    },
    ConfirmDeleteRecord {
        record_id: i64,
    },
    AddTransaction {
        form: TransactionForm,
    },
    EditTransaction {
        transaction_id: i64,
        form: TransactionForm,
    },
    ConfirmDeleteTransaction {
        transaction_id: i64,
    },
}

/// Input typed into the open dialog.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DialogInput {
    Amount { amount: String },
    Transaction { form: TransactionForm },
}

/// Store mutation requested by a submitted dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    InsertTimerRecord(NewTimerRecord),
    UpdateTimerRecord { id: i64, patch: TimerRecordPatch },
    DeleteTimerRecord(i64),
    InsertTransaction(TransactionValues),
    UpdateTransaction { id: i64, values: TransactionValues },
    DeleteTransaction(i64),
}

impl PendingAction {
    /// Verb phrase for the generic failure message.
    pub fn failure_action(&self) -> &'static str {
        match self {
            Self::InsertTimerRecord(_) => "save record",
            Self::UpdateTimerRecord { .. } => "update record",
            Self::DeleteTimerRecord(_) => "delete record",
            Self::InsertTransaction(_) => "save transaction",
            Self::UpdateTransaction { .. } => "update transaction",
            Self::DeleteTransaction(_) => "delete transaction",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum WorkspaceError {
    #[error("Another dialog is already open")]
    DialogBusy,
    #[error("No dialog is open")]
    NoDialog,
    #[error("This input does not belong to the open dialog")]
    InputMismatch,
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error("{0}")]
    Invalid(String),
}

impl From<WorkspaceError> for (StatusCode, String) {
    fn from(err: WorkspaceError) -> Self {
        let status = match err {
            WorkspaceError::DialogBusy
            | WorkspaceError::Timer(TimerError::AlreadyRunning)
            | WorkspaceError::Timer(TimerError::AwaitingConfirmation) => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, err.to_string())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WorkspaceView {
    pub tab: Tab,
    pub dialog: Dialog,
    pub timer: TimerSnapshot,
}

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    tab: Tab,
    dialog: Dialog,
    timer: TimerEngine,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub fn view(&self, now: Duration) -> WorkspaceView {
        WorkspaceView {
            tab: self.tab,
            dialog: self.dialog.clone(),
            timer: self.timer.snapshot(now),
        }
    }

    pub fn start_timer(&mut self, now: Duration) -> Result<(), WorkspaceError> {
        Ok(self.timer.start(now)?)
    }

    pub fn pause_timer(&mut self, now: Duration) -> Result<(), WorkspaceError> {
        Ok(self.timer.pause(now)?)
    }

    /// Stops the timer and asks for the amount earned, pre-filled with the
    /// placeholder.
    pub fn finish_timer(&mut self, now: Duration) -> Result<u64, WorkspaceError> {
        self.ensure_no_dialog()?;
        let elapsed_ms = self.timer.finish(now)?;
        self.dialog = Dialog::ConfirmSave {
            amount: DEFAULT_PLACEHOLDER_AMOUNT.to_string(),
        };
        Ok(elapsed_ms)
    }

    pub fn open_edit_record(&mut self, record: TimerRecordRow) -> Result<(), WorkspaceError> {
        self.ensure_no_dialog()?;
        let amount = record.amount.to_string();
        self.dialog = Dialog::EditRecord { record, amount };
        Ok(())
    }

    pub fn open_delete_record(&mut self, record_id: i64) -> Result<(), WorkspaceError> {
        self.ensure_no_dialog()?;
        self.dialog = Dialog::ConfirmDeleteRecord { record_id };
        Ok(())
    }

    pub fn open_add_transaction(&mut self) -> Result<(), WorkspaceError> {
        self.ensure_no_dialog()?;
        self.dialog = Dialog::AddTransaction {
            form: TransactionForm::default(),
        };
        Ok(())
    }

    pub fn open_edit_transaction(&mut self, row: &TransactionRow) -> Result<(), WorkspaceError> {
        self.ensure_no_dialog()?;
        self.dialog = Dialog::EditTransaction {
            transaction_id: row.id,
            form: TransactionForm::from(row),
        };
        Ok(())
    }

    pub fn open_delete_transaction(&mut self, transaction_id: i64) -> Result<(), WorkspaceError> {
        self.ensure_no_dialog()?;
        self.dialog = Dialog::ConfirmDeleteTransaction { transaction_id };
        Ok(())
    }

    pub fn update_input(&mut self, input: DialogInput) -> Result<(), WorkspaceError> {
        match (&mut self.dialog, input) {
            (Dialog::None, _) => Err(WorkspaceError::NoDialog),
            (
                Dialog::ConfirmSave { amount } | Dialog::EditRecord { amount, .. },
                DialogInput::Amount { amount: value },
            ) => {
                *amount = value;
                Ok(())
            }
            (
                Dialog::AddTransaction { form } | Dialog::EditTransaction { form, .. },
                DialogInput::Transaction { form: value },
            ) => {
                *form = value;
                Ok(())
            }
            _ => Err(WorkspaceError::InputMismatch),
        }
    }

    /// Validates the open dialog and returns the store action it asks for.
    /// Nothing changes here; an invalid input leaves the dialog as it is.
    pub fn submit(&self, date: String) -> Result<PendingAction, WorkspaceError> {
        match &self.dialog {
            Dialog::None => Err(WorkspaceError::NoDialog),
            Dialog::ConfirmSave { amount } => Ok(PendingAction::InsertTimerRecord(
                self.timer.confirm(amount, date)?,
            )),
            Dialog::EditRecord { record, amount } => {
                let amount = parse_positive_amount(amount)
                    .map_err(|_| WorkspaceError::Timer(TimerError::InvalidAmount))?;
                Ok(PendingAction::UpdateTimerRecord {
                    id: record.id,
                    patch: TimerRecordPatch::for_record(record, amount),
                })
            }
            Dialog::ConfirmDeleteRecord { record_id } => {
                Ok(PendingAction::DeleteTimerRecord(*record_id))
            }
            Dialog::AddTransaction { form } => Ok(PendingAction::InsertTransaction(
                validate_transaction_form(form).map_err(|(_, message)| WorkspaceError::Invalid(message))?,
            )),
            Dialog::EditTransaction {
                transaction_id,
                form,
            } => Ok(PendingAction::UpdateTransaction {
                id: *transaction_id,
                values: validate_transaction_form(form)
                    .map_err(|(_, message)| WorkspaceError::Invalid(message))?,
            }),
            Dialog::ConfirmDeleteTransaction { transaction_id } => {
                Ok(PendingAction::DeleteTransaction(*transaction_id))
            }
        }
    }

    /// Closes the dialog after its action was stored. A saved session resets
    /// the timer to zero.
    pub fn complete(&mut self) {
        if matches!(self.dialog, Dialog::ConfirmSave { .. }) {
            self.timer.reset();
        }
        self.dialog = Dialog::None;
    }

    /// Closes the dialog without storing anything. Cancelling the save of a
    /// finished session discards that session.
    pub fn cancel(&mut self) -> Result<(), WorkspaceError> {
        if matches!(self.dialog, Dialog::None) {
            return Err(WorkspaceError::NoDialog);
        }
        self.complete();
        Ok(())
    }

    fn ensure_no_dialog(&self) -> Result<(), WorkspaceError> {
        if matches!(self.dialog, Dialog::None) {
            Ok(())
        } else {
            Err(WorkspaceError::DialogBusy)
        }
    }
}
