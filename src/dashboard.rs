//! Handlers for the signed-in dashboard: tabs, the session timer, dialogs,
//! and the summary and backup views.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::AppState;
use crate::auth::{UserSession, get_current_user, store_failure};
use crate::constants::MSG_RELOAD_FAILED;
use crate::error::{AppError, StoreResult};
use crate::models::{NewTransaction, TimerRecordRow, TransactionRow};
use crate::summary::{Summary, SummaryQuery, build_summary};
use crate::utils::now_rfc3339;
use crate::workspace::{DialogInput, PendingAction, Tab, WorkspaceError, WorkspaceView};

fn rejected(err: WorkspaceError) -> AppError {
    AppError::from(<(StatusCode, String)>::from(err))
}

#[derive(Deserialize)]
pub struct SetTabPayload {
    pub tab: Tab,
}

/// Which dialog to open. The save dialog is only reachable by finishing the
/// timer.
#[derive(Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OpenDialog {
    EditRecord { record_id: i64 },
    ConfirmDeleteRecord { record_id: i64 },
    AddTransaction,
    EditTransaction { transaction_id: i64 },
    ConfirmDeleteTransaction { transaction_id: i64 },
}

/// Result of a confirmed dialog. The affected list is absent, with a warning,
/// when the write was applied but re-reading the list failed.
#[derive(Serialize, Debug)]
pub struct ConfirmResponse {
    pub workspace: WorkspaceView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<TimerRecordRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<TransactionRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

#[derive(Serialize, Debug)]
pub struct Backup {
    pub exported_at: String,
    pub timer_records: Vec<TimerRecordRow>,
    pub transactions: Vec<TransactionRow>,
}

/// The list touched by an applied action.
#[derive(Clone, Copy)]
enum Affected {
    Records,
    Transactions,
}

/// Applies a submitted dialog to the store. Only the write happens here; the
/// list is re-read separately so a failed read cannot mask an applied write.
async fn apply_action(
    app_state: &AppState,
    user: &UserSession,
    action: PendingAction,
) -> StoreResult<Affected> {
    let auth = &user.auth;
    match action {
        PendingAction::InsertTimerRecord(record) => {
            let created = app_state.timer_records.insert(auth, &record).await?;
            tracing::info!(record_id = created.id, duration = created.duration, "session saved");
            Ok(Affected::Records)
        }
        PendingAction::UpdateTimerRecord { id, patch } => {
            app_state.timer_records.update(auth, id, &patch).await?;
            tracing::info!(record_id = id, "timer record updated");
            Ok(Affected::Records)
        }
        PendingAction::DeleteTimerRecord(id) => {
            app_state.timer_records.delete(auth, id).await?;
            tracing::info!(record_id = id, "timer record deleted");
            Ok(Affected::Records)
        }
        PendingAction::InsertTransaction(values) => {
            let transaction = NewTransaction {
                values,
                date_time: now_rfc3339(),
            };
            let created = app_state.transactions.insert(auth, &transaction).await?;
            tracing::info!(transaction_id = created.id, "transaction saved");
            Ok(Affected::Transactions)
        }
        PendingAction::UpdateTransaction { id, values } => {
            app_state.transactions.update(auth, id, &values).await?;
            tracing::info!(transaction_id = id, "transaction updated");
            Ok(Affected::Transactions)
        }
        PendingAction::DeleteTransaction(id) => {
            app_state.transactions.delete(auth, id).await?;
            tracing::info!(transaction_id = id, "transaction deleted");
            Ok(Affected::Transactions)
        }
    }
}

pub async fn get_workspace(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Json<WorkspaceView>, AppError> {
    let user = get_current_user(&app_state, &session).await?;
    let workspace = app_state.workspaces.get(user.user_id()).await;
    let workspace = workspace.lock().await;
    Ok(Json(workspace.view(app_state.clock.now())))
}

pub async fn set_tab(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<SetTabPayload>,
) -> Result<Json<WorkspaceView>, AppError> {
    let user = get_current_user(&app_state, &session).await?;
    let workspace = app_state.workspaces.get(user.user_id()).await;
    let mut workspace = workspace.lock().await;
    workspace.set_tab(payload.tab);
    Ok(Json(workspace.view(app_state.clock.now())))
}

pub async fn start_timer(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Json<WorkspaceView>, AppError> {
    let user = get_current_user(&app_state, &session).await?;
    let workspace = app_state.workspaces.get(user.user_id()).await;
    let mut workspace = workspace.lock().await;
    let now = app_state.clock.now();
    workspace.start_timer(now).map_err(rejected)?;
    Ok(Json(workspace.view(now)))
}

pub async fn pause_timer(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Json<WorkspaceView>, AppError> {
    let user = get_current_user(&app_state, &session).await?;
    let workspace = app_state.workspaces.get(user.user_id()).await;
    let mut workspace = workspace.lock().await;
    let now = app_state.clock.now();
    workspace.pause_timer(now).map_err(rejected)?;
    Ok(Json(workspace.view(now)))
}

pub async fn finish_timer(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Json<WorkspaceView>, AppError> {
    let user = get_current_user(&app_state, &session).await?;
    let workspace = app_state.workspaces.get(user.user_id()).await;
    let mut workspace = workspace.lock().await;
    let now = app_state.clock.now();
    let elapsed_ms = workspace.finish_timer(now).map_err(rejected)?;
    tracing::debug!(elapsed_ms, "timer finished");
    Ok(Json(workspace.view(now)))
}

pub async fn open_dialog(
    State(app_state): State<AppState>,
    session: Session,
    Json(request): Json<OpenDialog>,
) -> Result<Json<WorkspaceView>, AppError> {
    let user = get_current_user(&app_state, &session).await?;
    let workspace = app_state.workspaces.get(user.user_id()).await;
    let mut workspace = workspace.lock().await;

    match request {
        OpenDialog::EditRecord { record_id } => {
            let record = match app_state.timer_records.get(&user.auth, record_id).await {
                Ok(record) => record,
                Err(err) => return Err(store_failure(&session, "load record", err).await),
            };
            workspace.open_edit_record(record).map_err(rejected)?;
        }
        OpenDialog::ConfirmDeleteRecord { record_id } => {
            workspace.open_delete_record(record_id).map_err(rejected)?;
        }
        OpenDialog::AddTransaction => {
            workspace.open_add_transaction().map_err(rejected)?;
        }
        OpenDialog::EditTransaction { transaction_id } => {
            let row = match app_state.transactions.get(&user.auth, transaction_id).await {
                Ok(row) => row,
                Err(err) => return Err(store_failure(&session, "load transaction", err).await),
            };
            workspace.open_edit_transaction(&row).map_err(rejected)?;
        }
        OpenDialog::ConfirmDeleteTransaction { transaction_id } => {
            workspace
                .open_delete_transaction(transaction_id)
                .map_err(rejected)?;
        }
    }

    Ok(Json(workspace.view(app_state.clock.now())))
}

pub async fn update_dialog_input(
    State(app_state): State<AppState>,
    session: Session,
    Json(input): Json<DialogInput>,
) -> Result<Json<WorkspaceView>, AppError> {
    let user = get_current_user(&app_state, &session).await?;
    let workspace = app_state.workspaces.get(user.user_id()).await;
    let mut workspace = workspace.lock().await;
    workspace.update_input(input).map_err(rejected)?;
    Ok(Json(workspace.view(app_state.clock.now())))
}

/// Submits the open dialog. Invalid input never reaches the store; a store
/// failure leaves the dialog open so the user can retry. Once the write is
/// applied the dialog closes, whether or not the list can be re-read.
pub async fn confirm_dialog(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Json<ConfirmResponse>, AppError> {
    let user = get_current_user(&app_state, &session).await?;
    let workspace = app_state.workspaces.get(user.user_id()).await;
    let mut workspace = workspace.lock().await;

    let action = workspace.submit(now_rfc3339()).map_err(rejected)?;
    let failure_action = action.failure_action();

    let affected = match apply_action(&app_state, &user, action).await {
        Ok(affected) => affected,
        Err(err) => return Err(store_failure(&session, failure_action, err).await),
    };
    workspace.complete();

    let (records, transactions, reloaded) = match affected {
        Affected::Records => {
            let records = app_state.timer_records.reload(&user.auth).await;
            let reloaded = records.is_some();
            (records, None, reloaded)
        }
        Affected::Transactions => {
            let transactions = app_state.transactions.reload(&user.auth).await;
            let reloaded = transactions.is_some();
            (None, transactions, reloaded)
        }
    };

    Ok(Json(ConfirmResponse {
        workspace: workspace.view(app_state.clock.now()),
        records,
        transactions,
        warning: (!reloaded).then_some(MSG_RELOAD_FAILED),
    }))
}

pub async fn cancel_dialog(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Json<WorkspaceView>, AppError> {
    let user = get_current_user(&app_state, &session).await?;
    let workspace = app_state.workspaces.get(user.user_id()).await;
    let mut workspace = workspace.lock().await;
    workspace.cancel().map_err(rejected)?;
    Ok(Json(workspace.view(app_state.clock.now())))
}

pub async fn get_summary(
    State(app_state): State<AppState>,
    session: Session,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Summary>, AppError> {
    let user = get_current_user(&app_state, &session).await?;

    let result = async {
        let records = app_state.timer_records.list(&user.auth).await?;
        let transactions = app_state.transactions.list(&user.auth).await?;
        StoreResult::Ok((records, transactions))
    }
    .await;

    match result {
        Ok((records, transactions)) => Ok(Json(build_summary(records, &transactions, &query))),
        Err(err) => Err(store_failure(&session, "load summary", err).await),
    }
}

pub async fn get_backup(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Json<Backup>, AppError> {
    let user = get_current_user(&app_state, &session).await?;

    let result = async {
        let timer_records = app_state.timer_records.list(&user.auth).await?;
        let transactions = app_state.transactions.list(&user.auth).await?;
        StoreResult::Ok(Backup {
            exported_at: now_rfc3339(),
            timer_records,
            transactions,
        })
    }
    .await;

    match result {
        Ok(backup) => {
            tracing::info!(
                user_id = %user.user_id(),
                records = backup.timer_records.len(),
                transactions = backup.transactions.len(),
                "backup exported"
            );
            Ok(Json(backup))
        }
        Err(err) => Err(store_failure(&session, "export backup", err).await),
    }
}
