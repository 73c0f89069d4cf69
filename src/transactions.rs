use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tower_sessions::Session;

use crate::AppState;
use crate::auth::{get_current_user, store_failure};
use crate::error::AppError;
use crate::models::{NewTransaction, TransactionForm, TransactionsResponse};
use crate::utils::{now_rfc3339, validate_transaction_form};

pub async fn get_transactions(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Json<TransactionsResponse>, AppError> {
    let user = get_current_user(&app_state, &session).await?;
    match app_state.transactions.list(&user.auth).await {
        Ok(transactions) => Ok(Json(TransactionsResponse::new(transactions))),
        Err(err) => Err(store_failure(&session, "load transactions", err).await),
    }
}

/// Validation runs before any store call, so an empty item never leaves
/// the server.
pub async fn create_transaction(
    State(app_state): State<AppState>,
    session: Session,
    Json(form): Json<TransactionForm>,
) -> Result<(StatusCode, Json<TransactionsResponse>), AppError> {
    let user = get_current_user(&app_state, &session).await?;
    let transaction = NewTransaction {
        values: validate_transaction_form(&form)?,
        date_time: now_rfc3339(),
    };

    let created = match app_state.transactions.insert(&user.auth, &transaction).await {
        Ok(created) => created,
        Err(err) => return Err(store_failure(&session, "save transaction", err).await),
    };
    tracing::info!(transaction_id = created.id, user_id = %user.user_id(), "transaction saved");

    let transactions = app_state.transactions.reload(&user.auth).await;
    Ok((
        StatusCode::CREATED,
        Json(TransactionsResponse::reloaded(transactions)),
    ))
}

pub async fn update_transaction(
    State(app_state): State<AppState>,
    session: Session,
    Path(transaction_id): Path<i64>,
    Json(form): Json<TransactionForm>,
) -> Result<Json<TransactionsResponse>, AppError> {
    let user = get_current_user(&app_state, &session).await?;
    let values = validate_transaction_form(&form)?;

    if let Err(err) = app_state
        .transactions
        .update(&user.auth, transaction_id, &values)
        .await
    {
        return Err(store_failure(&session, "update transaction", err).await);
    }
    tracing::info!(transaction_id, "transaction updated");

    let transactions = app_state.transactions.reload(&user.auth).await;
    Ok(Json(TransactionsResponse::reloaded(transactions)))
}

pub async fn delete_transaction(
    State(app_state): State<AppState>,
    session: Session,
    Path(transaction_id): Path<i64>,
) -> Result<Json<TransactionsResponse>, AppError> {
    let user = get_current_user(&app_state, &session).await?;

    if let Err(err) = app_state
        .transactions
        .delete(&user.auth, transaction_id)
        .await
    {
        return Err(store_failure(&session, "delete transaction", err).await);
    }
    tracing::info!(transaction_id, "transaction deleted");

    let transactions = app_state.transactions.reload(&user.auth).await;
    Ok(Json(TransactionsResponse::reloaded(transactions)))
}
