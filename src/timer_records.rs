use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tower_sessions::Session;

use crate::AppState;
use crate::auth::{get_current_user, store_failure};
use crate::error::{AppError, StoreResult};
use crate::models::{
    CreateTimerRecordPayload, NewTimerRecord, TimerRecordPatch, TimerRecordRow,
    TimerRecordsResponse, UpdateTimerRecordPayload, hourly_rate,
};
use crate::remote_store::RemoteTable;
use crate::repository::TimerRecords;
use crate::supabase::AuthSession;
use crate::utils::{now_rfc3339, parse_positive_amount};

/// Validates a manually entered session. Duration must be non-zero.
pub fn new_timer_record(payload: &CreateTimerRecordPayload) -> Result<NewTimerRecord, AppError> {
    if payload.duration == 0 {
        return Err(AppError::Validation(
            "Duration must be greater than zero".to_string(),
        ));
    }
    let amount = parse_positive_amount(&payload.amount)?;
    Ok(NewTimerRecord {
        date: now_rfc3339(),
        duration: payload.duration,
        amount,
        hourly_rate: hourly_rate(payload.duration, amount),
    })
}

pub async fn update_timer_record_for_user(
    table: &RemoteTable<TimerRecords>,
    auth: &AuthSession,
    record_id: i64,
    amount: f64,
) -> StoreResult<TimerRecordRow> {
    let record = table.get(auth, record_id).await?;
    let patch = TimerRecordPatch::for_record(&record, amount);
    table.update(auth, record_id, &patch).await
}

pub async fn get_timer_records(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Json<TimerRecordsResponse>, AppError> {
    let user = get_current_user(&app_state, &session).await?;
    let records = match app_state.timer_records.list(&user.auth).await {
        Ok(records) => records,
        Err(err) => return Err(store_failure(&session, "load records", err).await),
    };
    Ok(Json(TimerRecordsResponse::new(records)))
}

/// Every mutation answers with the re-read list. Once the write is applied the
/// response reports success even when that re-read fails.
pub async fn create_timer_record(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateTimerRecordPayload>,
) -> Result<(StatusCode, Json<TimerRecordsResponse>), AppError> {
    let user = get_current_user(&app_state, &session).await?;
    let record = new_timer_record(&payload)?;

    let created = match app_state.timer_records.insert(&user.auth, &record).await {
        Ok(created) => created,
        Err(err) => return Err(store_failure(&session, "save record", err).await),
    };
    tracing::info!(record_id = created.id, user_id = %user.user_id(), "timer record saved");

    let records = app_state.timer_records.reload(&user.auth).await;
    Ok((
        StatusCode::CREATED,
        Json(TimerRecordsResponse::reloaded(records)),
    ))
}

pub async fn update_timer_record(
    State(app_state): State<AppState>,
    session: Session,
    Path(record_id): Path<i64>,
    Json(payload): Json<UpdateTimerRecordPayload>,
) -> Result<Json<TimerRecordsResponse>, AppError> {
    let user = get_current_user(&app_state, &session).await?;
    let amount = parse_positive_amount(&payload.amount)?;

    if let Err(err) =
        update_timer_record_for_user(&app_state.timer_records, &user.auth, record_id, amount).await
    {
        return Err(store_failure(&session, "update record", err).await);
    }
    tracing::info!(record_id, "timer record updated");

    let records = app_state.timer_records.reload(&user.auth).await;
    Ok(Json(TimerRecordsResponse::reloaded(records)))
}

pub async fn delete_timer_record(
    State(app_state): State<AppState>,
    session: Session,
    Path(record_id): Path<i64>,
) -> Result<Json<TimerRecordsResponse>, AppError> {
    let user = get_current_user(&app_state, &session).await?;

    if let Err(err) = app_state.timer_records.delete(&user.auth, record_id).await {
        return Err(store_failure(&session, "delete record", err).await);
    }
    tracing::info!(record_id, "timer record deleted");

    let records = app_state.timer_records.reload(&user.auth).await;
    Ok(Json(TimerRecordsResponse::reloaded(records)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_record_derives_rate() {
        let record = new_timer_record(&CreateTimerRecordPayload {
            duration: 60_000,
            amount: "500".to_string(),
        })
        .unwrap();
        assert_eq!(record.hourly_rate, 30_000.0);
    }

    #[test]
    fn manual_record_rejects_empty_session_and_bad_amount() {
        let zero = new_timer_record(&CreateTimerRecordPayload {
            duration: 0,
            amount: "500".to_string(),
        });
        assert!(matches!(zero, Err(AppError::Validation(_))));

        let bad = new_timer_record(&CreateTimerRecordPayload {
            duration: 1_000,
            amount: "free".to_string(),
        });
        assert!(matches!(bad, Err(AppError::Validation(_))));
    }
}
