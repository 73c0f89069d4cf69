//! HTTP handlers over the local JSON documents.
//!
//! Responses follow the document API's own envelope: lists come back under
//! the collection name, writes as `{ success, <singular> }`, failures as
//! `{ success: false, error }`.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::constants::ERR_ID_REQUIRED;
use crate::error::StoreError;
use crate::file_store::JsonFileStore;
use crate::models::DeleteDocumentQuery;
use crate::repository::DocumentKind;

fn failure(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(json!({ "success": false, "error": error.into() }))).into_response()
}

fn store_failure<K: DocumentKind>(action: &str, err: StoreError) -> Response {
    match err {
        StoreError::NotFound(label) => failure(StatusCode::NOT_FOUND, format!("{label} not found")),
        StoreError::Conflict(_) => failure(StatusCode::CONFLICT, err.to_string()),
        err => {
            tracing::error!(kind = K::COLLECTION, error = %err, "failed to {action}");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to {action}"),
            )
        }
    }
}

fn saved<K: DocumentKind>(record: K::Record) -> Response {
    match serde_json::to_value(record) {
        Ok(value) => {
            let mut body = Map::new();
            body.insert("success".to_string(), Value::Bool(true));
            body.insert(K::SINGULAR.to_string(), value);
            (StatusCode::OK, Json(Value::Object(body))).into_response()
        }
        Err(err) => store_failure::<K>(&format!("encode {}", K::SINGULAR), err.into()),
    }
}

fn collection<K: DocumentKind>(status: StatusCode, records: Vec<K::Record>) -> Response {
    let records = serde_json::to_value(records).unwrap_or_else(|_| Value::Array(Vec::new()));
    let mut body = Map::new();
    body.insert(K::COLLECTION.to_string(), records);
    (status, Json(Value::Object(body))).into_response()
}

pub async fn list<K: DocumentKind>(State(store): State<JsonFileStore<K>>) -> Response {
    match store.list().await {
        Ok(records) => collection::<K>(StatusCode::OK, records),
        Err(err) => {
            tracing::error!(kind = K::COLLECTION, error = %err, "failed to read document");
            collection::<K>(StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
        }
    }
}

/// Prepends a record. A blank identifier is replaced with a fresh one.
pub async fn create<K: DocumentKind>(
    State(store): State<JsonFileStore<K>>,
    payload: Result<Json<K::Record>, JsonRejection>,
) -> Response {
    let Json(mut record) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    if K::id(&record).trim().is_empty() {
        K::set_id(&mut record, Uuid::new_v4().to_string());
    }
    let record = match K::prepare(record) {
        Ok(record) => record,
        Err((status, message)) => return failure(status, message),
    };

    match store.prepend(record).await {
        Ok(record) => {
            tracing::info!(kind = K::COLLECTION, id = K::id(&record), "document record created");
            saved::<K>(record)
        }
        Err(err) => store_failure::<K>(&format!("save {}", K::SINGULAR), err),
    }
}

pub async fn update<K: DocumentKind>(
    State(store): State<JsonFileStore<K>>,
    payload: Result<Json<K::Record>, JsonRejection>,
) -> Response {
    let Json(record) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let record = match K::prepare(record) {
        Ok(record) => record,
        Err((status, message)) => return failure(status, message),
    };

    match store.replace(record).await {
        Ok(record) => {
            tracing::info!(kind = K::COLLECTION, id = K::id(&record), "document record updated");
            saved::<K>(record)
        }
        Err(err) => store_failure::<K>(&format!("update {}", K::SINGULAR), err),
    }
}

pub async fn delete<K: DocumentKind>(
    State(store): State<JsonFileStore<K>>,
    Query(query): Query<DeleteDocumentQuery>,
) -> Response {
    let Some(id) = query.id.filter(|id| !id.trim().is_empty()) else {
        return failure(StatusCode::BAD_REQUEST, ERR_ID_REQUIRED);
    };

    match store.remove(&id).await {
        Ok(()) => {
            tracing::info!(kind = K::COLLECTION, id = %id, "document record deleted");
            (StatusCode::OK, Json(json!({ "success": true }))).into_response()
        }
        Err(err) => store_failure::<K>(&format!("delete {}", K::SINGULAR), err),
    }
}
