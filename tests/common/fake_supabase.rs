//! In-process stand-in for the hosted auth service and table gateway.
//!
//! Implements the slice of the GoTrue and PostgREST APIs the server uses:
//! sign-up, password and refresh-token grants, logout, and table reads and
//! writes with `eq.` filters, `col.desc` ordering and per-account row scoping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use uuid::Uuid;

pub const ANON_KEY: &str = "test-anon-key";
const PROFILES: &str = "profiles";

struct FakeUser {
    id: String,
    email: String,
    password: String,
}

#[derive(Default)]
struct FakeDb {
    users: Vec<FakeUser>,
    access_tokens: HashMap<String, String>,
    refresh_tokens: HashMap<String, String>,
    tables: HashMap<String, Vec<Value>>,
    next_id: i64,
    next_token: u64,
    table_writes: usize,
    fail_writes: bool,
    fail_reads: bool,
    fail_profile_writes: bool,
    expired_sessions: bool,
}

impl FakeDb {
    fn issue_session(&mut self, user_id: &str) -> Value {
        self.next_token += 1;
        let access_token = format!("access-{}", self.next_token);
        let refresh_token = format!("refresh-{}", self.next_token);
        self.access_tokens
            .insert(access_token.clone(), user_id.to_string());
        self.refresh_tokens
            .insert(refresh_token.clone(), user_id.to_string());
        let email = self
            .users
            .iter()
            .find(|user| user.id == user_id)
            .map(|user| user.email.clone());
        json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": if self.expired_sessions { 0 } else { 3600 },
            "refresh_token": refresh_token,
            "user": { "id": user_id, "email": email },
        })
    }
}

type SharedDb = Arc<Mutex<FakeDb>>;

enum Caller {
    Anon,
    User(String),
}

#[derive(Clone)]
pub struct FakeSupabase {
    pub url: String,
    db: SharedDb,
}

impl FakeSupabase {
    pub async fn start() -> anyhow::Result<Self> {
        let db: SharedDb = Arc::new(Mutex::new(FakeDb::default()));
        let router = Router::new()
            .route("/auth/v1/signup", post(signup))
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/logout", post(logout))
            .route(
                "/rest/v1/{table}",
                get(select_rows)
                    .post(insert_rows)
                    .patch(update_rows)
                    .delete(delete_rows),
            )
            .with_state(db.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self {
            url: format!("http://{address}"),
            db,
        })
    }

    /// Write requests received for the record tables, failed ones included.
    pub fn table_writes(&self) -> usize {
        self.db.lock().unwrap().table_writes
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.db
            .lock()
            .unwrap()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.db.lock().unwrap().fail_writes = fail;
    }

    /// Record-table selects fail; writes and profile lookups still work.
    pub fn set_fail_reads(&self, fail: bool) {
        self.db.lock().unwrap().fail_reads = fail;
    }

    pub fn set_fail_profile_writes(&self, fail: bool) {
        self.db.lock().unwrap().fail_profile_writes = fail;
    }

    /// Makes every newly issued session already expired.
    pub fn set_expired_sessions(&self, expired: bool) {
        self.db.lock().unwrap().expired_sessions = expired;
    }

    pub fn revoke_access_tokens(&self) {
        self.db.lock().unwrap().access_tokens.clear();
    }

    pub fn revoke_refresh_tokens(&self) {
        self.db.lock().unwrap().refresh_tokens.clear();
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn caller(db: &FakeDb, headers: &HeaderMap) -> Option<Caller> {
    let token = headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    if token == ANON_KEY {
        return Some(Caller::Anon);
    }
    db.access_tokens.get(token).cloned().map(Caller::User)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn matches_filters(row: &Value, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(column, filter)| {
        filter
            .strip_prefix("eq.")
            .is_some_and(|expected| value_text(&row[column.as_str()]) == expected)
    })
}

/// Splits query parameters into `eq.` filters and an optional ordering.
fn parse_params(params: Vec<(String, String)>) -> (Vec<(String, String)>, Option<(String, bool)>) {
    let mut filters = Vec::new();
    let mut order = None;
    for (key, value) in params {
        match key.as_str() {
            "select" | "limit" => {}
            "order" => {
                let (column, direction) = value.split_once('.').unwrap_or((value.as_str(), "asc"));
                order = Some((column.to_string(), direction == "desc"));
            }
            _ => filters.push((key, value)),
        }
    }
    (filters, order)
}

/// Row-level scoping: data tables only expose the caller's own rows.
fn visible(table: &str, caller: &Caller, row: &Value) -> bool {
    match caller {
        Caller::User(user_id) => table == PROFILES || row["user_id"] == json!(user_id),
        Caller::Anon => table == PROFILES,
    }
}

async fn signup(State(db): State<SharedDb>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    let mut db = db.lock().unwrap();
    if db.users.iter().any(|user| user.email == email) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "code": 422, "msg": "User already registered" })),
        )
            .into_response();
    }
    let id = Uuid::new_v4().to_string();
    db.users.push(FakeUser {
        id: id.clone(),
        email: email.clone(),
        password,
    });
    // Email confirmation is on, so no session comes back.
    Json(json!({ "id": id, "email": email })).into_response()
}

#[derive(Deserialize)]
struct GrantQuery {
    grant_type: String,
}

async fn token(
    State(db): State<SharedDb>,
    Query(query): Query<GrantQuery>,
    Json(body): Json<Value>,
) -> Response {
    let mut db = db.lock().unwrap();
    let user_id = match query.grant_type.as_str() {
        "password" => {
            let email = body["email"].as_str().unwrap_or_default();
            let password = body["password"].as_str().unwrap_or_default();
            db.users
                .iter()
                .find(|user| user.email == email && user.password == password)
                .map(|user| user.id.clone())
        }
        "refresh_token" => body["refresh_token"]
            .as_str()
            .and_then(|token| db.refresh_tokens.remove(token)),
        _ => None,
    };

    match user_id {
        Some(user_id) => Json(db.issue_session(&user_id)).into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials",
            })),
        )
            .into_response(),
    }
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn select_rows(
    State(db): State<SharedDb>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let db = db.lock().unwrap();
    let Some(caller) = caller(&db, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "JWT expired");
    };
    if db.fail_reads && table != PROFILES {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let (filters, order) = parse_params(params);

    let mut rows: Vec<Value> = db
        .tables
        .get(&table)
        .map(|rows| {
            rows.iter()
                .filter(|row| visible(&table, &caller, row) && matches_filters(row, &filters))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    if let Some((column, descending)) = order {
        rows.sort_by(|a, b| {
            let ordering = value_text(&a[column.as_str()]).cmp(&value_text(&b[column.as_str()]));
            if descending { ordering.reverse() } else { ordering }
        });
    }
    Json(rows).into_response()
}

async fn insert_rows(
    State(db): State<SharedDb>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Vec<Map<String, Value>>>,
) -> Response {
    let mut db = db.lock().unwrap();
    let Some(caller) = caller(&db, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "JWT expired");
    };

    if table == PROFILES {
        if db.fail_profile_writes {
            return error(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
        }
        let rows = db.tables.entry(table).or_default();
        rows.extend(body.into_iter().map(Value::Object));
        return StatusCode::CREATED.into_response();
    }

    db.table_writes += 1;
    if db.fail_writes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let Caller::User(user_id) = caller else {
        return error(StatusCode::UNAUTHORIZED, "JWT required");
    };

    let mut inserted = Vec::new();
    for mut row in body {
        if row.get("user_id") != Some(&json!(user_id)) {
            return error(
                StatusCode::FORBIDDEN,
                "new row violates row-level security policy",
            );
        }
        db.next_id += 1;
        row.insert("id".to_string(), json!(db.next_id));
        row.insert(
            "created_at".to_string(),
            json!(format!("2024-01-01T00:00:{:02}+00:00", db.next_id % 60)),
        );
        inserted.push(Value::Object(row));
    }
    db.tables
        .entry(table)
        .or_default()
        .extend(inserted.iter().cloned());
    (StatusCode::CREATED, Json(inserted)).into_response()
}

async fn update_rows(
    State(db): State<SharedDb>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
    Json(patch): Json<Map<String, Value>>,
) -> Response {
    let mut db = db.lock().unwrap();
    let Some(caller) = caller(&db, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "JWT expired");
    };
    db.table_writes += 1;
    if db.fail_writes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let (filters, _) = parse_params(params);

    let mut updated = Vec::new();
    if let Some(rows) = db.tables.get_mut(&table) {
        for row in rows.iter_mut() {
            if visible(&table, &caller, row) && matches_filters(row, &filters) {
                if let Value::Object(fields) = &mut *row {
                    for (key, value) in &patch {
                        fields.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
    }
    Json(updated).into_response()
}

async fn delete_rows(
    State(db): State<SharedDb>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let mut db = db.lock().unwrap();
    let Some(caller) = caller(&db, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "JWT expired");
    };
    db.table_writes += 1;
    if db.fail_writes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let (filters, _) = parse_params(params);

    let mut removed = Vec::new();
    if let Some(rows) = db.tables.get_mut(&table) {
        rows.retain(|row| {
            if visible(&table, &caller, row) && matches_filters(row, &filters) {
                removed.push(row.clone());
                false
            } else {
                true
            }
        });
    }
    Json(removed).into_response()
}
