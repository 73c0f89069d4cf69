#![allow(dead_code)]

pub mod fake_supabase;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use rc_garage_server::{AppState, config::Config, constants::*, router::api_router, timer::ManualClock};
use serde_json::{Value, json};
use time::Duration;
use tower::util::ServiceExt;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};

use fake_supabase::{ANON_KEY, FakeSupabase};

pub const TEST_PASSWORD: &str = "secret123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub supabase: FakeSupabase,
    pub clock: ManualClock,
    pub data_path: PathBuf,
}

pub async fn setup_test_app() -> anyhow::Result<TestApp> {
    let temp_dir = tempfile::tempdir()?;
    let data_path = temp_dir.path().to_path_buf();
    std::mem::forget(temp_dir);

    let supabase = FakeSupabase::start().await?;

    let mut env = HashMap::new();
    env.insert(
        "SESSION_SECRET",
        "test_secret_key_at_least_64_chars_long_test_secret_key_at_least_64_".to_string(),
    );
    env.insert("SUPABASE_URL", supabase.url.clone());
    env.insert("SUPABASE_ANON_KEY", ANON_KEY.to_string());
    env.insert("DATA_PATH", data_path.to_string_lossy().to_string());
    let config = Config::from_lookup(|name| env.get(name).cloned())?;

    let clock = ManualClock::new();
    let app_state = AppState::new(&config)?.with_clock(Arc::new(clock.clone()));

    let store = MemoryStore::default();
    let session_key = Key::try_from(config.session_secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid session secret: {}", e))?;

    let session_layer = SessionManagerLayer::new(store)
        .with_secure(false)
        .with_name(SESSION_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_signed(session_key);

    let router = api_router()
        .layer(session_layer)
        .with_state(app_state.clone());

    Ok(TestApp {
        router,
        state: app_state,
        supabase,
        clock,
        data_path,
    })
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers.get("location").and_then(|v| v.to_str().ok())
    }

    /// The cookie pair to send back, without its attributes.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

pub async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    payload: Option<Value>,
) -> anyhow::Result<TestResponse> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    let body = match payload {
        Some(payload) => {
            builder = builder.header("content-type", "application/json");
            Body::from(payload.to_string())
        }
        None => Body::empty(),
    };
    let request = builder
        .body(body)
        .map_err(|e| anyhow::anyhow!("Failed to build request: {}", e))?;

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute request: {}", e))?;

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read response body: {}", e))?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    Ok(TestResponse {
        status,
        headers,
        body,
    })
}

/// Sends a raw body, for malformed-payload cases.
pub async fn send_raw(
    app: &TestApp,
    method: &str,
    uri: &str,
    raw_body: &str,
) -> anyhow::Result<TestResponse> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(raw_body.to_string()))
        .map_err(|e| anyhow::anyhow!("Failed to build request: {}", e))?;
    let response = app.router.clone().oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Ok(TestResponse {
        status,
        headers,
        body,
    })
}

pub async fn register_user(app: &TestApp, username: &str) -> anyhow::Result<TestResponse> {
    send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": TEST_PASSWORD,
        })),
    )
    .await
}

pub async fn login_user(app: &TestApp, username: &str, password: &str) -> anyhow::Result<String> {
    let response = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await?;
    if response.status != StatusCode::OK {
        anyhow::bail!("login failed with {}: {}", response.status, response.body);
    }
    response
        .session_cookie()
        .ok_or_else(|| anyhow::anyhow!("No session cookie in response"))
}

pub async fn register_and_login(app: &TestApp, username: &str) -> anyhow::Result<String> {
    let registered = register_user(app, username).await?;
    if registered.status != StatusCode::CREATED {
        anyhow::bail!("registration failed with {}: {}", registered.status, registered.body);
    }
    login_user(app, username, TEST_PASSWORD).await
}
