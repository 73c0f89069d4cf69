use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::AppState;
use crate::constants::*;
use crate::error::{AppError, StoreError};
use crate::models::{
    LoginPayload, LoginResponse, Profile, PublicUser, RegisterPayload, RegisterResponse,
};
use crate::supabase::AuthSession;
use crate::utils::{validate_email, validate_password, validate_username};

/// What the cookie session remembers about a signed-in account.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserSession {
    pub username: String,
    pub auth: AuthSession,
}

impl UserSession {
    pub fn user_id(&self) -> &str {
        &self.auth.user.id
    }

    pub fn public_user(&self) -> PublicUser {
        PublicUser {
            id: self.auth.user.id.clone(),
            username: self.username.clone(),
            email: self.auth.user.email.clone(),
        }
    }
}

fn session_error() -> AppError {
    AppError::Store {
        action: "update session",
        source: StoreError::Api("session store unavailable".to_string()),
    }
}

pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    validate_username(&payload.username)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    let username = payload.username.trim();
    let email = payload.email.trim();
    let phone = payload
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|phone| !phone.is_empty())
        .map(str::to_string);

    let existing = app_state
        .supabase
        .find_profile(username)
        .await
        .map_err(|err| AppError::store("check username", err))?;
    if existing.is_some() {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let outcome = app_state
        .supabase
        .sign_up(email, &payload.password)
        .await
        .map_err(|err| AppError::store("create account", err))?;

    let profile = Profile {
        id: outcome.user.id.clone(),
        username: username.to_string(),
        email: email.to_string(),
        phone,
    };
    // The account already exists at this point; without its profile row the
    // handle cannot sign in and the email cannot register again.
    if let Err(err) = app_state
        .supabase
        .insert_profile(&profile, outcome.session.as_ref())
        .await
    {
        tracing::error!(
            user_id = %profile.id,
            username = %profile.username,
            error = %err,
            "account created without a profile"
        );
        return Err(AppError::store("create profile", err));
    }

    tracing::info!(user_id = %profile.id, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: PublicUser {
                id: profile.id,
                username: profile.username,
                email: Some(profile.email),
            },
            verify_email: true,
            message: MSG_VERIFY_EMAIL,
        }),
    ))
}

pub async fn login(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    let invalid_login = || AppError::AuthFailed(ERR_INVALID_LOGIN.to_string());

    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(invalid_login());
    }

    let profile = match app_state.supabase.find_profile(username).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return Err(invalid_login()),
        Err(err) => {
            tracing::warn!(error = %err, "username lookup failed");
            return Err(invalid_login());
        }
    };

    let auth = app_state
        .supabase
        .sign_in(&profile.email, &payload.password)
        .await
        .map_err(|err| {
            tracing::info!(error = %err, "sign-in rejected");
            invalid_login()
        })?;

    let user_session = UserSession {
        username: profile.username,
        auth,
    };

    session.cycle_id().await.map_err(|_| session_error())?;
    session
        .insert(AUTH_SESSION_KEY, &user_session)
        .await
        .map_err(|_| session_error())?;

    tracing::info!(user_id = %user_session.user_id(), "signed in");

    Ok(Json(LoginResponse {
        user: user_session.public_user(),
        redirect_to: HOME_PATH,
    }))
}

pub async fn me(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Json<PublicUser>, AppError> {
    let user = get_current_user(&app_state, &session).await?;
    Ok(Json(user.public_user()))
}

pub async fn logout(State(app_state): State<AppState>, session: Session) -> Result<Redirect, AppError> {
    let stored: Option<UserSession> = session
        .get(AUTH_SESSION_KEY)
        .await
        .map_err(|_| session_error())?;

    if let Some(user) = stored {
        if let Err(err) = app_state.supabase.sign_out(&user.auth.access_token).await {
            tracing::warn!(error = %err, "provider sign-out failed");
        }
        app_state.workspaces.remove(user.user_id()).await;
    }

    session.flush().await.map_err(|_| session_error())?;
    Ok(Redirect::to(LOGIN_PATH))
}

/// Resolves the signed-in account, refreshing an expired provider session
/// once. A missing or unrefreshable session is `Unauthenticated`.
pub async fn get_current_user(
    app_state: &AppState,
    session: &Session,
) -> Result<UserSession, AppError> {
    let stored: Option<UserSession> = session
        .get(AUTH_SESSION_KEY)
        .await
        .map_err(|_| AppError::Unauthenticated)?;
    let mut user = stored.ok_or(AppError::Unauthenticated)?;

    if !user.auth.is_expired() {
        return Ok(user);
    }

    match app_state
        .supabase
        .refresh_session(&user.auth.refresh_token)
        .await
    {
        Ok(auth) => {
            user.auth = auth;
            session
                .insert(AUTH_SESSION_KEY, &user)
                .await
                .map_err(|_| session_error())?;
            Ok(user)
        }
        Err(err) => {
            tracing::warn!(error = %err, "session refresh failed");
            clear_session(session).await;
            Err(AppError::Unauthenticated)
        }
    }
}

/// Drops the stored session, e.g. after the store rejected its token.
pub async fn clear_session(session: &Session) {
    if let Err(err) = session.flush().await {
        tracing::warn!(error = %err, "failed to clear session");
    }
}

/// Turns an adapter failure into a handler error, signing the caller out
/// when the store no longer accepts the session.
pub async fn store_failure(session: &Session, action: &'static str, err: StoreError) -> AppError {
    if matches!(err, StoreError::Unauthorized) {
        clear_session(session).await;
    }
    AppError::store(action, err)
}

pub async fn root(State(app_state): State<AppState>, session: Session) -> Response {
    match get_current_user(&app_state, &session).await {
        Ok(user) => Html(format!(
            "<h1>RC Garage</h1><p>Signed in as {}</p>",
            escape_html(&user.username)
        ))
        .into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn login_page() -> Html<&'static str> {
    Html("<h1>RC Garage</h1><p>Sign in with POST /auth/login</p>")
}

pub async fn register_page() -> Html<&'static str> {
    Html("<h1>RC Garage</h1><p>Create an account with POST /auth/register</p>")
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
