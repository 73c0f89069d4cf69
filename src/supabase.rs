//! Client for the hosted auth service and its REST table gateway.

use std::fmt;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::{PROFILES_TABLE, SESSION_EXPIRY_SKEW_SECONDS};
use crate::error::{StoreError, StoreResult};
use crate::models::Profile;
use crate::utils::unix_timestamp_now;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + SESSION_EXPIRY_SKEW_SECONDS
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Result of creating an account. A session is only present when the
/// provider does not require email confirmation.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<AuthSession>,
}

#[derive(Clone)]
pub struct SupabaseClient {
    auth_url: String,
    rest_url: String,
    anon_key: String,
    http: Client,
}

impl SupabaseClient {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>) -> StoreResult<Self> {
        let base = url.as_ref().trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(StoreError::InvalidConfiguration(
                "Supabase URL must include http:// or https://",
            ));
        }
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(StoreError::InvalidConfiguration(
                "Supabase anon key must not be empty",
            ));
        }

        Ok(Self {
            auth_url: format!("{base}/auth/v1"),
            rest_url: format!("{base}/rest/v1"),
            anon_key,
            http: Client::builder().build()?,
        })
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> StoreResult<SignUpOutcome> {
        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let request = self.public_request(
            self.http
                .post(format!("{}/signup", self.auth_url))
                .json(&payload),
        );
        let response: AuthResponse = read_json(request.send().await?).await?;
        response.into_sign_up()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> StoreResult<AuthSession> {
        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let request = self.public_request(
            self.http
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", "password")])
                .json(&payload),
        );
        let response: AuthResponse = read_json(request.send().await?).await?;
        response.into_session()?.ok_or_else(|| {
            StoreError::Api("Sign-in response did not include an active session".to_string())
        })
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> StoreResult<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(StoreError::Unauthorized);
        }
        let payload = serde_json::json!({ "refresh_token": refresh_token });
        let request = self.public_request(
            self.http
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", "refresh_token")])
                .json(&payload),
        );
        let response: AuthResponse = read_json(request.send().await?).await?;
        response.into_session()?.ok_or(StoreError::Unauthorized)
    }

    pub async fn sign_out(&self, access_token: &str) -> StoreResult<()> {
        let response = self
            .http
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Api(parse_api_error(status, &body)))
    }

    /// Finds the profile registered under a login handle.
    pub async fn find_profile(&self, username: &str) -> StoreResult<Option<Profile>> {
        let request = self
            .table_request(Method::GET, PROFILES_TABLE, None)
            .query(&[
                ("select", "id,username,email,phone".to_string()),
                ("username", format!("eq.{username}")),
                ("limit", "1".to_string()),
            ]);
        let profiles: Vec<Profile> = read_json(request.send().await?).await?;
        Ok(profiles.into_iter().next())
    }

    pub async fn insert_profile(
        &self,
        profile: &Profile,
        session: Option<&AuthSession>,
    ) -> StoreResult<()> {
        let request = self
            .table_request(
                Method::POST,
                PROFILES_TABLE,
                session.map(|session| session.access_token.as_str()),
            )
            .header("Prefer", "return=minimal")
            .json(&[profile]);
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(error_from_response(response).await)
    }

    /// Request against a REST table, authorized as the given user or, without
    /// a token, as the anonymous role.
    pub(crate) fn table_request(
        &self,
        method: Method,
        table: &str,
        access_token: Option<&str>,
    ) -> RequestBuilder {
        let token = access_token.unwrap_or(&self.anon_key);
        self.http
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .header("Accept", "application/json")
    }

    fn public_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }
}

/// Reads a successful response into a strict type, or turns a failed one
/// into a store error.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|err| StoreError::Schema(err.to_string()))
}

pub(crate) async fn error_from_response(response: Response) -> StoreError {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return StoreError::Unauthorized;
    }
    let body = response.text().await.unwrap_or_default();
    StoreError::Api(parse_api_error(status, &body))
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<SupabaseUser>,
    // Sign-up without a session returns the user object at the top level.
    id: Option<String>,
    email: Option<String>,
}

impl AuthResponse {
    fn user(&self) -> Option<AuthUser> {
        match (&self.user, &self.id) {
            (Some(user), _) => Some(AuthUser {
                id: user.id.clone(),
                email: user.email.clone(),
            }),
            (None, Some(id)) => Some(AuthUser {
                id: id.clone(),
                email: self.email.clone(),
            }),
            (None, None) => None,
        }
    }

    fn into_session(self) -> StoreResult<Option<AuthSession>> {
        let user = self.user();
        let expires_at = self.expires_at.or_else(|| {
            self.expires_in
                .map(|expires_in| unix_timestamp_now().saturating_add(expires_in))
        });

        match (self.access_token, self.refresh_token, expires_at, user) {
            (Some(access_token), Some(refresh_token), Some(expires_at), Some(user)) => {
                Ok(Some(AuthSession {
                    access_token,
                    refresh_token,
                    expires_at,
                    user,
                }))
            }
            (None, None, _, Some(_)) => Ok(None),
            _ => Err(StoreError::Schema(
                "auth response did not include enough session fields".to_string(),
            )),
        }
    }

    fn into_sign_up(self) -> StoreResult<SignUpOutcome> {
        let user = self
            .user()
            .ok_or_else(|| StoreError::Schema("sign-up response did not include a user".to_string()))?;
        let session = self.into_session()?;
        Ok(SignUpOutcome { user, session })
    }
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SupabaseErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    msg: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<SupabaseErrorResponse>(body) {
        if let Some(message) = payload
            .message
            .or(payload.msg)
            .or(payload.error_description)
            .or(payload.error)
        {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
