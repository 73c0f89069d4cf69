use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::constants::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    pub data_path: String,
    pub session_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub frontend_origin: String,
    pub production: bool,
    pub workspace_pool_size: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_path", &self.data_path)
            .field("session_secret", &"[REDACTED]")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_anon_key", &"[REDACTED]")
            .field("frontend_origin", &self.frontend_origin)
            .field("production", &self.production)
            .field("workspace_pool_size", &self.workspace_pool_size)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = std::env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = value_or_default(&lookup, "HOST", DEFAULT_HOST);
        let port = value_or_default(&lookup, "PORT", DEFAULT_PORT);
        port.parse::<u16>()
            .map_err(|_| ConfigError::Invalid(format!("PORT must be a valid port, got '{port}'")))?;

        let data_path = value_or_default(&lookup, "DATA_PATH", DEFAULT_DATA_PATH);

        let session_secret = required_trimmed(&lookup, "SESSION_SECRET")?;
        if session_secret.len() < MIN_SESSION_SECRET_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "SESSION_SECRET must be at least {MIN_SESSION_SECRET_LENGTH} characters"
            )));
        }

        let supabase_url = required_trimmed(&lookup, "SUPABASE_URL")?;
        if !is_http_url(&supabase_url) {
            return Err(ConfigError::Invalid(
                "SUPABASE_URL must start with http:// or https://".to_string(),
            ));
        }
        let supabase_url = supabase_url.trim_end_matches('/').to_string();
        let supabase_anon_key = required_trimmed(&lookup, "SUPABASE_ANON_KEY")?;

        let frontend_origin = value_or_default(&lookup, "FRONTEND_ORIGIN", DEFAULT_FRONTEND_ORIGIN);

        let production = optional_trimmed(&lookup, "PRODUCTION")
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let workspace_pool_size = match optional_trimmed(&lookup, "WORKSPACE_POOL_SIZE") {
            Some(value) => value
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| {
                    ConfigError::Invalid("WORKSPACE_POOL_SIZE must be a positive integer".to_string())
                })?,
            None => DEFAULT_WORKSPACE_POOL_SIZE,
        };

        Ok(Self {
            host,
            port,
            data_path,
            session_secret,
            supabase_url,
            supabase_anon_key,
            frontend_origin,
            production,
            workspace_pool_size,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional_trimmed(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}
