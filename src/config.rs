//! Process configuration, read once at startup.

use chrono::Duration;
use std::{env, fmt, str::FromStr};
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TTL_SECONDS: i64 = 3600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("USER_STORE=none requires ALLOW_UNVERIFIED_LOGIN=true")]
    UnverifiedLoginNotAllowed,
}

/// Where login and token validation resolve subject ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStore {
    /// Seeded in-memory users
    Memory,
    Postgres { database_url: String },
    /// No store: every subject id is trusted with no role
    Unverified,
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub user_store: UserStore,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = match &self.user_store {
            UserStore::Memory => "memory",
            UserStore::Postgres { .. } => "postgres",
            UserStore::Unverified => "none",
        };
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_ttl_seconds", &self.jwt_ttl.num_seconds())
            .field("user_store", &store)
            .finish()
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or("PORT", var("PORT"), DEFAULT_PORT)?;

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let ttl_seconds: i64 = parse_or(
            "JWT_TTL_SECONDS",
            var("JWT_TTL_SECONDS"),
            DEFAULT_TTL_SECONDS,
        )?;
        if ttl_seconds <= 0 {
            return Err(ConfigError::Invalid {
                key: "JWT_TTL_SECONDS",
                value: ttl_seconds.to_string(),
                reason: "must be a positive number of seconds",
            });
        }
        let jwt_ttl = Duration::try_seconds(ttl_seconds).ok_or(ConfigError::Invalid {
            key: "JWT_TTL_SECONDS",
            value: ttl_seconds.to_string(),
            reason: "out of range",
        })?;

        let allow_unverified: bool =
            parse_or("ALLOW_UNVERIFIED_LOGIN", var("ALLOW_UNVERIFIED_LOGIN"), false)?;
        let store = var("USER_STORE").map(|v| v.to_ascii_lowercase());
        let user_store = match store.as_deref() {
            None | Some("memory") => UserStore::Memory,
            Some("postgres") => UserStore::Postgres {
                database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            },
            Some("none") if allow_unverified => UserStore::Unverified,
            Some("none") => return Err(ConfigError::UnverifiedLoginNotAllowed),
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "USER_STORE",
                    value: other.to_string(),
                    reason: "expected memory, postgres or none",
                })
            }
        };

        Ok(AppConfig {
            host,
            port,
            jwt_secret,
            jwt_ttl,
            user_store,
        })
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            value,
            reason: "could not be parsed",
        }),
    }
}
