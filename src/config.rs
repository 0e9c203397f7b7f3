//! Server configuration, read from the environment (and `.env` when present).

use chrono::Duration;
use thiserror::Error;

use crate::auth::jwks::resolve_jwks_url;
use crate::services::SweepThresholds;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is not a valid value: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("no JWKS endpoint: set CLERK_PUBLISHABLE_KEY or CLERK_JWKS_URL")]
    NoJwksEndpoint,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    /// Publishable key of the identity provider instance; the JWKS host is encoded in it
    pub clerk_publishable_key: Option<String>,
    /// Used when the publishable key is absent or cannot be decoded
    pub clerk_jwks_url: Option<String>,
    pub nats_url: Option<String>,
    pub sweep: SweepThresholds,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match var(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 10)?,
            port: parsed("PORT", 8083)?,
            clerk_publishable_key: var("CLERK_PUBLISHABLE_KEY"),
            clerk_jwks_url: var("CLERK_JWKS_URL"),
            nats_url: var("NATS_URL"),
            sweep: SweepThresholds {
                overdue_after: Duration::hours(parsed("ORDER_OVERDUE_AFTER_HOURS", 48)?),
                new_within: Duration::hours(parsed("ORDER_NEW_WITHIN_HOURS", 24)?),
            },
        })
    }

    pub fn jwks_url(&self) -> Result<String, ConfigError> {
        resolve_jwks_url(self.clerk_publishable_key.as_deref(), self.clerk_jwks_url.as_deref())
            .ok_or(ConfigError::NoJwksEndpoint)
    }
}
