// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::time::Duration;

use crate::bootstrap::{PoolSettings, RetryPolicy};

/// Sequencer configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL or SQLite connection URL
    pub database_url: String,
    /// Pool limits applied by the bootstrap
    pub pool: PoolSettings,
    /// Connection retry budget for the bootstrap
    pub retry: RetryPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required (one of):
    /// - `SEQUENCER_DATABASE_URL`: PostgreSQL or SQLite connection string
    /// - `SEQUENCER_DB_HOST`, `SEQUENCER_DB_USER`, `SEQUENCER_DB_NAME`: parts of a
    ///   PostgreSQL URL (with optional `SEQUENCER_DB_PASSWORD`, `SEQUENCER_DB_PORT`
    ///   and `SEQUENCER_DB_SSL_MODE`)
    ///
    /// Optional (with defaults):
    /// - `SEQUENCER_DB_MAX_OPEN_CONNS`: max pool connections (default: 50)
    /// - `SEQUENCER_DB_MAX_IDLE_CONNS`: idle connections kept warm (default: 10)
    /// - `SEQUENCER_DB_CONN_MAX_LIFETIME_SECS`: connection lifetime (default: 1800)
    /// - `SEQUENCER_DB_CONNECT_ATTEMPTS`: bootstrap attempts (default: 3)
    /// - `SEQUENCER_DB_CONNECT_RETRY_DELAY_MS`: delay between attempts (default: 2000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = match std::env::var("SEQUENCER_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => database_url_from_parts()?,
        };

        let defaults = PoolSettings::default();
        let max_connections = parse_var(
            "SEQUENCER_DB_MAX_OPEN_CONNS",
            defaults.max_connections,
            "must be a positive integer",
        )?;
        let min_connections = parse_var(
            "SEQUENCER_DB_MAX_IDLE_CONNS",
            defaults.min_connections,
            "must be a non-negative integer",
        )?;
        let max_lifetime_secs = parse_var(
            "SEQUENCER_DB_CONN_MAX_LIFETIME_SECS",
            defaults.max_lifetime.as_secs(),
            "must be a number of seconds",
        )?;

        if max_connections == 0 {
            return Err(ConfigError::Invalid(
                "SEQUENCER_DB_MAX_OPEN_CONNS",
                "must be a positive integer",
            ));
        }
        if min_connections > max_connections {
            return Err(ConfigError::Invalid(
                "SEQUENCER_DB_MAX_IDLE_CONNS",
                "must not exceed SEQUENCER_DB_MAX_OPEN_CONNS",
            ));
        }

        let retry_defaults = RetryPolicy::default();
        let max_attempts = parse_var(
            "SEQUENCER_DB_CONNECT_ATTEMPTS",
            retry_defaults.max_attempts,
            "must be a positive integer",
        )?;
        if max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "SEQUENCER_DB_CONNECT_ATTEMPTS",
                "must be a positive integer",
            ));
        }
        let delay_ms = parse_var(
            "SEQUENCER_DB_CONNECT_RETRY_DELAY_MS",
            retry_defaults.delay.as_millis() as u64,
            "must be a number of milliseconds",
        )?;

        Ok(Self {
            database_url,
            pool: PoolSettings {
                max_connections,
                min_connections,
                max_lifetime: Duration::from_secs(max_lifetime_secs),
                ..defaults
            },
            retry: RetryPolicy {
                max_attempts,
                delay: Duration::from_millis(delay_ms),
            },
        })
    }

    /// Whether the configured URL points at a SQLite database.
    pub fn is_sqlite(&self) -> bool {
        self.database_url.starts_with("sqlite:")
    }
}

/// Assemble a PostgreSQL URL from individual `SEQUENCER_DB_*` variables.
///
/// The password is inserted verbatim, so URL-reserved characters in it must
/// already be percent-encoded.
fn database_url_from_parts() -> Result<String, ConfigError> {
    let host = std::env::var("SEQUENCER_DB_HOST")
        .map_err(|_| ConfigError::Missing("SEQUENCER_DATABASE_URL or SEQUENCER_DB_HOST"))?;
    let user =
        std::env::var("SEQUENCER_DB_USER").map_err(|_| ConfigError::Missing("SEQUENCER_DB_USER"))?;
    let name =
        std::env::var("SEQUENCER_DB_NAME").map_err(|_| ConfigError::Missing("SEQUENCER_DB_NAME"))?;
    let port: u16 = parse_var("SEQUENCER_DB_PORT", 5432, "must be a valid port number")?;
    let ssl_mode =
        std::env::var("SEQUENCER_DB_SSL_MODE").unwrap_or_else(|_| "disable".to_string());

    let credentials = match std::env::var("SEQUENCER_DB_PASSWORD") {
        Ok(password) if !password.is_empty() => format!("{}:{}", user, password),
        _ => user,
    };

    Ok(format!(
        "postgres://{}@{}:{}/{}?sslmode={}",
        credentials, host, port, name, ssl_mode
    ))
}

fn parse_var<T: std::str::FromStr>(
    key: &'static str,
    default: T,
    hint: &'static str,
) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(key, hint)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
