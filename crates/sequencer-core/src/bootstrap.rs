// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Datastore bootstrap.
//!
//! [`DatastoreBootstrap`] establishes the single pool handle shared by the
//! whole process. It tolerates a database that is not reachable yet by
//! retrying a fixed number of times with a fixed delay, and it records the
//! outcome exactly once: every later (or concurrent) call to
//! [`DatastoreBootstrap::init_client`] observes the same pool or the same
//! error without touching the network again.
//!
//! # Example
//!
//! ```ignore
//! use sequencer_core::bootstrap::{DatastoreBootstrap, PostgresConnector};
//!
//! let bootstrap = DatastoreBootstrap::new(
//!     PostgresConnector::new(&config.database_url),
//!     config.pool.clone(),
//!     config.retry.clone(),
//! );
//! let pool = bootstrap.init_client().await?;
//! ```

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::pool::PoolOptions;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Database, Pool, Postgres, Sqlite};
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::error::{CoreError, Result};

/// Connection-pool limits applied to every pool the bootstrap creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Maximum number of open connections.
    pub max_connections: u32,
    /// Idle connections the pool keeps warm.
    pub min_connections: u32,
    /// Connections older than this are closed and replaced.
    pub max_lifetime: Duration,
    /// Idle connections above `min_connections` are closed after this long.
    pub idle_timeout: Duration,
    /// How long a single connection attempt may wait for a connection.
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 50,
            min_connections: 10,
            max_lifetime: Duration::from_secs(30 * 60),
            idle_timeout: Duration::from_secs(10 * 60),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolSettings {
    /// Build sqlx pool options carrying these limits.
    pub fn pool_options<DB: Database>(&self) -> PoolOptions<DB> {
        PoolOptions::<DB>::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .max_lifetime(self.max_lifetime)
            .idle_timeout(self.idle_timeout)
            .acquire_timeout(self.acquire_timeout)
    }
}

/// Retry budget for establishing the first connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of connection attempts (at least one is always made).
    pub max_attempts: u32,
    /// Fixed delay between two consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Opens a tuned connection pool for one database backend.
///
/// One call is one connection attempt; retrying is the bootstrap's job.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The sqlx database driver this connector produces pools for.
    type Database: Database;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Make a single attempt to open and verify a pool.
    async fn connect(
        &self,
        settings: &PoolSettings,
    ) -> std::result::Result<Pool<Self::Database>, sqlx::Error>;
}

/// PostgreSQL connector.
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    url: String,
}

impl PostgresConnector {
    /// Create a connector for the given `postgres://` URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    type Database = Postgres;

    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn connect(
        &self,
        settings: &PoolSettings,
    ) -> std::result::Result<Pool<Postgres>, sqlx::Error> {
        let pool = settings
            .pool_options::<Postgres>()
            .connect(&self.url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(pool)
    }
}

/// SQLite connector.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    url: String,
}

impl SqliteConnector {
    /// Create a connector for the given `sqlite:` URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    type Database = Sqlite;

    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn connect(
        &self,
        settings: &PoolSettings,
    ) -> std::result::Result<Pool<Sqlite>, sqlx::Error> {
        // Cascading deletes depend on foreign key enforcement.
        let options = SqliteConnectOptions::from_str(&self.url)?.foreign_keys(true);

        let pool = settings
            .pool_options::<Sqlite>()
            .connect_with(options)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(pool)
    }
}

/// One-time, retrying initializer for the process-wide pool.
pub struct DatastoreBootstrap<C: Connector> {
    connector: C,
    settings: PoolSettings,
    retry: RetryPolicy,
    client: OnceCell<Result<Pool<C::Database>>>,
}

impl<C: Connector> std::fmt::Debug for DatastoreBootstrap<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatastoreBootstrap")
            .field("backend", &self.connector.backend())
            .field("settings", &self.settings)
            .field("retry", &self.retry)
            .field("initialized", &self.client.initialized())
            .finish()
    }
}

impl<C: Connector> DatastoreBootstrap<C> {
    /// Create a bootstrap. No connection is attempted until [`Self::init_client`].
    pub fn new(connector: C, settings: PoolSettings, retry: RetryPolicy) -> Self {
        Self {
            connector,
            settings,
            retry,
            client: OnceCell::new(),
        }
    }

    /// Return the shared pool, connecting on the first call.
    ///
    /// Concurrent first callers wait on the same connection sequence. Once an
    /// outcome is recorded it is returned as-is; a terminal connectivity
    /// failure is never retried by this instance.
    pub async fn init_client(&self) -> Result<Pool<C::Database>> {
        self.client
            .get_or_init(|| self.connect_with_retry())
            .await
            .clone()
    }

    /// Whether an outcome (pool or error) has been recorded.
    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    /// Close the pool if one was established.
    pub async fn shutdown(&self) {
        if let Some(Ok(pool)) = self.client.get() {
            pool.close().await;
            info!(backend = self.connector.backend(), "Datastore pool closed");
        }
    }

    async fn connect_with_retry(&self) -> Result<Pool<C::Database>> {
        let backend = self.connector.backend();
        let max_attempts = self.retry.max_attempts.max(1);

        info!(backend, max_attempts, "Initializing datastore connection...");

        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            match self.connector.connect(&self.settings).await {
                Ok(pool) => {
                    info!(
                        backend,
                        attempt,
                        max_connections = self.settings.max_connections,
                        min_connections = self.settings.min_connections,
                        max_lifetime_secs = self.settings.max_lifetime.as_secs(),
                        "Datastore connection established"
                    );
                    return Ok(pool);
                }
                Err(e) => {
                    warn!(
                        backend,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Datastore connection attempt failed"
                    );
                    last_error = e.to_string();

                    if attempt < max_attempts {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        error!(
            backend,
            attempts = max_attempts,
            error = %last_error,
            "Datastore connection failed after retries"
        );

        Err(CoreError::Connectivity {
            attempts: max_attempts,
            details: last_error,
        })
    }
}
