// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Sequencer - Email Sequence Service
//!
//! Connects to the datastore (with bounded retries), applies the schema and
//! keeps the pool open until Ctrl-C. Failing to reach the datastore is fatal.
//!
//! No delivery layer (HTTP, queue consumer) ships with this binary: the
//! workflow is built and held for the process lifetime, but nothing routes
//! requests to it. Embedders wire their own transport to
//! [`SequenceWorkflow`] through the library.

use anyhow::Result;
use tracing::{error, info};

use sequencer_core::bootstrap::{Connector, DatastoreBootstrap, PostgresConnector, SqliteConnector};
use sequencer_core::config::Config;
use sequencer_core::migrations;
use sequencer_core::store::{PostgresSequenceStore, SqliteSequenceStore};
use sequencer_core::workflow::SequenceWorkflow;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from crate directory or parent directories)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sequencer_core=info".parse()?),
        )
        .init();

    info!("Starting Sequencer");

    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!(
        max_connections = config.pool.max_connections,
        min_connections = config.pool.min_connections,
        connect_attempts = config.retry.max_attempts,
        sqlite = config.is_sqlite(),
        "Configuration loaded"
    );

    if config.is_sqlite() {
        let bootstrap = DatastoreBootstrap::new(
            SqliteConnector::new(&config.database_url),
            config.pool.clone(),
            config.retry.clone(),
        );
        let pool = connect(&bootstrap).await?;
        migrations::run_sqlite(&pool).await?;
        let workflow = SequenceWorkflow::new(SqliteSequenceStore::new(pool));
        serve(&bootstrap, workflow).await
    } else {
        let bootstrap = DatastoreBootstrap::new(
            PostgresConnector::new(&config.database_url),
            config.pool.clone(),
            config.retry.clone(),
        );
        let pool = connect(&bootstrap).await?;
        migrations::run_postgres(&pool).await?;
        let workflow = SequenceWorkflow::new(PostgresSequenceStore::new(pool));
        serve(&bootstrap, workflow).await
    }
}

async fn connect<C: Connector>(
    bootstrap: &DatastoreBootstrap<C>,
) -> Result<sqlx::Pool<C::Database>> {
    bootstrap.init_client().await.map_err(|e| {
        error!(error_code = e.error_code(), "Failed to initialize datastore: {}", e);
        e.into()
    })
}

/// Hold the workflow until Ctrl-C, then close the pool. The workflow is
/// unused here since no transport is wired in.
async fn serve<C, S>(bootstrap: &DatastoreBootstrap<C>, _workflow: SequenceWorkflow<S>) -> Result<()>
where
    C: Connector,
    S: sequencer_core::SequenceStore,
{
    info!("Sequencer initialized successfully");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    bootstrap.shutdown().await;
    info!("Shutdown complete");

    Ok(())
}
