// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Embedded schema for the `sequences` and `steps` tables.
//!
//! ```ignore
//! let pool = bootstrap.init_client().await?;
//! sequencer_core::migrations::run_postgres(&pool).await?;
//! ```

use crate::error::Result;

/// PostgreSQL schema.
pub static POSTGRES: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/postgresql");

/// SQLite schema.
pub static SQLITE: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/sqlite");

/// Apply pending PostgreSQL migrations. Already-applied ones are skipped.
pub async fn run_postgres(pool: &sqlx::PgPool) -> Result<()> {
    POSTGRES.run(pool).await?;
    tracing::info!(count = POSTGRES.iter().count(), "PostgreSQL schema up to date");
    Ok(())
}

/// Apply pending SQLite migrations. Already-applied ones are skipped.
pub async fn run_sqlite(pool: &sqlx::SqlitePool) -> Result<()> {
    SQLITE.run(pool).await?;
    tracing::info!(count = SQLITE.iter().count(), "SQLite schema up to date");
    Ok(())
}
