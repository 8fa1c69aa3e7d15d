// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for sequencer-core integration tests.
//!
//! SQLite helpers run everywhere; PostgreSQL helpers need TEST_DATABASE_URL.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{PgPool, Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use uuid::Uuid;

use sequencer_core::bootstrap::{DatastoreBootstrap, PoolSettings, RetryPolicy, SqliteConnector};
use sequencer_core::dto::{CreateSequenceRequest, CreateStepRequest};
use sequencer_core::error::{CoreError, Result};
use sequencer_core::models::{Sequence, Step};
use sequencer_core::store::{SequenceStore, SqliteSequenceStore};

/// Fresh in-memory SQLite database with the schema applied.
///
/// A single connection that never expires, so every query sees the same
/// in-memory database.
pub async fn sqlite_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Invalid SQLite URL")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to create in-memory SQLite pool");

    sequencer_core::migrations::run_sqlite(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// File-backed SQLite database with several connections and the schema
/// applied. Keep the returned directory alive for the duration of the test.
pub async fn sqlite_file_pool(max_connections: u32) -> (tempfile::TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("sequencer.db").display());

    let bootstrap = DatastoreBootstrap::new(
        SqliteConnector::new(url),
        PoolSettings {
            max_connections,
            min_connections: 0,
            ..PoolSettings::default()
        },
        RetryPolicy::default(),
    );
    let pool = bootstrap
        .init_client()
        .await
        .expect("Failed to open SQLite file");

    sequencer_core::migrations::run_sqlite(&pool)
        .await
        .expect("Failed to run migrations");

    (dir, pool)
}

/// Connect to TEST_DATABASE_URL and apply the schema.
pub async fn postgres_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPool::connect(&database_url).await.ok()?;
    sequencer_core::migrations::run_postgres(&pool).await.ok()?;
    Some(pool)
}

pub fn step(order: i32, subject: &str, content: &str, wait_days: i32) -> CreateStepRequest {
    CreateStepRequest {
        step_order: order,
        subject: subject.to_string(),
        content: content.to_string(),
        wait_days,
    }
}

pub fn create_request(name: &str, steps: Vec<CreateStepRequest>) -> CreateSequenceRequest {
    CreateSequenceRequest {
        name: name.to_string(),
        open_tracking_enabled: true,
        click_tracking_enabled: false,
        steps,
    }
}

/// SQLite store whose step insert always fails after the header was written.
///
/// Records the id of the sequence it was asked to create so tests can check
/// that it never became visible.
pub struct FailingStepsStore {
    inner: SqliteSequenceStore,
    attempted: Mutex<Option<Uuid>>,
}

impl FailingStepsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            inner: SqliteSequenceStore::new(pool),
            attempted: Mutex::new(None),
        }
    }

    pub fn attempted_sequence_id(&self) -> Option<Uuid> {
        *self.attempted.lock().unwrap()
    }
}

#[async_trait]
impl SequenceStore for FailingStepsStore {
    type Database = Sqlite;

    async fn create_sequence(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sequence: Sequence,
    ) -> Result<Sequence> {
        *self.attempted.lock().unwrap() = Some(sequence.id);
        self.inner.create_sequence(tx, sequence).await
    }

    async fn create_steps(
        &self,
        _tx: &mut Transaction<'_, Sqlite>,
        _steps: Vec<Step>,
    ) -> Result<Vec<Step>> {
        Err(CoreError::Persistence {
            operation: "create_steps".to_string(),
            details: "injected failure".to_string(),
        })
    }

    async fn get_sequence(&self, sequence_id: Uuid) -> Result<Sequence> {
        self.inner.get_sequence(sequence_id).await
    }

    async fn get_step_by_id(&self, sequence_id: Uuid, step_id: Uuid) -> Result<Step> {
        self.inner.get_step_by_id(sequence_id, step_id).await
    }

    async fn get_step_for_update(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sequence_id: Uuid,
        step_id: Uuid,
    ) -> Result<Step> {
        self.inner.get_step_for_update(tx, sequence_id, step_id).await
    }

    async fn get_sequence_for_update(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sequence_id: Uuid,
    ) -> Result<Sequence> {
        self.inner.get_sequence_for_update(tx, sequence_id).await
    }

    async fn update_step(&self, tx: &mut Transaction<'_, Sqlite>, step: &Step) -> Result<()> {
        self.inner.update_step(tx, step).await
    }

    async fn update_sequence_tracking(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sequence: &Sequence,
    ) -> Result<()> {
        self.inner.update_sequence_tracking(tx, sequence).await
    }

    async fn delete_step(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sequence_id: Uuid,
        step_id: Uuid,
    ) -> Result<()> {
        self.inner.delete_step(tx, sequence_id, step_id).await
    }
}

/// Helper macro to skip tests if TEST_DATABASE_URL is not set.
#[macro_export]
macro_rules! skip_if_no_db {
    () => {
        if std::env::var("TEST_DATABASE_URL").is_err() {
            eprintln!("Skipping test: TEST_DATABASE_URL not set");
            return;
        }
    };
}
