// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Sequence store interface and backend implementations.
//!
//! Write operations run on a transaction owned by the caller; the store never
//! begins, commits or rolls back. Reads go straight to the pool and skip
//! soft-deleted rows.

pub mod postgres;
pub mod sqlite;

pub use self::postgres::PostgresSequenceStore;
pub use self::sqlite::SqliteSequenceStore;

use async_trait::async_trait;
use sqlx::{Database, Transaction};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Sequence, Step};

/// Rows per multi-row step `INSERT`. Eight binds per row keeps every
/// statement well under the SQLite (32766) and PostgreSQL (65535) limits.
pub const STEP_INSERT_BATCH: usize = 1000;

/// Row-level access to sequences and steps.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// The sqlx driver whose transactions this store writes through.
    type Database: Database;

    /// Insert one sequence header and return it.
    async fn create_sequence(
        &self,
        tx: &mut Transaction<'_, Self::Database>,
        sequence: Sequence,
    ) -> Result<Sequence>;

    /// Insert all steps in batches of [`STEP_INSERT_BATCH`] rows on `tx`.
    /// Either every row is written or none is once the caller rolls back.
    async fn create_steps(
        &self,
        tx: &mut Transaction<'_, Self::Database>,
        steps: Vec<Step>,
    ) -> Result<Vec<Step>>;

    /// Load a live sequence with its live steps ordered by `step_order` ascending.
    async fn get_sequence(&self, sequence_id: Uuid) -> Result<Sequence>;

    /// Load one live step scoped to its sequence.
    async fn get_step_by_id(&self, sequence_id: Uuid, step_id: Uuid) -> Result<Step>;

    /// Load one live step inside `tx`, locking it where the backend supports
    /// row locks. Patch operations read through this so the write that
    /// follows sees the same row.
    async fn get_step_for_update(
        &self,
        tx: &mut Transaction<'_, Self::Database>,
        sequence_id: Uuid,
        step_id: Uuid,
    ) -> Result<Step>;

    /// Load one live sequence header (without steps) inside `tx`, locking it
    /// where the backend supports row locks.
    async fn get_sequence_for_update(
        &self,
        tx: &mut Transaction<'_, Self::Database>,
        sequence_id: Uuid,
    ) -> Result<Sequence>;

    /// Upsert of a step's content columns. `deleted_at` is never written and a
    /// soft-deleted row is left untouched.
    async fn update_step(
        &self,
        tx: &mut Transaction<'_, Self::Database>,
        step: &Step,
    ) -> Result<()>;

    /// Upsert of a sequence header (steps are not touched). `deleted_at` is
    /// never written and a soft-deleted row is left untouched.
    async fn update_sequence_tracking(
        &self,
        tx: &mut Transaction<'_, Self::Database>,
        sequence: &Sequence,
    ) -> Result<()>;

    /// Soft-delete one step scoped to its sequence. A non-matching pair is a no-op.
    async fn delete_step(
        &self,
        tx: &mut Transaction<'_, Self::Database>,
        sequence_id: Uuid,
        step_id: Uuid,
    ) -> Result<()>;
}
