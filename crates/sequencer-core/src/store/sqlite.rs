// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! SQLite-backed sequence store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::models::{Sequence, Step};

use super::{STEP_INSERT_BATCH, SequenceStore};

/// SQLite-backed store implementation.
#[derive(Clone)]
pub struct SqliteSequenceStore {
    pool: SqlitePool,
}

impl SqliteSequenceStore {
    /// Create a new store reading through the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The pool reads go through.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SequenceStore for SqliteSequenceStore {
    type Database = Sqlite;

    async fn create_sequence(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sequence: Sequence,
    ) -> Result<Sequence> {
        sqlx::query(
            r#"
            INSERT INTO sequences (id, name, open_tracking_enabled, click_tracking_enabled,
                                   created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sequence.id)
        .bind(&sequence.name)
        .bind(sequence.open_tracking_enabled)
        .bind(sequence.click_tracking_enabled)
        .bind(sequence.created_at)
        .bind(sequence.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| CoreError::persistence("create_sequence", e))?;

        Ok(sequence)
    }

    async fn create_steps(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        steps: Vec<Step>,
    ) -> Result<Vec<Step>> {
        if steps.is_empty() {
            return Ok(steps);
        }

        for batch in steps.chunks(STEP_INSERT_BATCH) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO steps (id, sequence_id, step_order, subject, content, wait_days, \
                 created_at, updated_at) ",
            );
            builder.push_values(batch, |mut row, step| {
                row.push_bind(step.id)
                    .push_bind(step.sequence_id)
                    .push_bind(step.step_order)
                    .push_bind(step.subject.clone())
                    .push_bind(step.content.clone())
                    .push_bind(step.wait_days)
                    .push_bind(step.created_at)
                    .push_bind(step.updated_at);
            });

            builder
                .build()
                .execute(&mut **tx)
                .await
                .map_err(|e| CoreError::persistence("create_steps", e))?;
        }

        tracing::debug!(count = steps.len(), "Inserted steps");

        Ok(steps)
    }

    async fn get_sequence(&self, sequence_id: Uuid) -> Result<Sequence> {
        let mut sequence = sqlx::query_as::<_, Sequence>(
            r#"
            SELECT id, name, open_tracking_enabled, click_tracking_enabled,
                   created_at, updated_at, deleted_at
            FROM sequences
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(sequence_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::persistence("get_sequence", e))?
        .ok_or_else(|| CoreError::SequenceNotFound {
            sequence_id: sequence_id.to_string(),
        })?;

        sequence.steps = sqlx::query_as::<_, Step>(
            r#"
            SELECT id, sequence_id, step_order, subject, content, wait_days,
                   created_at, updated_at, deleted_at
            FROM steps
            WHERE sequence_id = ? AND deleted_at IS NULL
            ORDER BY step_order ASC, created_at ASC, id ASC
            "#,
        )
        .bind(sequence_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::persistence("get_sequence_steps", e))?;

        Ok(sequence)
    }

    async fn get_step_by_id(&self, sequence_id: Uuid, step_id: Uuid) -> Result<Step> {
        sqlx::query_as::<_, Step>(
            r#"
            SELECT id, sequence_id, step_order, subject, content, wait_days,
                   created_at, updated_at, deleted_at
            FROM steps
            WHERE id = ? AND sequence_id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(step_id)
        .bind(sequence_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::persistence("get_step_by_id", e))?
        .ok_or_else(|| CoreError::StepNotFound {
            sequence_id: sequence_id.to_string(),
            step_id: step_id.to_string(),
        })
    }

    async fn get_step_for_update(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sequence_id: Uuid,
        step_id: Uuid,
    ) -> Result<Step> {
        sqlx::query_as::<_, Step>(
            r#"
            SELECT id, sequence_id, step_order, subject, content, wait_days,
                   created_at, updated_at, deleted_at
            FROM steps
            WHERE id = ? AND sequence_id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(step_id)
        .bind(sequence_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| CoreError::persistence("get_step_for_update", e))?
        .ok_or_else(|| CoreError::StepNotFound {
            sequence_id: sequence_id.to_string(),
            step_id: step_id.to_string(),
        })
    }

    async fn get_sequence_for_update(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sequence_id: Uuid,
    ) -> Result<Sequence> {
        sqlx::query_as::<_, Sequence>(
            r#"
            SELECT id, name, open_tracking_enabled, click_tracking_enabled,
                   created_at, updated_at, deleted_at
            FROM sequences
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(sequence_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| CoreError::persistence("get_sequence_for_update", e))?
        .ok_or_else(|| CoreError::SequenceNotFound {
            sequence_id: sequence_id.to_string(),
        })
    }

    async fn update_step(&self, tx: &mut Transaction<'_, Sqlite>, step: &Step) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO steps (id, sequence_id, step_order, subject, content, wait_days,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                sequence_id = excluded.sequence_id,
                step_order = excluded.step_order,
                subject = excluded.subject,
                content = excluded.content,
                wait_days = excluded.wait_days,
                updated_at = excluded.updated_at
            WHERE steps.deleted_at IS NULL
            "#,
        )
        .bind(step.id)
        .bind(step.sequence_id)
        .bind(step.step_order)
        .bind(&step.subject)
        .bind(&step.content)
        .bind(step.wait_days)
        .bind(step.created_at)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(|e| CoreError::persistence("update_step", e))?;

        Ok(())
    }

    async fn update_sequence_tracking(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sequence: &Sequence,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sequences (id, name, open_tracking_enabled, click_tracking_enabled,
                                   created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                open_tracking_enabled = excluded.open_tracking_enabled,
                click_tracking_enabled = excluded.click_tracking_enabled,
                updated_at = excluded.updated_at
            WHERE sequences.deleted_at IS NULL
            "#,
        )
        .bind(sequence.id)
        .bind(&sequence.name)
        .bind(sequence.open_tracking_enabled)
        .bind(sequence.click_tracking_enabled)
        .bind(sequence.created_at)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(|e| CoreError::persistence("update_sequence_tracking", e))?;

        Ok(())
    }

    async fn delete_step(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        sequence_id: Uuid,
        step_id: Uuid,
    ) -> Result<()> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE steps
            SET deleted_at = ?, updated_at = ?
            WHERE id = ? AND sequence_id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(step_id)
        .bind(sequence_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| CoreError::persistence("delete_step", e))?;

        if result.rows_affected() == 0 {
            tracing::debug!(
                sequence_id = %sequence_id,
                step_id = %step_id,
                "No live step matched delete"
            );
        }

        Ok(())
    }
}
