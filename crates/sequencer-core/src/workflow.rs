// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Sequence use cases.
//!
//! Every write runs in a transaction begun from the [`RequestContext`] and is
//! committed or rolled back here. Store errors are returned unchanged after
//! the rollback; nothing is retried.

use std::fmt;

use sqlx::{Database, Transaction};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::dto::{
    CreateSequenceRequest, CreateSequenceResponse, UpdateSequenceTrackingRequest,
    UpdateStepRequest,
};
use crate::error::{CoreError, Result};
use crate::models::Sequence;
use crate::store::SequenceStore;

/// Progress of a sequence creation.
///
/// ```text
/// Started ──► SequenceInserted ──► StepsInserted ──► Committed
///    │               │                   │
///    └───────────────┴───────────────────┴──► RolledBack
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePhase {
    /// Transaction begun.
    Started,
    /// Header row written.
    SequenceInserted,
    /// Step rows written (or there were none).
    StepsInserted,
    /// Transaction committed; the sequence is visible.
    Committed,
    /// Transaction abandoned; nothing is visible.
    RolledBack,
}

impl fmt::Display for CreatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CreatePhase::Started => "started",
            CreatePhase::SequenceInserted => "sequence_inserted",
            CreatePhase::StepsInserted => "steps_inserted",
            CreatePhase::Committed => "committed",
            CreatePhase::RolledBack => "rolled_back",
        };
        f.write_str(s)
    }
}

/// Orchestrates sequence operations over a [`SequenceStore`].
///
/// Reads go through the store's pool and writes through the transaction
/// begun from the [`RequestContext`], so callers must build contexts on the
/// same pool the store was created with.
pub struct SequenceWorkflow<S: SequenceStore> {
    store: S,
}

impl<S: SequenceStore> SequenceWorkflow<S> {
    /// Create a workflow writing through `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Create a sequence and all of its steps atomically.
    ///
    /// Steps are written in the order given, each pointing at the new id.
    /// If any write or the commit fails, the transaction is rolled back and
    /// neither the sequence nor any step becomes visible.
    #[instrument(
        skip_all,
        fields(request_id = %ctx.request_id(), step_count = request.steps.len())
    )]
    pub async fn create_sequence(
        &self,
        ctx: &RequestContext<'_, S::Database>,
        request: CreateSequenceRequest,
    ) -> Result<CreateSequenceResponse> {
        let sequence = Sequence::new(
            request.name.clone(),
            request.open_tracking_enabled,
            request.click_tracking_enabled,
        );
        let sequence_id = sequence.id;
        let steps = request.step_rows(sequence_id);

        let mut tx = ctx.begin().await?;
        log_phase(sequence_id, CreatePhase::Started);

        if let Err(e) = self.store.create_sequence(&mut tx, sequence).await {
            return Err(abort_create(tx, sequence_id, e).await);
        }
        log_phase(sequence_id, CreatePhase::SequenceInserted);

        if !steps.is_empty() {
            if let Err(e) = self.store.create_steps(&mut tx, steps).await {
                return Err(abort_create(tx, sequence_id, e).await);
            }
        }
        log_phase(sequence_id, CreatePhase::StepsInserted);

        tx.commit().await.map_err(|e| {
            warn!(sequence_id = %sequence_id, error = %e, "Commit failed");
            CoreError::persistence("commit", e)
        })?;
        log_phase(sequence_id, CreatePhase::Committed);

        info!(sequence_id = %sequence_id, "Sequence created");

        Ok(CreateSequenceResponse {
            id: sequence_id.to_string(),
        })
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Load a live sequence with its live steps in `step_order`.
    #[instrument(skip_all, fields(request_id = %ctx.request_id(), sequence_id = %sequence_id))]
    pub async fn get_sequence(
        &self,
        ctx: &RequestContext<'_, S::Database>,
        sequence_id: Uuid,
    ) -> Result<Sequence> {
        let sequence = self.store.get_sequence(sequence_id).await?;
        debug!(steps = sequence.steps.len(), "Sequence loaded");
        Ok(sequence)
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Patch the subject and/or content of one step.
    ///
    /// The step is read and written inside one transaction. Fields absent
    /// from `patch` keep their stored value. An empty patch still succeeds.
    #[instrument(
        skip_all,
        fields(request_id = %ctx.request_id(), sequence_id = %sequence_id, step_id = %step_id)
    )]
    pub async fn update_step(
        &self,
        ctx: &RequestContext<'_, S::Database>,
        sequence_id: Uuid,
        step_id: Uuid,
        patch: UpdateStepRequest,
    ) -> Result<()> {
        let mut tx = ctx.begin().await?;
        let outcome = self.patch_step(&mut tx, sequence_id, step_id, &patch).await;
        let changed = finish(tx, outcome, "update_step").await?;

        info!(changed, "Step updated");
        Ok(())
    }

    /// Patch the open/click tracking flags of a sequence, reading and writing
    /// the header inside one transaction.
    #[instrument(skip_all, fields(request_id = %ctx.request_id(), sequence_id = %sequence_id))]
    pub async fn update_sequence_tracking(
        &self,
        ctx: &RequestContext<'_, S::Database>,
        sequence_id: Uuid,
        patch: UpdateSequenceTrackingRequest,
    ) -> Result<()> {
        let mut tx = ctx.begin().await?;
        let outcome = self.patch_tracking(&mut tx, sequence_id, &patch).await;
        let (sequence, changed) = finish(tx, outcome, "update_sequence_tracking").await?;

        info!(
            changed,
            open_tracking_enabled = sequence.open_tracking_enabled,
            click_tracking_enabled = sequence.click_tracking_enabled,
            "Sequence tracking updated"
        );
        Ok(())
    }

    /// Soft-delete one step. Deleting a step that does not exist (or belongs
    /// to another sequence) succeeds and changes nothing.
    #[instrument(
        skip_all,
        fields(request_id = %ctx.request_id(), sequence_id = %sequence_id, step_id = %step_id)
    )]
    pub async fn delete_step(
        &self,
        ctx: &RequestContext<'_, S::Database>,
        sequence_id: Uuid,
        step_id: Uuid,
    ) -> Result<()> {
        let mut tx = ctx.begin().await?;
        let outcome = self.store.delete_step(&mut tx, sequence_id, step_id).await;
        finish(tx, outcome, "delete_step").await?;

        info!("Step deleted");
        Ok(())
    }

    async fn patch_step(
        &self,
        tx: &mut Transaction<'_, S::Database>,
        sequence_id: Uuid,
        step_id: Uuid,
        patch: &UpdateStepRequest,
    ) -> Result<bool> {
        let mut step = self
            .store
            .get_step_for_update(tx, sequence_id, step_id)
            .await?;
        let changed = patch.apply_to(&mut step);
        self.store.update_step(tx, &step).await?;
        Ok(changed)
    }

    async fn patch_tracking(
        &self,
        tx: &mut Transaction<'_, S::Database>,
        sequence_id: Uuid,
        patch: &UpdateSequenceTrackingRequest,
    ) -> Result<(Sequence, bool)> {
        let mut sequence = self.store.get_sequence_for_update(tx, sequence_id).await?;
        let changed = patch.apply_to(&mut sequence);
        self.store.update_sequence_tracking(tx, &sequence).await?;
        Ok((sequence, changed))
    }
}

fn log_phase(sequence_id: Uuid, phase: CreatePhase) {
    debug!(sequence_id = %sequence_id, phase = %phase, "Create sequence");
}

async fn abort_create<DB: Database>(
    tx: Transaction<'_, DB>,
    sequence_id: Uuid,
    error: CoreError,
) -> CoreError {
    warn!(
        sequence_id = %sequence_id,
        error = %error,
        error_code = error.error_code(),
        "Create sequence failed, rolling back"
    );
    rollback(tx, "create_sequence").await;
    log_phase(sequence_id, CreatePhase::RolledBack);
    error
}

/// Commit on success, roll back on failure. The original error wins over a
/// rollback error.
async fn finish<DB: Database, T>(
    tx: Transaction<'_, DB>,
    outcome: Result<T>,
    operation: &'static str,
) -> Result<T> {
    match outcome {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| CoreError::persistence("commit", e))?;
            Ok(value)
        }
        Err(e) => {
            warn!(operation, error = %e, "Operation failed, rolling back");
            rollback(tx, operation).await;
            Err(e)
        }
    }
}

async fn rollback<DB: Database>(tx: Transaction<'_, DB>, operation: &'static str) {
    if let Err(e) = tx.rollback().await {
        warn!(operation, error = %e, "Rollback failed");
    }
}
