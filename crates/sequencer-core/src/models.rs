// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Persisted rows for sequences and their steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named campaign: tracking flags plus an ordered list of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sequence {
    /// Generated at creation time, never client-supplied.
    pub id: Uuid,
    /// Display name (1 to 255 characters).
    pub name: String,
    /// Whether opens are tracked for emails of this sequence.
    pub open_tracking_enabled: bool,
    /// Whether link clicks are tracked for emails of this sequence.
    pub click_tracking_enabled: bool,
    /// Live steps ordered by `step_order`. Loaded separately from the header row.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
    /// When the sequence was created.
    pub created_at: DateTime<Utc>,
    /// When the sequence was last written.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; rows with a value here are invisible to reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Sequence {
    /// Build a new, not yet persisted sequence header with a fresh id.
    pub fn new(name: impl Into<String>, open_tracking: bool, click_tracking: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            open_tracking_enabled: open_tracking,
            click_tracking_enabled: click_tracking,
            steps: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// One email of a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Step {
    /// Generated at creation time.
    pub id: Uuid,
    /// Owning sequence.
    pub sequence_id: Uuid,
    /// Position within the sequence. Not guaranteed unique.
    pub step_order: i32,
    /// Email subject.
    pub subject: String,
    /// Email body.
    pub content: String,
    /// Days to wait before sending this step.
    pub wait_days: i32,
    /// When the step was created.
    pub created_at: DateTime<Utc>,
    /// When the step was last written.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Step {
    /// Build a new, not yet persisted step belonging to `sequence_id`.
    pub fn new(
        sequence_id: Uuid,
        step_order: i32,
        subject: impl Into<String>,
        content: impl Into<String>,
        wait_days: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sequence_id,
            step_order,
            subject: subject.into(),
            content: content.into(),
            wait_days,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}
