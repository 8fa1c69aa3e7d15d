// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Request and response payloads exchanged with the delivery layer.
//!
//! The workflow takes these as plain data and does not validate them. Callers
//! that accept untrusted input run [`CreateSequenceRequest::validate`] (and the
//! patch equivalents) before handing a request over.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::models::{Sequence, Step};

/// Maximum length of a sequence name, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Request to create a sequence together with its initial steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSequenceRequest {
    /// Sequence name.
    pub name: String,
    /// Track email opens.
    #[serde(default)]
    pub open_tracking_enabled: bool,
    /// Track link clicks.
    #[serde(default)]
    pub click_tracking_enabled: bool,
    /// Steps in caller order.
    #[serde(default)]
    pub steps: Vec<CreateStepRequest>,
}

/// One step definition inside a [`CreateSequenceRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStepRequest {
    /// Position within the sequence.
    pub step_order: i32,
    /// Email subject.
    pub subject: String,
    /// Email body.
    pub content: String,
    /// Days to wait before sending.
    pub wait_days: i32,
}

/// Response to a successful creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSequenceResponse {
    /// Generated sequence identifier.
    pub id: String,
}

/// Partial update of a step. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStepRequest {
    /// New subject, if any.
    #[serde(default)]
    pub subject: Option<String>,
    /// New content, if any.
    #[serde(default)]
    pub content: Option<String>,
}

/// Partial update of a sequence's tracking flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSequenceTrackingRequest {
    /// New open-tracking flag, if any.
    #[serde(default)]
    pub open_tracking_enabled: Option<bool>,
    /// New click-tracking flag, if any.
    #[serde(default)]
    pub click_tracking_enabled: Option<bool>,
}

impl CreateSequenceRequest {
    /// Check field bounds: name 1..=255 characters; for every step a
    /// non-empty subject and content and non-negative order and wait.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CoreError::validation("name", "is required"));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(CoreError::validation(
                "name",
                format!("must be at most {} characters", MAX_NAME_LEN),
            ));
        }

        for (index, step) in self.steps.iter().enumerate() {
            step.validate()
                .map_err(|e| match e {
                    CoreError::Validation { field, message } => CoreError::Validation {
                        field: format!("steps[{}].{}", index, field),
                        message,
                    },
                    other => other,
                })?;
        }

        Ok(())
    }

    /// Build the step rows for a sequence, preserving caller order.
    pub(crate) fn step_rows(&self, sequence_id: Uuid) -> Vec<Step> {
        self.steps
            .iter()
            .map(|s| Step::new(sequence_id, s.step_order, &s.subject, &s.content, s.wait_days))
            .collect()
    }
}

impl CreateStepRequest {
    /// Check field bounds for a single step.
    pub fn validate(&self) -> Result<()> {
        if self.step_order < 0 {
            return Err(CoreError::validation("step_order", "must be >= 0"));
        }
        if self.subject.is_empty() {
            return Err(CoreError::validation("subject", "is required"));
        }
        if self.content.is_empty() {
            return Err(CoreError::validation("content", "is required"));
        }
        if self.wait_days < 0 {
            return Err(CoreError::validation("wait_days", "must be >= 0"));
        }
        Ok(())
    }
}

impl UpdateStepRequest {
    /// Present fields must not be empty.
    pub fn validate(&self) -> Result<()> {
        if self.subject.as_deref() == Some("") {
            return Err(CoreError::validation("subject", "must not be empty"));
        }
        if self.content.as_deref() == Some("") {
            return Err(CoreError::validation("content", "must not be empty"));
        }
        Ok(())
    }

    /// Copy the present fields onto `step`. Returns whether anything changed.
    pub fn apply_to(&self, step: &mut Step) -> bool {
        let mut changed = false;
        if let Some(subject) = &self.subject {
            changed |= step.subject != *subject;
            step.subject = subject.clone();
        }
        if let Some(content) = &self.content {
            changed |= step.content != *content;
            step.content = content.clone();
        }
        changed
    }
}

impl UpdateSequenceTrackingRequest {
    /// Copy the present flags onto `sequence`. Returns whether anything changed.
    pub fn apply_to(&self, sequence: &mut Sequence) -> bool {
        let mut changed = false;
        if let Some(open) = self.open_tracking_enabled {
            changed |= sequence.open_tracking_enabled != open;
            sequence.open_tracking_enabled = open;
        }
        if let Some(click) = self.click_tracking_enabled {
            changed |= sequence.click_tracking_enabled != click;
            sequence.click_tracking_enabled = click;
        }
        changed
    }
}

/// Parse an identifier received as a string.
pub fn parse_id(field: &str, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| CoreError::validation(field, "must be a valid UUID"))
}
