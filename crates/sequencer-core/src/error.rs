// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for sequencer-core.
//!
//! Every failure the store, the bootstrap or the workflow can produce is a
//! [`CoreError`]. Errors are `Clone` so the bootstrap can hand the same
//! recorded failure to every caller.

use thiserror::Error;

/// Result type using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors surfaced to the delivery layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// The datastore could not be reached within the bootstrap's retry budget.
    #[error("Datastore unreachable after {attempts} attempt(s): {details}")]
    Connectivity {
        /// Number of connection attempts made.
        attempts: u32,
        /// The last connection error.
        details: String,
    },

    /// Sequence does not exist or has been soft-deleted.
    #[error("Sequence '{sequence_id}' not found")]
    SequenceNotFound {
        /// The sequence ID that was not found.
        sequence_id: String,
    },

    /// Step does not exist within the given sequence or has been soft-deleted.
    #[error("Step '{step_id}' not found in sequence '{sequence_id}'")]
    StepNotFound {
        /// The owning sequence ID.
        sequence_id: String,
        /// The step ID that was not found.
        step_id: String,
    },

    /// A read or write against the datastore failed.
    #[error("Database error during '{operation}': {details}")]
    Persistence {
        /// The operation that failed.
        operation: String,
        /// Error details.
        details: String,
    },

    /// Input validation failed.
    #[error("Validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// The validation error message.
        message: String,
    },

    /// Schema migration failed.
    #[error("Migration failed: {details}")]
    Migration {
        /// Error details.
        details: String,
    },
}

impl CoreError {
    /// Get the error code string for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connectivity { .. } => "CONNECTIVITY_ERROR",
            Self::SequenceNotFound { .. } => "SEQUENCE_NOT_FOUND",
            Self::StepNotFound { .. } => "STEP_NOT_FOUND",
            Self::Persistence { .. } => "PERSISTENCE_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Migration { .. } => "MIGRATION_ERROR",
        }
    }

    /// Whether this error means the requested row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SequenceNotFound { .. } | Self::StepNotFound { .. }
        )
    }

    /// Wrap a datastore error, naming the operation that failed.
    pub fn persistence(operation: &str, err: sqlx::Error) -> Self {
        Self::Persistence {
            operation: operation.to_string(),
            details: err.to_string(),
        }
    }

    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        CoreError::persistence("query", err)
    }
}

impl From<sqlx::migrate::MigrateError> for CoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        CoreError::Migration {
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let test_cases = vec![
            (
                CoreError::Connectivity {
                    attempts: 3,
                    details: "connection refused".to_string(),
                },
                "CONNECTIVITY_ERROR",
            ),
            (
                CoreError::SequenceNotFound {
                    sequence_id: "seq-1".to_string(),
                },
                "SEQUENCE_NOT_FOUND",
            ),
            (
                CoreError::StepNotFound {
                    sequence_id: "seq-1".to_string(),
                    step_id: "step-1".to_string(),
                },
                "STEP_NOT_FOUND",
            ),
            (
                CoreError::Persistence {
                    operation: "insert".to_string(),
                    details: "check constraint".to_string(),
                },
                "PERSISTENCE_ERROR",
            ),
            (
                CoreError::Validation {
                    field: "name".to_string(),
                    message: "is required".to_string(),
                },
                "VALIDATION_ERROR",
            ),
            (
                CoreError::Migration {
                    details: "checksum mismatch".to_string(),
                },
                "MIGRATION_ERROR",
            ),
        ];

        for (error, expected_code) in test_cases {
            assert_eq!(
                error.error_code(),
                expected_code,
                "Error {:?} should have code {}",
                error,
                expected_code
            );
            assert!(!error.to_string().is_empty(), "Message should not be empty");
        }
    }

    #[test]
    fn test_error_display() {
        let err = CoreError::SequenceNotFound {
            sequence_id: "abc-123".to_string(),
        };
        assert_eq!(err.to_string(), "Sequence 'abc-123' not found");

        let err = CoreError::StepNotFound {
            sequence_id: "abc-123".to_string(),
            step_id: "def-456".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Step 'def-456' not found in sequence 'abc-123'"
        );

        let err = CoreError::Connectivity {
            attempts: 3,
            details: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Datastore unreachable after 3 attempt(s): connection refused"
        );

        let err = CoreError::Persistence {
            operation: "create_steps".to_string(),
            details: "disk full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Database error during 'create_steps': disk full"
        );
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: CoreError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.error_code(), "PERSISTENCE_ERROR");
        assert!(matches!(err, CoreError::Persistence { ref operation, .. } if operation == "query"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(
            CoreError::SequenceNotFound {
                sequence_id: "x".to_string()
            }
            .is_not_found()
        );
        assert!(
            CoreError::StepNotFound {
                sequence_id: "x".to_string(),
                step_id: "y".to_string()
            }
            .is_not_found()
        );
        assert!(!CoreError::validation("name", "is required").is_not_found());
    }
}
