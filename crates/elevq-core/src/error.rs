// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the elevq booking queue.

use thiserror::Error;

use crate::types::BookingStatus;

/// The primary error type used across all elevq adapter traits and engine operations.
#[derive(Debug, Error)]
pub enum ElevqError {
    /// Malformed input (empty plate, past date, foreign offer response, bad token).
    #[error("invalid input: {0}")]
    Validation(String),

    /// Referenced booking, elevator or driver does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The booking's current status does not allow the requested action.
    #[error("cannot {action} a booking that is {from}")]
    InvalidTransition {
        from: BookingStatus,
        action: &'static str,
    },

    /// The requested slot was taken by a concurrent writer.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Message delivery failure. Logged by the engine, never surfaced to users.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Storage backend errors (database connection, query failure, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (unknown timezone, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ElevqError {
    /// Shorthand for a [`ElevqError::NotFound`] with a displayable id.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether this error describes a problem with the user's request rather
    /// than with the infrastructure, and can be shown to them as-is.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound { .. }
                | Self::InvalidTransition { .. }
                | Self::Conflict(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_split() {
        assert!(ElevqError::Conflict("taken".into()).is_user_facing());
        assert!(ElevqError::not_found("booking", 3).is_user_facing());
        assert!(!ElevqError::Internal("boom".into()).is_user_facing());
        assert!(
            !ElevqError::Storage {
                source: Box::new(std::io::Error::other("disk")),
            }
            .is_user_facing()
        );
    }

    #[test]
    fn messages_render() {
        let err = ElevqError::InvalidTransition {
            from: BookingStatus::Unloaded,
            action: "cancel",
        };
        assert_eq!(err.to_string(), "cannot cancel a booking that is UNLOADED");
        assert_eq!(
            ElevqError::not_found("elevator", "north").to_string(),
            "elevator north not found"
        );
    }
}
