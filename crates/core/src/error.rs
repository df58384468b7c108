//! Domain error model.

use thiserror::Error;

use crate::value_object::Units;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing references, conflicts). Storage failures belong to the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Several fields failed validation at once.
    #[error("validation failed: {}", .0.join("; "))]
    ValidationErrors(Vec<String>),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The change conflicts with existing state (duplicate key, live references).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An outward adjustment would take on-hand stock below zero and the
    /// active policy refuses it.
    #[error("insufficient stock for item {item_id}: on hand {on_hand}, requested {requested}")]
    InsufficientStock {
        item_id: i64,
        on_hand: Units,
        requested: Units,
    },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound(what)
    }

    /// Turn a list of collected field errors into a result.
    pub fn from_errors(errors: Vec<String>) -> DomainResult<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self::ValidationErrors(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collected_errors_are_joined_in_display() {
        let err = DomainError::from_errors(vec!["a is required".into(), "b must be > 0".into()])
            .unwrap_err();
        assert_eq!(err.to_string(), "validation failed: a is required; b must be > 0");
    }

    #[test]
    fn empty_error_list_is_ok() {
        assert!(DomainError::from_errors(Vec::new()).is_ok());
    }
}
