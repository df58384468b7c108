//! Storage error model.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | SQLite constraint | StoreError | Scenario |
//! |------------|-------------------|------------|----------|
//! | Database (unique violation) | `UNIQUE` | `Domain(Conflict)` | Duplicate business code |
//! | Database (foreign key violation) | `FOREIGN KEY` | `Domain(Conflict)` | Deleting a referenced row |
//! | Database (check violation) | `CHECK` | `Domain(Validation)` | Value outside the column's range |
//! | Anything else | N/A | `Storage` | Busy timeout, IO, pool closed, ... |
//!
//! Call sites that know more (e.g. a foreign key failure on insert means the
//! referenced row is missing) translate before falling back to this table.

use thiserror::Error;

use textileops_core::DomainError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Business-level failure; nothing was written.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The store could not durably apply or read the change; any open
    /// transaction was rolled back.
    #[error("storage failure in {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn storage(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Storage {
            operation,
            message: message.into(),
        }
    }

    /// A stored row could not be turned back into a domain value.
    pub fn corrupt_row(operation: &'static str, err: DomainError) -> Self {
        Self::storage(operation, format!("stored row is invalid: {err}"))
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            StoreError::Domain(e) => Some(e),
            StoreError::Storage { .. } => None,
        }
    }
}

pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.is_unique_violation() {
                StoreError::Domain(DomainError::conflict(format!(
                    "{operation}: a record with the same code already exists"
                )))
            } else if db_err.is_foreign_key_violation() {
                StoreError::Domain(DomainError::conflict(format!(
                    "{operation}: record is referenced by other records"
                )))
            } else if db_err.is_check_violation() {
                StoreError::Domain(DomainError::validation(format!(
                    "{operation}: {}",
                    db_err.message()
                )))
            } else {
                StoreError::storage(operation, format!("database error: {}", db_err.message()))
            }
        }
        sqlx::Error::PoolClosed => StoreError::storage(operation, "connection pool closed"),
        sqlx::Error::PoolTimedOut => StoreError::storage(operation, "timed out waiting for a connection"),
        other => StoreError::storage(operation, other.to_string()),
    }
}

/// Check if an error is a foreign key violation (referenced row missing on insert).
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Check if an error is a `CHECK` constraint violation (a column left its range).
pub(crate) fn is_check_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_check_violation())
}

/// Check if an error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
