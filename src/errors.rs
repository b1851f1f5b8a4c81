//! Unified error types for the ledger core.
//!
//! Every violated invariant surfaces as one of the variants below. `Invariant`
//! is reserved for internal defects (state the core should never produce) and
//! must abort the operation before anything is persisted.

use sea_orm::DbErr;
use thiserror::Error;

/// Coarse classification used by a transport layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input
    Validation,
    /// Referenced entity does not exist
    NotFound,
    /// Entity exists but belongs to another user
    Forbidden,
    /// Duplicate name, protected record, in-use record or immutable field
    Conflict,
    /// No resolved user identity
    Unauthenticated,
    /// Defects, storage and configuration failures
    Internal,
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before touching the store
    #[error("Validation failed: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// The referenced record does not exist
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record ("category", "transaction", ...)
        entity: &'static str,
        /// Id or name used for the lookup
        key: String,
    },

    /// The record exists but is owned by someone else
    #[error("{entity} {id} is not owned by the current user")]
    Forbidden {
        /// Kind of record
        entity: &'static str,
        /// Id of the record
        id: i64,
    },

    /// The request clashes with existing state
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the clash
        message: String,
    },

    /// No user identity was resolved for the request
    #[error("Authentication required")]
    Unauthenticated,

    /// Internal consistency violation
    #[error("Invariant violated: {message}")]
    Invariant {
        /// Description of the broken invariant
        message: String,
    },

    /// Settings could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Error details
        message: String,
    },

    /// Record store failure
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl Error {
    /// Shorthand for a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::NotFound`].
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Maps the error onto its caller-facing kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Invariant { .. } | Self::Config { .. } | Self::Database(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(Error::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(Error::not_found("goal", 3).kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::Forbidden {
                entity: "goal",
                id: 3
            }
            .kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(Error::conflict("dup").kind(), ErrorKind::Conflict);
        assert_eq!(Error::Unauthenticated.kind(), ErrorKind::Unauthenticated);
        assert_eq!(
            Error::Invariant {
                message: "no type".to_string()
            }
            .kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::not_found("category", "Food");
        assert_eq!(err.to_string(), "category not found: Food");
    }
}
