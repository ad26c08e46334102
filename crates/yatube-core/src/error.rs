//! Domain-level error types.

use thiserror::Error;

use crate::form::FormErrors;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} {key}")]
    NotFound {
        entity_type: &'static str,
        key: String,
    },

    #[error("Validation failed: {0}")]
    Validation(FormErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    /// The acting user is unknown.
    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity_type: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            key: key.to_string(),
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::not_found("record", "unknown"),
            RepoError::Constraint(msg) => Self::Duplicate(msg),
            RepoError::Connection(msg) | RepoError::Query(msg) => Self::Internal(msg),
        }
    }
}
