//! Address service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during address operations.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The targeted address does not exist (or is not visible to the caller).
    #[error("Address not found")]
    NotFound,

    /// The request is well-formed but cannot be applied.
    #[error("{0}")]
    Invalid(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
