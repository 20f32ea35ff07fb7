//! Errors returned by the repositories.

use sea_orm::DbErr;
use tally_core::ledger::LedgerError;
use tally_core::ordering::OrderingError;
use tally_shared::AppError;
use uuid::Uuid;

/// Error types for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A structural change was rejected.
    #[error(transparent)]
    Ordering(#[from] OrderingError),

    /// A money-moving change was rejected.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The row does not exist.
    #[error("{model} not found: {id}")]
    NotFound {
        /// Table-level model name.
        model: &'static str,
        /// The requested id.
        id: Uuid,
    },

    /// The row belongs to another user.
    #[error("{model} {id} belongs to a different user")]
    Forbidden {
        /// Table-level model name.
        model: &'static str,
        /// The requested id.
        id: Uuid,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    pub(crate) const fn not_found(model: &'static str, id: Uuid) -> Self {
        Self::NotFound { model, id }
    }

    pub(crate) const fn forbidden(model: &'static str, id: Uuid) -> Self {
        Self::Forbidden { model, id }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Ordering(e) => e.into(),
            RepositoryError::Ledger(e) => e.into(),
            RepositoryError::NotFound { .. } => Self::NotFound(err.to_string()),
            RepositoryError::Forbidden { .. } => Self::Forbidden(err.to_string()),
            RepositoryError::Database(e) => Self::Database(e.to_string()),
        }
    }
}
