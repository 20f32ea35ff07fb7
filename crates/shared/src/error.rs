//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced to whatever transport sits in front of the workspace.
///
/// Domain errors from `tally-core` and repository errors from `tally-db`
/// convert into this type; the transport maps it to its own status signals.
#[derive(Debug, Error)]
pub enum AppError {
    /// Referenced entity does not exist or is not visible to the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Cross-user access or an operation on an archived entity.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Parent/child relationship violation or exhausted capacity.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Shape or co-occurrence violation in the request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Structurally impossible state; signals a caller bug.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Forbidden(_) => 403,
            Self::Conflict(_) => 409,
            Self::Validation(_) => 400,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict(_) => "CONFLICT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
