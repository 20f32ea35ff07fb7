//! Error taxonomy shared by the domain modules.
//!
//! Every domain error reports one of these kinds; the kind alone decides how
//! it converts into [`AppError`].

use serde::Serialize;
use tally_shared::AppError;

use crate::ledger::LedgerError;
use crate::ordering::OrderingError;

/// Abstract error kinds, independent of any transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Referenced entity does not exist or is outside the caller's visible set.
    NotFound,
    /// Cross-user access, or an operation on an archived entity.
    Forbidden,
    /// Parent/child relationship violation.
    Conflict,
    /// Shape or co-occurrence violation in the request.
    InvalidRequest,
    /// The caller handed over a state that should be structurally impossible.
    InternalInconsistency,
}

impl ErrorKind {
    /// Wraps a message into the matching [`AppError`] variant.
    #[must_use]
    pub fn into_app_error(self, message: String) -> AppError {
        match self {
            Self::NotFound => AppError::NotFound(message),
            Self::Forbidden => AppError::Forbidden(message),
            Self::Conflict => AppError::Conflict(message),
            Self::InvalidRequest => AppError::Validation(message),
            Self::InternalInconsistency => AppError::Internal(message),
        }
    }
}

impl From<OrderingError> for AppError {
    fn from(err: OrderingError) -> Self {
        err.kind().into_app_error(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        err.kind().into_app_error(err.to_string())
    }
}
