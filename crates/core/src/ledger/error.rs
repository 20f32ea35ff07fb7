//! Ledger error types for validation and state errors.
//!
//! Every variant is raised before any write is planned, so a failed
//! creation never leaves a partial balance update behind.

use rust_decimal::Decimal;
use tally_shared::types::{AccountId, CategoryId, TransactionId, UserId};
use thiserror::Error;

use super::types::{CategoryType, Reference, TransactionType};
use crate::error::ErrorKind;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Shape Errors ==========
    /// Balance corrections are only produced internally.
    #[error("BALANCE_CORRECTION transactions cannot be created directly")]
    BalanceCorrectionNotCreatable,

    /// Both source references were given.
    #[error("Only one of fromAccountId and fromCategoryId may be set")]
    BothSourcesSet,

    /// Both destination references were given.
    #[error("Only one of toAccountId and toCategoryId may be set")]
    BothTargetsSet,

    /// No source reference was given.
    #[error("A source account or category is required")]
    MissingSource,

    /// No destination reference was given.
    #[error("A destination account or category is required")]
    MissingTarget,

    /// A reference the type needs is absent.
    #[error("{transaction_type} requires {reference}")]
    MissingReference {
        /// Requested type.
        transaction_type: TransactionType,
        /// The absent slot.
        reference: Reference,
    },

    /// A reference the type does not allow is present.
    #[error("{transaction_type} does not allow {reference}")]
    ForbiddenReference {
        /// Requested type.
        transaction_type: TransactionType,
        /// The offending slot.
        reference: Reference,
    },

    /// Transfer source and destination are the same account.
    #[error("Cannot transfer from an account to itself")]
    SameAccountTransfer,

    // ========== Amount Errors ==========
    /// Value must be strictly positive.
    #[error("Transaction value must be positive")]
    NonPositiveValue,

    /// Fee cannot be negative.
    #[error("Transaction fee cannot be negative")]
    NegativeFee,

    /// Rate must be strictly positive.
    #[error("Currency rate must be positive")]
    NonPositiveRate,

    /// Income fee larger than the income itself.
    #[error("Fee {fee} exceeds value {value}")]
    FeeExceedsValue {
        /// Submitted value.
        value: Decimal,
        /// Submitted fee.
        fee: Decimal,
    },

    /// An amount or the balance it produces does not fit the ledger columns.
    #[error("{0} is out of range")]
    AmountOutOfRange(&'static str),

    /// An amount carries more decimal places than the ledger stores.
    #[error("{field} allows at most {max_scale} decimal places")]
    TooManyDecimals {
        /// Offending field.
        field: &'static str,
        /// Maximum decimal places for the field.
        max_scale: u32,
    },

    // ========== Currency Errors ==========
    /// The two sides differ in currency but no rate was given.
    #[error("A currency rate is required to move {from} into {to}")]
    RateRequired {
        /// Source currency code.
        from: String,
        /// Destination currency code.
        to: String,
    },

    /// Both sides share a currency but a rate was given.
    #[error("A currency rate is not allowed when both sides use {0}")]
    RateNotAllowed(String),

    // ========== Balance Errors ==========
    /// The source balance would drop below zero.
    #[error("Insufficient funds in account {account_id}: balance would become {balance}")]
    InsufficientFunds {
        /// The source account.
        account_id: AccountId,
        /// The rejected balance.
        balance: Decimal,
    },

    /// Paying more into an I_OWE account than is owed.
    #[error("Payment exceeds the amount owed on account {account_id}: balance would become {balance}")]
    Overpayment {
        /// The debt account.
        account_id: AccountId,
        /// The rejected balance.
        balance: Decimal,
    },

    // ========== Reference Errors ==========
    /// The user does not exist.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Category not found.
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// The account belongs to another user.
    #[error("Account {0} belongs to a different user")]
    AccountOwnerMismatch(AccountId),

    /// The category belongs to another user.
    #[error("Category {0} belongs to a different user")]
    CategoryOwnerMismatch(CategoryId),

    /// The transaction belongs to another user.
    #[error("Transaction {0} belongs to a different user")]
    TransactionOwnerMismatch(TransactionId),

    /// The account is archived.
    #[error("Account {0} is archived")]
    AccountArchived(AccountId),

    /// The category is archived.
    #[error("Category {0} is archived")]
    CategoryArchived(CategoryId),

    /// The category points the wrong way for this transaction type.
    #[error("Expected a {expected} category, got {actual}")]
    CategoryTypeMismatch {
        /// Type required by the transaction.
        expected: CategoryType,
        /// Type of the referenced category.
        actual: CategoryType,
    },

    // ========== Transaction State Errors ==========
    /// Transactions are immutable once created.
    #[error("Transactions cannot be edited")]
    EditNotSupported,
}

impl LedgerError {
    /// Returns the abstract error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound(_)
            | Self::AccountNotFound(_)
            | Self::CategoryNotFound(_)
            | Self::TransactionNotFound(_) => ErrorKind::NotFound,
            Self::AccountOwnerMismatch(_)
            | Self::CategoryOwnerMismatch(_)
            | Self::TransactionOwnerMismatch(_)
            | Self::AccountArchived(_)
            | Self::CategoryArchived(_) => ErrorKind::Forbidden,
            _ => ErrorKind::InvalidRequest,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BalanceCorrectionNotCreatable => "BALANCE_CORRECTION_NOT_CREATABLE",
            Self::BothSourcesSet => "BOTH_SOURCES_SET",
            Self::BothTargetsSet => "BOTH_TARGETS_SET",
            Self::MissingSource => "MISSING_SOURCE",
            Self::MissingTarget => "MISSING_TARGET",
            Self::MissingReference { .. } => "MISSING_REFERENCE",
            Self::ForbiddenReference { .. } => "FORBIDDEN_REFERENCE",
            Self::SameAccountTransfer => "SAME_ACCOUNT_TRANSFER",
            Self::NonPositiveValue => "NON_POSITIVE_VALUE",
            Self::NegativeFee => "NEGATIVE_FEE",
            Self::NonPositiveRate => "NON_POSITIVE_RATE",
            Self::FeeExceedsValue { .. } => "FEE_EXCEEDS_VALUE",
            Self::AmountOutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
            Self::TooManyDecimals { .. } => "TOO_MANY_DECIMALS",
            Self::RateRequired { .. } => "RATE_REQUIRED",
            Self::RateNotAllowed(_) => "RATE_NOT_ALLOWED",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::AccountOwnerMismatch(_) => "ACCOUNT_OWNER_MISMATCH",
            Self::CategoryOwnerMismatch(_) => "CATEGORY_OWNER_MISMATCH",
            Self::TransactionOwnerMismatch(_) => "TRANSACTION_OWNER_MISMATCH",
            Self::AccountArchived(_) => "ACCOUNT_ARCHIVED",
            Self::CategoryArchived(_) => "CATEGORY_ARCHIVED",
            Self::CategoryTypeMismatch { .. } => "CATEGORY_TYPE_MISMATCH",
            Self::EditNotSupported => "EDIT_NOT_SUPPORTED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::Conflict => 409,
            ErrorKind::InvalidRequest => 400,
            ErrorKind::InternalInconsistency => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LedgerError::MissingSource, 400)]
    #[case(LedgerError::AccountNotFound(AccountId::new()), 404)]
    #[case(LedgerError::CategoryOwnerMismatch(CategoryId::new()), 403)]
    #[case(LedgerError::AccountArchived(AccountId::new()), 403)]
    #[case(LedgerError::EditNotSupported, 400)]
    #[case(LedgerError::AmountOutOfRange("value"), 400)]
    fn test_http_status_codes(#[case] err: LedgerError, #[case] status: u16) {
        assert_eq!(err.http_status_code(), status);
    }

    #[test]
    fn test_reference_errors_name_the_slot() {
        let err = LedgerError::ForbiddenReference {
            transaction_type: TransactionType::Transfer,
            reference: Reference::FromCategory,
        };
        assert_eq!(err.to_string(), "TRANSFER does not allow fromCategoryId");
        assert_eq!(err.error_code(), "FORBIDDEN_REFERENCE");
    }
}
