//! Money-moving rules.
//!
//! This module implements the ledger side of the workspace:
//! - Domain types for accounts, categories and transactions
//! - Shape, amount and currency validation
//! - Balance planning for expense, income and transfer
//! - Balance corrections
//! - Read-side aggregation per account or category

pub mod aggregation;
pub mod error;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use aggregation::{AggregationReporter, AggregationTarget, CurrencyTotals, Totals};
pub use error::LedgerError;
pub use service::LedgerService;
pub use types::{
    AccountSnapshot, AccountType, BalanceUpdate, CategorySnapshot, CategoryType,
    CreateTransactionInput, LedgerPosting, Reference, Transaction, TransactionType,
};
pub use validation::{check_storable, validate_amounts, validate_input, validate_rate};
