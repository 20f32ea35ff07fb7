//! Ledger domain types for transaction creation and aggregation.
//!
//! Accounts and categories enter the ledger as snapshots loaded by the
//! caller; the ledger never reads storage itself.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, CategoryId, TransactionId, UserId};

use crate::ordering::EntityStatus;

/// Account classification.
///
/// `IOwe` tracks money the user owes; its balance moves opposite to every
/// other type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Cash in hand.
    Cash,
    /// Bank account.
    Bank,
    /// Credit card.
    CreditCard,
    /// Savings account.
    Savings,
    /// Investment account.
    Investment,
    /// Debt owed by the user.
    IOwe,
    /// Debt owed to the user.
    OweMe,
}

impl AccountType {
    /// Returns true if expenses increase the balance and income decreases it.
    #[must_use]
    pub fn is_debt(self) -> bool {
        matches!(self, Self::IOwe)
    }
}

/// Direction of a transaction category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryType {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        })
    }
}

/// Transaction type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Account to account.
    Transfer,
    /// Account to expense category.
    Expense,
    /// Income category to account.
    Income,
    /// Direct balance adjustment; never created by users.
    BalanceCorrection,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Transfer => "TRANSFER",
            Self::Expense => "EXPENSE",
            Self::Income => "INCOME",
            Self::BalanceCorrection => "BALANCE_CORRECTION",
        })
    }
}

/// One of the four reference slots of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// `fromAccountId`.
    FromAccount,
    /// `toAccountId`.
    ToAccount,
    /// `fromCategoryId`.
    FromCategory,
    /// `toCategoryId`.
    ToCategory,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FromAccount => "fromAccountId",
            Self::ToAccount => "toAccountId",
            Self::FromCategory => "fromCategoryId",
            Self::ToCategory => "toCategoryId",
        })
    }
}

/// The account fields the ledger needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// Account id.
    pub id: AccountId,
    /// Owner.
    pub user_id: UserId,
    /// Account type.
    pub account_type: AccountType,
    /// Current balance.
    pub balance: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// Lifecycle status.
    pub status: EntityStatus,
}

/// The category fields the ledger needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySnapshot {
    /// Category id.
    pub id: CategoryId,
    /// Owner.
    pub user_id: UserId,
    /// Category type.
    pub category_type: CategoryType,
    /// ISO currency code.
    pub currency: String,
    /// Lifecycle status.
    pub status: EntityStatus,
}

/// Input for creating a new transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionInput {
    /// Creating user.
    pub user_id: UserId,
    /// Transaction type.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Amount moved, in the source currency.
    pub value: Decimal,
    /// Fee borne by the source; absent means zero.
    #[serde(default)]
    pub fee: Option<Decimal>,
    /// Source-to-destination rate, required only across currencies.
    #[serde(default)]
    pub currency_rate: Option<Decimal>,
    /// Source account.
    #[serde(default)]
    pub from_account_id: Option<AccountId>,
    /// Destination account.
    #[serde(default)]
    pub to_account_id: Option<AccountId>,
    /// Source category.
    #[serde(default)]
    pub from_category_id: Option<CategoryId>,
    /// Destination category.
    #[serde(default)]
    pub to_category_id: Option<CategoryId>,
    /// Free-form note.
    #[serde(default)]
    pub note: Option<String>,
}

impl CreateTransactionInput {
    /// Fee with absence read as zero.
    #[must_use]
    pub fn fee_or_zero(&self) -> Decimal {
        self.fee.unwrap_or(Decimal::ZERO)
    }
}

/// An immutable ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction id.
    pub id: TransactionId,
    /// Owner.
    pub user_id: UserId,
    /// Transaction type.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Amount moved; negative only for downward balance corrections.
    pub value: Decimal,
    /// Fee, if any.
    pub fee: Option<Decimal>,
    /// Currency of `value` and `fee`.
    pub currency: String,
    /// Rate used, if the two sides differ in currency.
    pub currency_rate: Option<Decimal>,
    /// Source account.
    pub from_account_id: Option<AccountId>,
    /// Destination account.
    pub to_account_id: Option<AccountId>,
    /// Source category.
    pub from_category_id: Option<CategoryId>,
    /// Destination category.
    pub to_category_id: Option<CategoryId>,
    /// Source balance right after this transaction.
    pub from_account_updated_balance: Option<Decimal>,
    /// Destination balance right after this transaction.
    pub to_account_updated_balance: Option<Decimal>,
    /// Free-form note.
    pub note: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Fee with absence read as zero.
    #[must_use]
    pub fn fee_or_zero(&self) -> Decimal {
        self.fee.unwrap_or(Decimal::ZERO)
    }
}

/// New balance for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceUpdate {
    /// Account to update.
    pub account_id: AccountId,
    /// Balance before the transaction.
    pub previous_balance: Decimal,
    /// Balance after the transaction.
    pub new_balance: Decimal,
}

/// Everything a creation path writes: account balances and the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPosting {
    /// Balance changes, source first.
    pub balance_updates: Vec<BalanceUpdate>,
    /// The transaction row.
    pub transaction: Transaction,
}
