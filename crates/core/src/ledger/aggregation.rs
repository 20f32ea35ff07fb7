//! Read-side totals for one account or category.
//!
//! Per-currency buckets hold raw sums in the transaction currency; `overall`
//! is expressed in the target's own currency where a rate applies.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::types::{AccountId, CategoryId};

use super::types::{Transaction, TransactionType};
use crate::currency::apply_rate;

/// Sums keyed by currency plus a combined total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurrencyTotals {
    /// Raw sums per currency code.
    #[serde(flatten)]
    pub by_currency: BTreeMap<String, Decimal>,
    /// Combined total.
    pub overall: Decimal,
}

impl CurrencyTotals {
    fn add(&mut self, currency: &str, raw: Decimal, overall: Decimal) {
        *self.by_currency.entry(currency.to_string()).or_default() += raw;
        self.overall += overall;
    }

    /// Raw sum for one currency, zero if none was recorded.
    #[must_use]
    pub fn get(&self, currency: &str) -> Decimal {
        self.by_currency.get(currency).copied().unwrap_or_default()
    }
}

/// Outgoing and incoming totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Money leaving the target.
    pub from: CurrencyTotals,
    /// Money reaching the target.
    pub to: CurrencyTotals,
}

/// The entity totals are computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationTarget {
    /// An account; its currency keys balance corrections.
    Account {
        /// Account id.
        id: AccountId,
        /// Account currency.
        currency: String,
    },
    /// A transaction category.
    Category(CategoryId),
}

/// Computes `{from, to}` totals over already-loaded transactions.
pub struct AggregationReporter;

impl AggregationReporter {
    /// Aggregates `transactions` for `target`.
    ///
    /// Transactions that do not touch the target are skipped.
    #[must_use]
    pub fn aggregate(transactions: &[Transaction], target: &AggregationTarget) -> Totals {
        let mut totals = Totals::default();
        for tx in transactions {
            match target {
                AggregationTarget::Account { id, currency } => {
                    Self::add_for_account(&mut totals, tx, *id, currency);
                }
                AggregationTarget::Category(id) => Self::add_for_category(&mut totals, tx, *id),
            }
        }
        totals
    }

    fn add_for_account(totals: &mut Totals, tx: &Transaction, account: AccountId, currency: &str) {
        let is_source = tx.from_account_id == Some(account);
        let is_target = tx.to_account_id == Some(account);
        let fee = tx.fee_or_zero();

        match tx.transaction_type {
            TransactionType::Transfer => {
                if is_source {
                    let spent = tx.value + fee;
                    totals.from.add(&tx.currency, spent, spent);
                }
                if is_target {
                    totals
                        .to
                        .add(&tx.currency, tx.value, apply_rate(tx.value, tx.currency_rate));
                }
            }
            TransactionType::Income if is_target => {
                let net = tx.value - fee;
                totals.to.add(&tx.currency, net, apply_rate(net, tx.currency_rate));
            }
            TransactionType::Expense if is_source => {
                let spent = tx.value + fee;
                totals.from.add(&tx.currency, spent, spent);
            }
            TransactionType::BalanceCorrection if is_source && is_target => {
                let amount = tx.value.abs();
                if tx.value.is_sign_negative() {
                    totals.from.add(currency, amount, amount);
                } else {
                    totals.to.add(currency, amount, amount);
                }
            }
            _ => {}
        }
    }

    fn add_for_category(totals: &mut Totals, tx: &Transaction, category: CategoryId) {
        match tx.transaction_type {
            TransactionType::Expense if tx.to_category_id == Some(category) => {
                let spent = tx.value + tx.fee_or_zero();
                totals
                    .to
                    .add(&tx.currency, spent, apply_rate(spent, tx.currency_rate));
            }
            TransactionType::Income if tx.from_category_id == Some(category) => {
                totals.from.add(&tx.currency, tx.value, tx.value);
            }
            _ => {}
        }
    }
}
