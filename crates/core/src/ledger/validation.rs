//! Shape and amount checks run before any lookup.

use rust_decimal::Decimal;

use super::error::LedgerError;
use crate::currency::{AMOUNT_SCALE, MAX_AMOUNT, MAX_RATE, RATE_SCALE};
use super::types::{CreateTransactionInput, Reference, TransactionType};

/// Reference slots each creatable type needs and refuses.
fn reference_rules(transaction_type: TransactionType) -> ([Reference; 2], [Reference; 2]) {
    match transaction_type {
        TransactionType::Transfer => (
            [Reference::FromAccount, Reference::ToAccount],
            [Reference::FromCategory, Reference::ToCategory],
        ),
        TransactionType::Expense => (
            [Reference::FromAccount, Reference::ToCategory],
            [Reference::FromCategory, Reference::ToAccount],
        ),
        // BALANCE_CORRECTION is rejected before the rules are consulted.
        TransactionType::Income | TransactionType::BalanceCorrection => (
            [Reference::ToAccount, Reference::FromCategory],
            [Reference::FromAccount, Reference::ToCategory],
        ),
    }
}

fn is_set(input: &CreateTransactionInput, reference: Reference) -> bool {
    match reference {
        Reference::FromAccount => input.from_account_id.is_some(),
        Reference::ToAccount => input.to_account_id.is_some(),
        Reference::FromCategory => input.from_category_id.is_some(),
        Reference::ToCategory => input.to_category_id.is_some(),
    }
}

/// Validates the request shape and amounts of a new transaction.
///
/// Checks, in order:
/// 1. The type is creatable (never `BALANCE_CORRECTION`)
/// 2. At most one source and at most one destination
/// 3. At least one source and one destination
/// 4. The per-type required and forbidden references
/// 5. Transfers name two different accounts
/// 6. `value > 0`, `fee >= 0`, `currencyRate > 0`
/// 7. Amounts fit the ledger columns in magnitude and decimal places
///
/// # Errors
///
/// Returns the first `LedgerError` found.
pub fn validate_input(input: &CreateTransactionInput) -> Result<(), LedgerError> {
    if input.transaction_type == TransactionType::BalanceCorrection {
        return Err(LedgerError::BalanceCorrectionNotCreatable);
    }

    if input.from_account_id.is_some() && input.from_category_id.is_some() {
        return Err(LedgerError::BothSourcesSet);
    }
    if input.to_account_id.is_some() && input.to_category_id.is_some() {
        return Err(LedgerError::BothTargetsSet);
    }
    if input.from_account_id.is_none() && input.from_category_id.is_none() {
        return Err(LedgerError::MissingSource);
    }
    if input.to_account_id.is_none() && input.to_category_id.is_none() {
        return Err(LedgerError::MissingTarget);
    }

    let (required, forbidden) = reference_rules(input.transaction_type);
    if let Some(reference) = forbidden.into_iter().find(|r| is_set(input, *r)) {
        return Err(LedgerError::ForbiddenReference {
            transaction_type: input.transaction_type,
            reference,
        });
    }
    if let Some(reference) = required.into_iter().find(|r| !is_set(input, *r)) {
        return Err(LedgerError::MissingReference {
            transaction_type: input.transaction_type,
            reference,
        });
    }

    if input.transaction_type == TransactionType::Transfer
        && input.from_account_id == input.to_account_id
    {
        return Err(LedgerError::SameAccountTransfer);
    }

    validate_amounts(input.value, input.fee, input.currency_rate)
}

/// Validates value, fee and rate.
///
/// Value and fee stay below [`MAX_AMOUNT`] with at most [`AMOUNT_SCALE`]
/// decimal places; the rate stays below [`MAX_RATE`] with at most
/// [`RATE_SCALE`].
///
/// # Errors
///
/// Returns `NonPositiveValue`, `NegativeFee`, `NonPositiveRate`,
/// `AmountOutOfRange` or `TooManyDecimals`.
pub fn validate_amounts(
    value: Decimal,
    fee: Option<Decimal>,
    rate: Option<Decimal>,
) -> Result<(), LedgerError> {
    if value <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveValue);
    }
    if fee.is_some_and(|fee| fee < Decimal::ZERO) {
        return Err(LedgerError::NegativeFee);
    }
    if rate.is_some_and(|rate| rate <= Decimal::ZERO) {
        return Err(LedgerError::NonPositiveRate);
    }

    check_storable("value", value, MAX_AMOUNT, AMOUNT_SCALE)?;
    if let Some(fee) = fee {
        check_storable("fee", fee, MAX_AMOUNT, AMOUNT_SCALE)?;
    }
    if let Some(rate) = rate {
        check_storable("currencyRate", rate, MAX_RATE, RATE_SCALE)?;
    }
    Ok(())
}

/// Checks that an amount fits a `NUMERIC` column: `|amount| < bound` and no
/// more than `max_scale` significant decimal places.
///
/// # Errors
///
/// Returns `AmountOutOfRange` or `TooManyDecimals` naming `field`.
pub fn check_storable(
    field: &'static str,
    amount: Decimal,
    bound: Decimal,
    max_scale: u32,
) -> Result<(), LedgerError> {
    if amount.abs() >= bound {
        return Err(LedgerError::AmountOutOfRange(field));
    }
    if amount.normalize().scale() > max_scale {
        return Err(LedgerError::TooManyDecimals { field, max_scale });
    }
    Ok(())
}

/// Checks the rate against the two sides' currencies.
///
/// # Errors
///
/// Returns `RateRequired` when the currencies differ without a rate and
/// `RateNotAllowed` when they match but a rate was given.
pub fn validate_rate(
    source_currency: &str,
    target_currency: &str,
    rate: Option<Decimal>,
) -> Result<(), LedgerError> {
    match (source_currency == target_currency, rate) {
        (false, None) => Err(LedgerError::RateRequired {
            from: source_currency.to_string(),
            to: target_currency.to_string(),
        }),
        (true, Some(_)) => Err(LedgerError::RateNotAllowed(source_currency.to_string())),
        _ => Ok(()),
    }
}
