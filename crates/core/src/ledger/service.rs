//! Ledger service for transaction validation and balance planning.
//!
//! This module turns a creation request into the balance updates and the
//! immutable record the caller persists in one database transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, CategoryId, TransactionId, UserId};

use super::error::LedgerError;
use super::types::{
    AccountSnapshot, BalanceUpdate, CategorySnapshot, CategoryType, CreateTransactionInput,
    LedgerPosting, Reference, Transaction, TransactionType,
};
use super::validation::{check_storable, validate_input, validate_rate};
use crate::currency::{AMOUNT_SCALE, MAX_AMOUNT, checked_apply_rate};

/// Ledger service for money-moving operations.
///
/// This service contains pure business logic with no database dependencies.
/// Lookups are supplied by the caller, which must load accounts under a
/// row lock so the balances read here are the ones being replaced.
pub struct LedgerService;

impl LedgerService {
    /// Validates a creation request and plans its writes.
    ///
    /// This function performs all validation steps before returning:
    /// 1. Shape and amount checks (see [`validate_input`])
    /// 2. The user exists
    /// 3. Referenced accounts and categories exist, belong to the user and
    ///    are active
    /// 4. Type-specific rules: category direction, currency rate, balance
    ///    floor
    ///
    /// # Arguments
    ///
    /// * `input` - The transaction input to validate
    /// * `account_lookup` - Loads an account, `None` if it does not exist
    /// * `category_lookup` - Loads a category, `None` if it does not exist
    /// * `user_lookup` - Returns whether the user exists
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if validation fails.
    pub fn create<A, C, U>(
        input: &CreateTransactionInput,
        account_lookup: A,
        category_lookup: C,
        user_lookup: U,
    ) -> Result<LedgerPosting, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountSnapshot>,
        C: Fn(CategoryId) -> Option<CategorySnapshot>,
        U: Fn(UserId) -> bool,
    {
        validate_input(input)?;

        if !user_lookup(input.user_id) {
            return Err(LedgerError::UserNotFound(input.user_id));
        }

        match input.transaction_type {
            TransactionType::Expense => Self::create_expense(input, &account_lookup, &category_lookup),
            TransactionType::Income => Self::create_income(input, &account_lookup, &category_lookup),
            TransactionType::Transfer => Self::create_transfer(input, &account_lookup),
            TransactionType::BalanceCorrection => Err(LedgerError::BalanceCorrectionNotCreatable),
        }
    }

    /// Account to expense category.
    ///
    /// The account pays `value + fee` in its own currency; an `I_OWE`
    /// account owes that much more instead.
    fn create_expense<A, C>(
        input: &CreateTransactionInput,
        account_lookup: &A,
        category_lookup: &C,
    ) -> Result<LedgerPosting, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountSnapshot>,
        C: Fn(CategoryId) -> Option<CategorySnapshot>,
    {
        let account = resolve_account(input, Reference::FromAccount, account_lookup)?;
        let category = resolve_category(input, Reference::ToCategory, category_lookup)?;
        ensure_category_type(&category, CategoryType::Expense)?;
        validate_rate(&account.currency, &category.currency, input.currency_rate)?;

        let spent = sum(input.value, input.fee_or_zero())?;
        let new_balance = if account.account_type.is_debt() {
            sum(account.balance, spent)?
        } else {
            difference(account.balance, spent)?
        };
        ensure_in_range(new_balance)?;
        ensure_funds(&account, new_balance)?;

        let update = balance_update(&account, new_balance);
        let mut transaction = new_transaction(input, &account.currency);
        transaction.from_account_updated_balance = Some(new_balance);

        Ok(LedgerPosting {
            balance_updates: vec![update],
            transaction,
        })
    }

    /// Income category to account.
    ///
    /// The account receives `value - fee` converted into its currency; an
    /// `I_OWE` account is paid down by `value + fee` and may not go below
    /// zero.
    fn create_income<A, C>(
        input: &CreateTransactionInput,
        account_lookup: &A,
        category_lookup: &C,
    ) -> Result<LedgerPosting, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountSnapshot>,
        C: Fn(CategoryId) -> Option<CategorySnapshot>,
    {
        let category = resolve_category(input, Reference::FromCategory, category_lookup)?;
        let account = resolve_account(input, Reference::ToAccount, account_lookup)?;
        ensure_category_type(&category, CategoryType::Income)?;
        validate_rate(&category.currency, &account.currency, input.currency_rate)?;

        let fee = input.fee_or_zero();
        if fee > input.value {
            return Err(LedgerError::FeeExceedsValue {
                value: input.value,
                fee,
            });
        }

        let new_balance = if account.account_type.is_debt() {
            let paid = converted(sum(input.value, fee)?, input.currency_rate)?;
            difference(account.balance, paid)?
        } else {
            let received = converted(difference(input.value, fee)?, input.currency_rate)?;
            sum(account.balance, received)?
        };
        ensure_in_range(new_balance)?;
        if new_balance < Decimal::ZERO {
            return Err(LedgerError::Overpayment {
                account_id: account.id,
                balance: new_balance,
            });
        }

        let update = balance_update(&account, new_balance);
        let mut transaction = new_transaction(input, &category.currency);
        transaction.to_account_updated_balance = Some(new_balance);

        Ok(LedgerPosting {
            balance_updates: vec![update],
            transaction,
        })
    }

    /// Account to account.
    ///
    /// The source pays `value + fee` in its currency, the destination
    /// receives `value` converted with the single transaction rate. `I_OWE`
    /// accounts invert on either side.
    fn create_transfer<A>(
        input: &CreateTransactionInput,
        account_lookup: &A,
    ) -> Result<LedgerPosting, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountSnapshot>,
    {
        let source = resolve_account(input, Reference::FromAccount, account_lookup)?;
        let target = resolve_account(input, Reference::ToAccount, account_lookup)?;
        validate_rate(&source.currency, &target.currency, input.currency_rate)?;

        let spent = sum(input.value, input.fee_or_zero())?;
        let source_balance = if source.account_type.is_debt() {
            sum(source.balance, spent)?
        } else {
            difference(source.balance, spent)?
        };
        ensure_in_range(source_balance)?;
        ensure_funds(&source, source_balance)?;

        let received = converted(input.value, input.currency_rate)?;
        let target_balance = if target.account_type.is_debt() {
            difference(target.balance, received)?
        } else {
            sum(target.balance, received)?
        };
        ensure_in_range(target_balance)?;
        if target_balance < Decimal::ZERO {
            return Err(LedgerError::Overpayment {
                account_id: target.id,
                balance: target_balance,
            });
        }

        let mut transaction = new_transaction(input, &source.currency);
        transaction.from_account_updated_balance = Some(source_balance);
        transaction.to_account_updated_balance = Some(target_balance);

        Ok(LedgerPosting {
            balance_updates: vec![
                balance_update(&source, source_balance),
                balance_update(&target, target_balance),
            ],
            transaction,
        })
    }

    /// Plans the record left behind when an account balance is set directly.
    ///
    /// The record references the account on both sides, carries
    /// `value = new - old` and snapshots the new balance twice. Returns
    /// `None` when the balance does not change.
    ///
    /// # Errors
    ///
    /// Returns `AccountArchived` for archived accounts, `InsufficientFunds`
    /// for a negative balance on a regular account, `Overpayment` for a
    /// negative debt, and `AmountOutOfRange` or `TooManyDecimals` when the
    /// balance does not fit the ledger columns.
    pub fn balance_correction(
        account: &AccountSnapshot,
        new_balance: Decimal,
    ) -> Result<Option<LedgerPosting>, LedgerError> {
        if !account.status.is_active() {
            return Err(LedgerError::AccountArchived(account.id));
        }
        check_storable("balance", new_balance, MAX_AMOUNT, AMOUNT_SCALE)?;
        if new_balance < Decimal::ZERO {
            return Err(if account.account_type.is_debt() {
                LedgerError::Overpayment {
                    account_id: account.id,
                    balance: new_balance,
                }
            } else {
                LedgerError::InsufficientFunds {
                    account_id: account.id,
                    balance: new_balance,
                }
            });
        }
        if new_balance == account.balance {
            return Ok(None);
        }
        let value = difference(new_balance, account.balance)?;

        let transaction = Transaction {
            id: TransactionId::new(),
            user_id: account.user_id,
            transaction_type: TransactionType::BalanceCorrection,
            value,
            fee: None,
            currency: account.currency.clone(),
            currency_rate: None,
            from_account_id: Some(account.id),
            to_account_id: Some(account.id),
            from_category_id: None,
            to_category_id: None,
            from_account_updated_balance: Some(new_balance),
            to_account_updated_balance: Some(new_balance),
            note: None,
            created_at: Utc::now(),
        };

        Ok(Some(LedgerPosting {
            balance_updates: vec![balance_update(account, new_balance)],
            transaction,
        }))
    }

    /// Rejects every edit of an existing transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionOwnerMismatch` for another user's transaction and
    /// `EditNotSupported` otherwise.
    pub fn validate_can_edit(transaction: &Transaction, user_id: UserId) -> Result<(), LedgerError> {
        Self::validate_can_delete(transaction, user_id)?;
        Err(LedgerError::EditNotSupported)
    }

    /// Checks that `user_id` may delete the transaction.
    ///
    /// Deletion leaves account balances as they are.
    ///
    /// # Errors
    ///
    /// Returns `TransactionOwnerMismatch` for another user's transaction.
    pub fn validate_can_delete(transaction: &Transaction, user_id: UserId) -> Result<(), LedgerError> {
        if transaction.user_id != user_id {
            return Err(LedgerError::TransactionOwnerMismatch(transaction.id));
        }
        Ok(())
    }
}

fn resolve_account<A>(
    input: &CreateTransactionInput,
    reference: Reference,
    account_lookup: &A,
) -> Result<AccountSnapshot, LedgerError>
where
    A: Fn(AccountId) -> Option<AccountSnapshot>,
{
    let id = match reference {
        Reference::FromAccount => input.from_account_id,
        _ => input.to_account_id,
    }
    .ok_or(LedgerError::MissingReference {
        transaction_type: input.transaction_type,
        reference,
    })?;

    let account = account_lookup(id).ok_or(LedgerError::AccountNotFound(id))?;
    if account.user_id != input.user_id {
        return Err(LedgerError::AccountOwnerMismatch(id));
    }
    if !account.status.is_active() {
        return Err(LedgerError::AccountArchived(id));
    }
    Ok(account)
}

fn resolve_category<C>(
    input: &CreateTransactionInput,
    reference: Reference,
    category_lookup: &C,
) -> Result<CategorySnapshot, LedgerError>
where
    C: Fn(CategoryId) -> Option<CategorySnapshot>,
{
    let id = match reference {
        Reference::FromCategory => input.from_category_id,
        _ => input.to_category_id,
    }
    .ok_or(LedgerError::MissingReference {
        transaction_type: input.transaction_type,
        reference,
    })?;

    let category = category_lookup(id).ok_or(LedgerError::CategoryNotFound(id))?;
    if category.user_id != input.user_id {
        return Err(LedgerError::CategoryOwnerMismatch(id));
    }
    if !category.status.is_active() {
        return Err(LedgerError::CategoryArchived(id));
    }
    Ok(category)
}

fn ensure_category_type(category: &CategorySnapshot, expected: CategoryType) -> Result<(), LedgerError> {
    if category.category_type != expected {
        return Err(LedgerError::CategoryTypeMismatch {
            expected,
            actual: category.category_type,
        });
    }
    Ok(())
}

fn ensure_funds(account: &AccountSnapshot, new_balance: Decimal) -> Result<(), LedgerError> {
    if new_balance < Decimal::ZERO {
        return Err(LedgerError::InsufficientFunds {
            account_id: account.id,
            balance: new_balance,
        });
    }
    Ok(())
}

fn sum(left: Decimal, right: Decimal) -> Result<Decimal, LedgerError> {
    left.checked_add(right).ok_or(LedgerError::AmountOutOfRange("balance"))
}

fn difference(left: Decimal, right: Decimal) -> Result<Decimal, LedgerError> {
    left.checked_sub(right).ok_or(LedgerError::AmountOutOfRange("balance"))
}

fn converted(amount: Decimal, rate: Option<Decimal>) -> Result<Decimal, LedgerError> {
    checked_apply_rate(amount, rate).ok_or(LedgerError::AmountOutOfRange("value"))
}

fn ensure_in_range(balance: Decimal) -> Result<(), LedgerError> {
    if balance.abs() >= MAX_AMOUNT {
        return Err(LedgerError::AmountOutOfRange("balance"));
    }
    Ok(())
}

fn balance_update(account: &AccountSnapshot, new_balance: Decimal) -> BalanceUpdate {
    BalanceUpdate {
        account_id: account.id,
        previous_balance: account.balance,
        new_balance,
    }
}

fn new_transaction(input: &CreateTransactionInput, currency: &str) -> Transaction {
    Transaction {
        id: TransactionId::new(),
        user_id: input.user_id,
        transaction_type: input.transaction_type,
        value: input.value,
        fee: input.fee,
        currency: currency.to_string(),
        currency_rate: input.currency_rate,
        from_account_id: input.from_account_id,
        to_account_id: input.to_account_id,
        from_category_id: input.from_category_id,
        to_category_id: input.to_category_id,
        from_account_updated_balance: None,
        to_account_updated_balance: None,
        note: input.note.clone(),
        created_at: Utc::now(),
    }
}
