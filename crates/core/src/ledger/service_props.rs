//! Property-based tests for LedgerService.
//!
//! - Expense and transfer sources move by exactly `value + fee`
//! - Debt accounts move in the opposite direction
//! - A rejected creation never plans a write

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, CategoryId, UserId};

use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{
    AccountSnapshot, AccountType, CategorySnapshot, CategoryType, CreateTransactionInput,
    LedgerPosting, TransactionType,
};
use crate::currency::apply_rate;
use crate::ordering::EntityStatus;

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate balances (0.00 to 10,000.00).
fn balance() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive exchange rates (0.0001 to 100.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn account_type() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Cash),
        Just(AccountType::Bank),
        Just(AccountType::CreditCard),
        Just(AccountType::Savings),
        Just(AccountType::Investment),
        Just(AccountType::IOwe),
        Just(AccountType::OweMe),
    ]
}

fn make_account(user: UserId, account_type: AccountType, balance: Decimal, currency: &str) -> AccountSnapshot {
    AccountSnapshot {
        id: AccountId::new(),
        user_id: user,
        account_type,
        balance,
        currency: currency.to_string(),
        status: EntityStatus::Active,
    }
}

fn make_input(user: UserId, transaction_type: TransactionType, value: Decimal, fee: Decimal) -> CreateTransactionInput {
    CreateTransactionInput {
        user_id: user,
        transaction_type,
        value,
        fee: Some(fee),
        currency_rate: None,
        from_account_id: None,
        to_account_id: None,
        from_category_id: None,
        to_category_id: None,
        note: None,
    }
}

fn run(
    input: &CreateTransactionInput,
    accounts: &[AccountSnapshot],
    categories: &[CategorySnapshot],
) -> Result<LedgerPosting, LedgerError> {
    LedgerService::create(
        input,
        |id| accounts.iter().find(|a| a.id == id).cloned(),
        |id| categories.iter().find(|c| c.id == id).cloned(),
        |_| true,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// An accepted expense moves the balance by exactly `value + fee`.
    #[test]
    fn prop_expense_moves_by_value_plus_fee(
        kind in account_type(),
        start in balance(),
        value in positive_amount(),
        fee in balance(),
    ) {
        let user = UserId::new();
        let account = make_account(user, kind, start, "USD");
        let category = CategorySnapshot {
            id: CategoryId::new(),
            user_id: user,
            category_type: CategoryType::Expense,
            currency: "USD".to_string(),
            status: EntityStatus::Active,
        };
        let input = CreateTransactionInput {
            from_account_id: Some(account.id),
            to_category_id: Some(category.id),
            ..make_input(user, TransactionType::Expense, value, fee)
        };

        match run(&input, &[account], &[category]) {
            Ok(posting) => {
                let update = posting.balance_updates[0];
                let moved = (update.new_balance - update.previous_balance).abs();
                prop_assert_eq!(moved, value + fee);
                prop_assert!(update.new_balance >= Decimal::ZERO);
                prop_assert_eq!(posting.transaction.from_account_updated_balance, Some(update.new_balance));
                if kind.is_debt() {
                    prop_assert!(update.new_balance > update.previous_balance);
                }
            }
            Err(err) => {
                prop_assert!(!kind.is_debt());
                prop_assert!(start < value + fee);
                prop_assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");
            }
        }
    }

    /// A transfer debits the source by `value + fee` and credits the rate-applied value.
    #[test]
    fn prop_transfer_is_symmetric(
        start in balance(),
        value in positive_amount(),
        fee in balance(),
        rate in positive_rate(),
    ) {
        let user = UserId::new();
        let source = make_account(user, AccountType::Bank, start, "USD");
        let target = make_account(user, AccountType::Savings, Decimal::ZERO, "EUR");
        let input = CreateTransactionInput {
            currency_rate: Some(rate),
            from_account_id: Some(source.id),
            to_account_id: Some(target.id),
            ..make_input(user, TransactionType::Transfer, value, fee)
        };

        let result = run(&input, &[source, target], &[]);

        if start >= value + fee {
            let posting = result.unwrap();
            prop_assert_eq!(posting.balance_updates[0].new_balance, start - value - fee);
            prop_assert_eq!(posting.balance_updates[1].new_balance, apply_rate(value, Some(rate)));
            prop_assert_eq!(posting.transaction.currency.as_str(), "USD");
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// Income into a debt account never leaves it below zero.
    #[test]
    fn prop_debt_income_never_negative(
        start in balance(),
        value in positive_amount(),
    ) {
        let user = UserId::new();
        let account = make_account(user, AccountType::IOwe, start, "USD");
        let category = CategorySnapshot {
            id: CategoryId::new(),
            user_id: user,
            category_type: CategoryType::Income,
            currency: "USD".to_string(),
            status: EntityStatus::Active,
        };
        let input = CreateTransactionInput {
            from_category_id: Some(category.id),
            to_account_id: Some(account.id),
            ..make_input(user, TransactionType::Income, value, Decimal::ZERO)
        };

        match run(&input, &[account], &[category]) {
            Ok(posting) => prop_assert_eq!(posting.balance_updates[0].new_balance, start - value),
            Err(err) => {
                prop_assert!(value > start);
                prop_assert_eq!(err.error_code(), "OVERPAYMENT");
            }
        }
    }
}
