//! Transaction repository for money-moving database operations.
//!
//! Creation locks every referenced account row, hands the snapshots to
//! [`LedgerService`] and writes the returned posting in the same database
//! transaction.

use std::collections::HashMap;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tally_core::ledger::{
    AggregationReporter, AggregationTarget, CreateTransactionInput, LedgerError, LedgerPosting,
    LedgerService, Totals, Transaction, validate_input,
};
use tally_shared::types::{AccountId, CategoryId, TransactionId, UserId};
use tracing::{info, warn};

use super::error::RepositoryError;
use crate::entities::{accounts, transaction_categories, transactions, users};

/// Requested changes to an existing transaction.
///
/// Transactions are immutable once written; every update is rejected.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    /// New note.
    pub note: Option<String>,
}

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records an expense, income or transfer and moves account balances.
    ///
    /// Referenced accounts are locked in id order so two concurrent
    /// transfers between the same pair cannot deadlock.
    ///
    /// # Errors
    ///
    /// Returns a `LedgerError` for invalid input, unknown or foreign
    /// references, archived entities, currency mismatches and balances that
    /// would go negative. Nothing is written then.
    pub async fn create(
        &self,
        input: CreateTransactionInput,
    ) -> Result<transactions::Model, RepositoryError> {
        validate_input(&input)?;

        let txn = self.db.begin().await?;

        let mut account_ids: Vec<AccountId> = [input.from_account_id, input.to_account_id]
            .into_iter()
            .flatten()
            .collect();
        account_ids.sort_unstable();
        account_ids.dedup();

        let mut account_snapshots = HashMap::new();
        for id in account_ids {
            if let Some(account) = accounts::Entity::find_by_id(id.into_inner())
                .lock_exclusive()
                .one(&txn)
                .await?
            {
                account_snapshots.insert(id, account.snapshot());
            }
        }

        let mut category_snapshots = HashMap::new();
        for id in [input.from_category_id, input.to_category_id].into_iter().flatten() {
            if let Some(category) = transaction_categories::Entity::find_by_id(id.into_inner())
                .lock_shared()
                .one(&txn)
                .await?
            {
                category_snapshots.insert(id, category.snapshot());
            }
        }

        let user_exists = users::Entity::find_by_id(input.user_id.into_inner())
            .one(&txn)
            .await?
            .is_some();

        let posting = LedgerService::create(
            &input,
            |id| account_snapshots.get(&id).cloned(),
            |id| category_snapshots.get(&id).cloned(),
            |user_id| user_exists && user_id == input.user_id,
        )?;
        let record = apply_posting(&txn, &posting).await?;

        txn.commit().await?;

        info!(
            user_id = %input.user_id,
            transaction_id = %record.id,
            transaction_type = %input.transaction_type,
            value = %record.value,
            currency = %record.currency,
            "Transaction created"
        );
        Ok(record)
    }

    /// Gets a transaction owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` or `TransactionOwnerMismatch`.
    pub async fn get(
        &self,
        user_id: UserId,
        id: TransactionId,
    ) -> Result<transactions::Model, RepositoryError> {
        load_owned(&self.db, user_id, id).await
    }

    /// Lists transactions touching an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is unknown or belongs to another user.
    pub async fn list_for_account(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<Vec<transactions::Model>, RepositoryError> {
        owned_account(&self.db, user_id, account_id).await?;
        account_transactions(&self.db, account_id).await
    }

    /// Lists transactions touching a category, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is unknown or belongs to another user.
    pub async fn list_for_category(
        &self,
        user_id: UserId,
        category_id: CategoryId,
    ) -> Result<Vec<transactions::Model>, RepositoryError> {
        owned_category(&self.db, user_id, category_id).await?;
        category_transactions(&self.db, category_id).await
    }

    /// Rejects every edit after the ownership check.
    ///
    /// # Errors
    ///
    /// Always returns an error: `EditNotSupported` for the owner, not found
    /// or owner mismatch otherwise.
    pub async fn update(
        &self,
        user_id: UserId,
        id: TransactionId,
        _changes: UpdateTransactionInput,
    ) -> Result<transactions::Model, RepositoryError> {
        let record = transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))?;

        LedgerService::validate_can_edit(&Transaction::from(record), user_id)?;
        Err(LedgerError::EditNotSupported.into())
    }

    /// Deletes a transaction.
    ///
    /// The row is removed; account balances keep the values the
    /// transaction produced.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` or `TransactionOwnerMismatch`.
    pub async fn delete(&self, user_id: UserId, id: TransactionId) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        let record = load_owned(&txn, user_id, id).await?;

        transactions::Entity::delete_by_id(record.id).exec(&txn).await?;
        txn.commit().await?;

        warn!(
            user_id = %user_id,
            transaction_id = %id,
            from_account_id = ?record.from_account_id,
            to_account_id = ?record.to_account_id,
            value = %record.value,
            "Transaction deleted without balance reversal"
        );
        Ok(())
    }

    /// Calculates `{from, to}` totals for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is unknown or belongs to another user.
    pub async fn totals_for_account(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<Totals, RepositoryError> {
        let account = owned_account(&self.db, user_id, account_id).await?;
        let records = account_transactions(&self.db, account_id).await?;

        let target = AggregationTarget::Account {
            id: account_id,
            currency: account.currency,
        };
        Ok(aggregate(records, &target))
    }

    /// Calculates `{from, to}` totals for a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is unknown or belongs to another user.
    pub async fn totals_for_category(
        &self,
        user_id: UserId,
        category_id: CategoryId,
    ) -> Result<Totals, RepositoryError> {
        owned_category(&self.db, user_id, category_id).await?;
        let records = category_transactions(&self.db, category_id).await?;
        Ok(aggregate(records, &AggregationTarget::Category(category_id)))
    }
}

/// Writes a ledger posting: new balances first, then the transaction row.
pub(crate) async fn apply_posting<C: ConnectionTrait>(
    db: &C,
    posting: &LedgerPosting,
) -> Result<transactions::Model, RepositoryError> {
    for update in &posting.balance_updates {
        accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(update.new_balance))
            .col_expr(accounts::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(accounts::Column::Id.eq(update.account_id.into_inner()))
            .exec(db)
            .await?;
    }

    let record = transactions::ActiveModel::from(&posting.transaction)
        .insert(db)
        .await?;
    Ok(record)
}

async fn load_owned<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    id: TransactionId,
) -> Result<transactions::Model, RepositoryError> {
    let record = transactions::Entity::find_by_id(id.into_inner())
        .one(db)
        .await?
        .ok_or(LedgerError::TransactionNotFound(id))?;

    if record.user_id != user_id.into_inner() {
        return Err(LedgerError::TransactionOwnerMismatch(id).into());
    }
    Ok(record)
}

async fn owned_account<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    id: AccountId,
) -> Result<accounts::Model, RepositoryError> {
    let account = accounts::Entity::find_by_id(id.into_inner())
        .one(db)
        .await?
        .ok_or(LedgerError::AccountNotFound(id))?;

    if account.user_id != user_id.into_inner() {
        return Err(LedgerError::AccountOwnerMismatch(id).into());
    }
    Ok(account)
}

async fn owned_category<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    id: CategoryId,
) -> Result<transaction_categories::Model, RepositoryError> {
    let category = transaction_categories::Entity::find_by_id(id.into_inner())
        .one(db)
        .await?
        .ok_or(LedgerError::CategoryNotFound(id))?;

    if category.user_id != user_id.into_inner() {
        return Err(LedgerError::CategoryOwnerMismatch(id).into());
    }
    Ok(category)
}

async fn account_transactions<C: ConnectionTrait>(
    db: &C,
    account_id: AccountId,
) -> Result<Vec<transactions::Model>, RepositoryError> {
    let records = transactions::Entity::find()
        .filter(
            Condition::any()
                .add(transactions::Column::FromAccountId.eq(account_id.into_inner()))
                .add(transactions::Column::ToAccountId.eq(account_id.into_inner())),
        )
        .order_by_desc(transactions::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(records)
}

async fn category_transactions<C: ConnectionTrait>(
    db: &C,
    category_id: CategoryId,
) -> Result<Vec<transactions::Model>, RepositoryError> {
    let records = transactions::Entity::find()
        .filter(
            Condition::any()
                .add(transactions::Column::FromCategoryId.eq(category_id.into_inner()))
                .add(transactions::Column::ToCategoryId.eq(category_id.into_inner())),
        )
        .order_by_desc(transactions::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(records)
}

fn aggregate(records: Vec<transactions::Model>, target: &AggregationTarget) -> Totals {
    let transactions: Vec<Transaction> = records.into_iter().map(Transaction::from).collect();
    AggregationReporter::aggregate(&transactions, target)
}
