//! Account repository for account lifecycle and ordering.
//!
//! Accounts are grouped by `(user, type)`. Every structural change locks the
//! owner row, asks `tally-core` for a write plan and applies it inside the
//! same database transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tally_core::currency::{AMOUNT_SCALE, MAX_AMOUNT};
use tally_core::ledger::{self, LedgerService, check_storable};
use tally_core::ordering::{
    ArchivalCoordinator, OrderNode, OrderSequencer, OrderWrite, OrderingError, Position,
    ReorderValidator, ensure_capacity,
};
use tally_shared::LimitsConfig;
use tally_shared::types::{AccountId, UserId};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::RepositoryError;
use super::transaction::apply_posting;
use super::user::lock_owner;
use crate::entities::sea_orm_active_enums::{AccountType, EntityStatus};
use crate::entities::{accounts, transactions};

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Owner.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Account type; decides the ordering group.
    pub account_type: ledger::AccountType,
    /// ISO currency code.
    pub currency: String,
    /// Opening balance; the balance starts here.
    pub init_balance: Decimal,
}

/// Input for updating an account.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// New display name.
    pub name: Option<String>,
    /// New position within the account's group.
    pub order: Option<Position>,
}

/// Account repository for CRUD and ordering operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
    limits: LimitsConfig,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, limits: LimitsConfig) -> Self {
        Self { db, limits }
    }

    /// Creates an account at the end of its type group.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The user does not exist
    /// - The user already owns the maximum number of active accounts
    /// - The opening balance does not fit the balance column
    pub async fn create(&self, input: CreateAccountInput) -> Result<accounts::Model, RepositoryError> {
        check_storable("initBalance", input.init_balance, MAX_AMOUNT, AMOUNT_SCALE)?;

        let txn = self.db.begin().await?;
        lock_owner(&txn, input.user_id).await?;

        self.check_capacity(&txn, input.user_id).await?;

        let account_type = AccountType::from(input.account_type);
        let group = active_group(&txn, input.user_id, account_type).await?;
        let order = OrderSequencer::append_position(group.len());

        let now = Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            user_id: Set(input.user_id.into_inner()),
            name: Set(input.name),
            account_type: Set(account_type),
            currency: Set(input.currency),
            balance: Set(input.init_balance),
            init_balance: Set(input.init_balance),
            sort_order: Set(Some(order)),
            status: Set(EntityStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let account = account.insert(&txn).await?;

        txn.commit().await?;

        info!(
            user_id = %input.user_id,
            account_id = %account.id,
            account_type = ?account_type,
            order,
            "Account created"
        );
        Ok(account)
    }

    /// Finds an account owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids and `Forbidden` for another user's
    /// account.
    pub async fn find(&self, user_id: UserId, id: AccountId) -> Result<accounts::Model, RepositoryError> {
        load_owned(&self.db, user_id, id, false).await
    }

    /// Lists active accounts ordered by type, then position.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(&self, user_id: UserId) -> Result<Vec<accounts::Model>, RepositoryError> {
        let accounts = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.into_inner()))
            .filter(accounts::Column::Status.eq(EntityStatus::Active))
            .order_by_asc(accounts::Column::AccountType)
            .order_by_asc(accounts::Column::SortOrder)
            .all(&self.db)
            .await?;
        Ok(accounts)
    }

    /// Lists archived accounts, most recently changed first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_archived(&self, user_id: UserId) -> Result<Vec<accounts::Model>, RepositoryError> {
        let accounts = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.into_inner()))
            .filter(accounts::Column::Status.eq(EntityStatus::Archived))
            .order_by_desc(accounts::Column::UpdatedAt)
            .all(&self.db)
            .await?;
        Ok(accounts)
    }

    /// Renames an account and/or moves it within its group.
    ///
    /// Moving resequences the whole group.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is not the user's, is archived, or
    /// the target position is outside the group.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AccountId,
        input: UpdateAccountInput,
    ) -> Result<accounts::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        lock_owner(&txn, user_id).await?;
        let account = load_owned(&txn, user_id, id, true).await?;
        ensure_active(&account)?;

        if let Some(target) = input.order {
            let group = active_group(&txn, user_id, account.account_type).await?;
            let writes = OrderSequencer::relocate(&group, id, target)?;
            apply_order_writes(&txn, &writes).await?;
        }

        if let Some(name) = input.name {
            accounts::Entity::update_many()
                .col_expr(accounts::Column::Name, Expr::value(name))
                .col_expr(accounts::Column::UpdatedAt, Expr::current_timestamp().into())
                .filter(accounts::Column::Id.eq(id.into_inner()))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;

        info!(user_id = %user_id, account_id = %id, "Account updated");
        self.find(user_id, id).await
    }

    /// Moves an account into another type group.
    ///
    /// The account leaves its old group, which is resequenced, and is
    /// appended to the new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is not the user's or is archived.
    pub async fn change_type(
        &self,
        user_id: UserId,
        id: AccountId,
        account_type: ledger::AccountType,
    ) -> Result<accounts::Model, RepositoryError> {
        let new_type = AccountType::from(account_type);

        let txn = self.db.begin().await?;
        lock_owner(&txn, user_id).await?;
        let account = load_owned(&txn, user_id, id, true).await?;
        if account.account_type == new_type {
            return Ok(account);
        }

        let old_group = active_group(&txn, user_id, account.account_type).await?;
        let departure = ArchivalCoordinator::plan(&account, &old_group)?;
        let new_group = active_group(&txn, user_id, new_type).await?;
        let order = OrderSequencer::append_position(new_group.len());

        let mut active: accounts::ActiveModel = account.into();
        active.account_type = Set(new_type);
        active.sort_order = Set(Some(order));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        apply_order_writes(&txn, &departure.sibling_writes).await?;

        txn.commit().await?;

        info!(
            user_id = %user_id,
            account_id = %id,
            account_type = ?new_type,
            order,
            "Account type changed"
        );
        Ok(updated)
    }

    /// Applies a caller-submitted order to one type group.
    ///
    /// The submission must list every active account of the group exactly
    /// once with orders `0..n`.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails; nothing is written then.
    pub async fn reorder(
        &self,
        user_id: UserId,
        account_type: ledger::AccountType,
        nodes: &[OrderNode<AccountId>],
    ) -> Result<Vec<accounts::Model>, RepositoryError> {
        let account_type = AccountType::from(account_type);

        let txn = self.db.begin().await?;
        lock_owner(&txn, user_id).await?;

        let group = active_group(&txn, user_id, account_type).await?;
        let active_ids: Vec<AccountId> = group.iter().map(|a| AccountId::from(a.id)).collect();
        let writes = ReorderValidator::validate_flat(nodes, &active_ids)?;
        apply_order_writes(&txn, &writes).await?;

        let reordered = active_group(&txn, user_id, account_type).await?;
        txn.commit().await?;

        info!(
            user_id = %user_id,
            account_type = ?account_type,
            count = writes.len(),
            "Accounts reordered"
        );
        Ok(reordered)
    }

    /// Archives an account and closes the gap it leaves.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is not the user's or is already
    /// archived.
    pub async fn archive(&self, user_id: UserId, id: AccountId) -> Result<accounts::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        lock_owner(&txn, user_id).await?;
        let account = load_owned(&txn, user_id, id, true).await?;

        let group = active_group(&txn, user_id, account.account_type).await?;
        let plan = ArchivalCoordinator::plan(&account, &group)?;

        let mut active: accounts::ActiveModel = account.into();
        active.status = Set(EntityStatus::Archived);
        active.sort_order = Set(None);
        active.updated_at = Set(Utc::now().into());
        let archived = active.update(&txn).await?;

        apply_order_writes(&txn, &plan.sibling_writes).await?;

        txn.commit().await?;

        info!(
            user_id = %user_id,
            account_id = %id,
            resequenced = plan.sibling_writes.len(),
            "Account archived"
        );
        Ok(archived)
    }

    /// Re-activates an archived account at the end of its type group.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is not archived or the user already
    /// owns the maximum number of active accounts.
    pub async fn reactivate(&self, user_id: UserId, id: AccountId) -> Result<accounts::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        lock_owner(&txn, user_id).await?;
        let account = load_owned(&txn, user_id, id, true).await?;

        let group = active_group(&txn, user_id, account.account_type).await?;
        let order = ArchivalCoordinator::reactivation_position(&account, group.len())?;
        self.check_capacity(&txn, user_id).await?;

        let mut active: accounts::ActiveModel = account.into();
        active.status = Set(EntityStatus::Active);
        active.sort_order = Set(Some(order));
        active.updated_at = Set(Utc::now().into());
        let reactivated = active.update(&txn).await?;

        txn.commit().await?;

        info!(user_id = %user_id, account_id = %id, order, "Account re-activated");
        Ok(reactivated)
    }

    /// Sets an account balance directly, recording a balance correction.
    ///
    /// Returns the correction record, or `None` if the balance was already
    /// `new_balance`.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is not the user's or is archived, or
    /// if `new_balance` is negative or does not fit the balance column.
    pub async fn correct_balance(
        &self,
        user_id: UserId,
        id: AccountId,
        new_balance: Decimal,
    ) -> Result<Option<transactions::Model>, RepositoryError> {
        let txn = self.db.begin().await?;
        let account = load_owned(&txn, user_id, id, true).await?;

        let Some(posting) = LedgerService::balance_correction(&account.snapshot(), new_balance)? else {
            return Ok(None);
        };
        let record = apply_posting(&txn, &posting).await?;

        txn.commit().await?;

        info!(
            user_id = %user_id,
            account_id = %id,
            transaction_id = %record.id,
            delta = %record.value,
            "Balance corrected"
        );
        Ok(Some(record))
    }

    async fn check_capacity<C: ConnectionTrait>(&self, db: &C, user_id: UserId) -> Result<(), RepositoryError> {
        let active_total = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.into_inner()))
            .filter(accounts::Column::Status.eq(EntityStatus::Active))
            .count(db)
            .await?;

        if let Err(err) = ensure_capacity(active_total, self.limits.max_accounts_per_user) {
            warn!(user_id = %user_id, active_total, "Account limit reached");
            return Err(err.into());
        }
        Ok(())
    }
}

/// Loads an account and checks its owner, optionally under a row lock.
async fn load_owned<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    id: AccountId,
    lock: bool,
) -> Result<accounts::Model, RepositoryError> {
    let mut query = accounts::Entity::find_by_id(id.into_inner());
    if lock {
        query = query.lock_exclusive();
    }

    let account = query
        .one(db)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Account", id.into_inner()))?;

    if account.user_id != user_id.into_inner() {
        return Err(RepositoryError::forbidden("Account", id.into_inner()));
    }
    Ok(account)
}

fn ensure_active(account: &accounts::Model) -> Result<(), OrderingError> {
    if account.status == EntityStatus::Archived {
        return Err(OrderingError::AlreadyArchived(account.id.to_string()));
    }
    Ok(())
}

/// Active members of one `(user, type)` group in position order.
async fn active_group<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    account_type: AccountType,
) -> Result<Vec<accounts::Model>, RepositoryError> {
    let group = accounts::Entity::find()
        .filter(accounts::Column::UserId.eq(user_id.into_inner()))
        .filter(accounts::Column::AccountType.eq(account_type))
        .filter(accounts::Column::Status.eq(EntityStatus::Active))
        .order_by_asc(accounts::Column::SortOrder)
        .order_by_asc(accounts::Column::Id)
        .all(db)
        .await?;
    Ok(group)
}

async fn apply_order_writes<C: ConnectionTrait>(
    db: &C,
    writes: &[OrderWrite<AccountId>],
) -> Result<(), RepositoryError> {
    for write in writes {
        accounts::Entity::update_many()
            .col_expr(accounts::Column::SortOrder, Expr::value(write.order))
            .col_expr(accounts::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(accounts::Column::Id.eq(Uuid::from(write.id)))
            .exec(db)
            .await?;
    }
    debug!(count = writes.len(), "Account group resequenced");
    Ok(())
}
