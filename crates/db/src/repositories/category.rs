//! Transaction category repository.
//!
//! Categories form a two-level tree grouped by `(user, type, parent)`.
//! Archiving or deleting a root category moves its children to the end of
//! the root group.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tally_core::ledger;
use tally_core::ordering::{
    ArchivalCoordinator, ArchivePlan, EntityStatus as OrderStatus, HierarchyNode, OrderSequencer,
    OrderWrite, OrderingError, PlacementWrite, ReorderValidator, TreeNode, ensure_capacity,
    validate_parent_assignment,
};
use tally_shared::LimitsConfig;
use tally_shared::types::{CategoryId, UserId};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::RepositoryError;
use super::user::lock_owner;
use crate::entities::sea_orm_active_enums::{CategoryType, EntityStatus};
use crate::entities::transaction_categories;

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Owner.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Income or expense.
    pub category_type: ledger::CategoryType,
    /// ISO currency code.
    pub currency: String,
    /// Parent category; `None` creates a root category.
    pub parent_id: Option<CategoryId>,
}

/// Input for updating a category.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New display name.
    pub name: Option<String>,
    /// New parent; `Some(None)` moves the category to the root level.
    pub parent_id: Option<Option<CategoryId>>,
}

/// Transaction category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
    limits: LimitsConfig,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, limits: LimitsConfig) -> Self {
        Self { db, limits }
    }

    /// Creates a category at the end of its `(type, parent)` group.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The user does not exist
    /// - The user already owns the maximum number of active categories
    /// - The parent does not exist for this user, or breaks a hierarchy rule
    pub async fn create(
        &self,
        input: CreateCategoryInput,
    ) -> Result<transaction_categories::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        lock_owner(&txn, input.user_id).await?;
        self.check_capacity(&txn, input.user_id).await?;

        let id = CategoryId::new();
        if let Some(parent_id) = input.parent_id {
            let parent = load_parent(&txn, input.user_id, parent_id).await?;
            let child = HierarchyNode {
                id,
                user_id: input.user_id,
                kind: input.category_type,
                parent: None,
                status: OrderStatus::Active,
                child_count: 0,
            };
            validate_parent_assignment(&child, &parent.hierarchy_node(0))?;
        }

        let category_type = CategoryType::from(input.category_type);
        let group = active_group(&txn, input.user_id, category_type, input.parent_id.map(CategoryId::into_inner)).await?;
        let order = OrderSequencer::append_position(group.len());

        let now = Utc::now().into();
        let category = transaction_categories::ActiveModel {
            id: Set(id.into_inner()),
            user_id: Set(input.user_id.into_inner()),
            name: Set(input.name),
            category_type: Set(category_type),
            currency: Set(input.currency),
            parent_id: Set(input.parent_id.map(CategoryId::into_inner)),
            sort_order: Set(Some(order)),
            status: Set(EntityStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let category = category.insert(&txn).await?;

        txn.commit().await?;

        info!(
            user_id = %input.user_id,
            category_id = %id,
            parent_id = ?input.parent_id,
            order,
            "Category created"
        );
        Ok(category)
    }

    /// Finds a category owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids and `Forbidden` for another user's
    /// category.
    pub async fn find(
        &self,
        user_id: UserId,
        id: CategoryId,
    ) -> Result<transaction_categories::Model, RepositoryError> {
        load_owned(&self.db, user_id, id, false).await
    }

    /// Lists active categories ordered by type, then position.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(
        &self,
        user_id: UserId,
    ) -> Result<Vec<transaction_categories::Model>, RepositoryError> {
        let categories = transaction_categories::Entity::find()
            .filter(transaction_categories::Column::UserId.eq(user_id.into_inner()))
            .filter(transaction_categories::Column::Status.eq(EntityStatus::Active))
            .order_by_asc(transaction_categories::Column::CategoryType)
            .order_by_asc(transaction_categories::Column::SortOrder)
            .all(&self.db)
            .await?;
        Ok(categories)
    }

    /// Renames a category and/or moves it under another parent.
    ///
    /// A move leaves the old group, which is resequenced, and appends to
    /// the new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is not the user's, is archived, or
    /// the new parent breaks a hierarchy rule.
    pub async fn update(
        &self,
        user_id: UserId,
        id: CategoryId,
        input: UpdateCategoryInput,
    ) -> Result<transaction_categories::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        lock_owner(&txn, user_id).await?;
        let category = load_owned(&txn, user_id, id, true).await?;
        if category.status == EntityStatus::Archived {
            return Err(OrderingError::AlreadyArchived(id.to_string()).into());
        }

        let target_parent = input
            .parent_id
            .filter(|parent| *parent != category.parent_id.map(CategoryId::from));

        let mut active: transaction_categories::ActiveModel = category.clone().into();
        if let Some(new_parent) = target_parent {
            if let Some(parent_id) = new_parent {
                let parent = load_parent(&txn, user_id, parent_id).await?;
                let child_count = active_children(&txn, id).await?.len();
                validate_parent_assignment(
                    &category.hierarchy_node(child_count),
                    &parent.hierarchy_node(0),
                )?;
            }

            let old_group = active_group(&txn, user_id, category.category_type, category.parent_id).await?;
            let departure = ArchivalCoordinator::plan(&category, &old_group)?;
            let new_group = active_group(
                &txn,
                user_id,
                category.category_type,
                new_parent.map(CategoryId::into_inner),
            )
            .await?;

            apply_order_writes(&txn, &departure.sibling_writes).await?;
            active.parent_id = Set(new_parent.map(CategoryId::into_inner));
            active.sort_order = Set(Some(OrderSequencer::append_position(new_group.len())));
        }
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            user_id = %user_id,
            category_id = %id,
            parent_id = ?updated.parent_id,
            "Category updated"
        );
        Ok(updated)
    }

    /// Applies a caller-submitted tree to every active category of one type.
    ///
    /// Root nodes are placed at the root level, child nodes under the parent
    /// they were submitted with.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails; nothing is written then.
    pub async fn reorder(
        &self,
        user_id: UserId,
        category_type: ledger::CategoryType,
        nodes: &[TreeNode<CategoryId>],
    ) -> Result<Vec<transaction_categories::Model>, RepositoryError> {
        let category_type = CategoryType::from(category_type);

        let txn = self.db.begin().await?;
        lock_owner(&txn, user_id).await?;

        let active_ids: Vec<CategoryId> = active_of_type(&txn, user_id, category_type)
            .await?
            .iter()
            .map(|c| CategoryId::from(c.id))
            .collect();
        let placements = ReorderValidator::validate_tree(nodes, &active_ids)?;
        apply_placements(&txn, &placements).await?;

        let reordered = active_of_type(&txn, user_id, category_type).await?;
        txn.commit().await?;

        info!(
            user_id = %user_id,
            category_type = ?category_type,
            count = placements.len(),
            "Categories reordered"
        );
        Ok(reordered)
    }

    /// Archives a category, moving its children to the root level.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is not the user's or is already
    /// archived.
    pub async fn archive(
        &self,
        user_id: UserId,
        id: CategoryId,
    ) -> Result<transaction_categories::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        lock_owner(&txn, user_id).await?;
        let category = load_owned(&txn, user_id, id, true).await?;

        let plan = plan_removal(&txn, user_id, &category).await?;

        let mut active: transaction_categories::ActiveModel = category.into();
        active.status = Set(EntityStatus::Archived);
        active.sort_order = Set(None);
        active.parent_id = Set(None);
        active.updated_at = Set(Utc::now().into());
        let archived = active.update(&txn).await?;

        apply_plan(&txn, &plan).await?;

        txn.commit().await?;

        info!(
            user_id = %user_id,
            category_id = %id,
            detached_children = plan.detached_children.len(),
            resequenced = plan.sibling_writes.len(),
            "Category archived"
        );
        Ok(archived)
    }

    /// Re-activates an archived category at the end of the root group.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is not archived or the user already
    /// owns the maximum number of active categories.
    pub async fn reactivate(
        &self,
        user_id: UserId,
        id: CategoryId,
    ) -> Result<transaction_categories::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        lock_owner(&txn, user_id).await?;
        let category = load_owned(&txn, user_id, id, true).await?;

        let root_group = active_group(&txn, user_id, category.category_type, None).await?;
        let order = ArchivalCoordinator::reactivation_position(&category, root_group.len())?;
        self.check_capacity(&txn, user_id).await?;

        let mut active: transaction_categories::ActiveModel = category.into();
        active.status = Set(EntityStatus::Active);
        active.parent_id = Set(None);
        active.sort_order = Set(Some(order));
        active.updated_at = Set(Utc::now().into());
        let reactivated = active.update(&txn).await?;

        txn.commit().await?;

        info!(user_id = %user_id, category_id = %id, order, "Category re-activated");
        Ok(reactivated)
    }

    /// Deletes a category.
    ///
    /// An active category is first detached exactly like [`Self::archive`].
    /// Transactions referencing it keep a null category.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is not the user's.
    pub async fn delete(&self, user_id: UserId, id: CategoryId) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        lock_owner(&txn, user_id).await?;
        let category = load_owned(&txn, user_id, id, true).await?;

        let plan = if category.status == EntityStatus::Active {
            Some(plan_removal(&txn, user_id, &category).await?)
        } else {
            None
        };

        transaction_categories::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await?;
        if let Some(plan) = &plan {
            apply_plan(&txn, plan).await?;
        }

        txn.commit().await?;

        info!(
            user_id = %user_id,
            category_id = %id,
            detached_children = plan.as_ref().map_or(0, |p| p.detached_children.len()),
            "Category deleted"
        );
        Ok(())
    }

    async fn check_capacity<C: ConnectionTrait>(&self, db: &C, user_id: UserId) -> Result<(), RepositoryError> {
        let active_total = transaction_categories::Entity::find()
            .filter(transaction_categories::Column::UserId.eq(user_id.into_inner()))
            .filter(transaction_categories::Column::Status.eq(EntityStatus::Active))
            .count(db)
            .await?;

        if let Err(err) = ensure_capacity(active_total, self.limits.max_categories_per_user) {
            warn!(user_id = %user_id, active_total, "Category limit reached");
            return Err(err.into());
        }
        Ok(())
    }
}

/// Loads a category and checks its owner, optionally under a row lock.
async fn load_owned<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    id: CategoryId,
    lock: bool,
) -> Result<transaction_categories::Model, RepositoryError> {
    let mut query = transaction_categories::Entity::find_by_id(id.into_inner());
    if lock {
        query = query.lock_exclusive();
    }

    let category = query
        .one(db)
        .await?
        .ok_or_else(|| RepositoryError::not_found("TransactionCategory", id.into_inner()))?;

    if category.user_id != user_id.into_inner() {
        return Err(RepositoryError::forbidden("TransactionCategory", id.into_inner()));
    }
    Ok(category)
}

/// Loads a would-be parent; another user's category counts as missing.
async fn load_parent<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    parent_id: CategoryId,
) -> Result<transaction_categories::Model, RepositoryError> {
    transaction_categories::Entity::find_by_id(parent_id.into_inner())
        .filter(transaction_categories::Column::UserId.eq(user_id.into_inner()))
        .one(db)
        .await?
        .ok_or_else(|| OrderingError::ParentNotFound(parent_id.to_string()).into())
}

/// Active members of one `(user, type, parent)` group in position order.
async fn active_group<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    category_type: CategoryType,
    parent_id: Option<Uuid>,
) -> Result<Vec<transaction_categories::Model>, RepositoryError> {
    let parent_filter = match parent_id {
        Some(parent) => transaction_categories::Column::ParentId.eq(parent),
        None => transaction_categories::Column::ParentId.is_null(),
    };

    let group = transaction_categories::Entity::find()
        .filter(transaction_categories::Column::UserId.eq(user_id.into_inner()))
        .filter(transaction_categories::Column::CategoryType.eq(category_type))
        .filter(transaction_categories::Column::Status.eq(EntityStatus::Active))
        .filter(parent_filter)
        .order_by_asc(transaction_categories::Column::SortOrder)
        .order_by_asc(transaction_categories::Column::Id)
        .all(db)
        .await?;
    Ok(group)
}

async fn active_of_type<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    category_type: CategoryType,
) -> Result<Vec<transaction_categories::Model>, RepositoryError> {
    let categories = transaction_categories::Entity::find()
        .filter(transaction_categories::Column::UserId.eq(user_id.into_inner()))
        .filter(transaction_categories::Column::CategoryType.eq(category_type))
        .filter(transaction_categories::Column::Status.eq(EntityStatus::Active))
        .order_by_asc(transaction_categories::Column::SortOrder)
        .all(db)
        .await?;
    Ok(categories)
}

async fn active_children<C: ConnectionTrait>(
    db: &C,
    parent_id: CategoryId,
) -> Result<Vec<transaction_categories::Model>, RepositoryError> {
    let children = transaction_categories::Entity::find()
        .filter(transaction_categories::Column::ParentId.eq(parent_id.into_inner()))
        .filter(transaction_categories::Column::Status.eq(EntityStatus::Active))
        .order_by_asc(transaction_categories::Column::SortOrder)
        .all(db)
        .await?;
    Ok(children)
}

/// Loads the siblings and children of `category` and plans its removal.
async fn plan_removal<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    category: &transaction_categories::Model,
) -> Result<ArchivePlan<CategoryId>, RepositoryError> {
    let siblings = active_group(db, user_id, category.category_type, category.parent_id).await?;
    let children = active_children(db, CategoryId::from(category.id)).await?;
    let plan = ArchivalCoordinator::plan_with_children(category, &siblings, Some(children.as_slice()))?;
    Ok(plan)
}

async fn apply_plan<C: ConnectionTrait>(
    db: &C,
    plan: &ArchivePlan<CategoryId>,
) -> Result<(), RepositoryError> {
    apply_placements(db, &plan.detached_children).await?;
    apply_order_writes(db, &plan.sibling_writes).await
}

async fn apply_order_writes<C: ConnectionTrait>(
    db: &C,
    writes: &[OrderWrite<CategoryId>],
) -> Result<(), RepositoryError> {
    for write in writes {
        transaction_categories::Entity::update_many()
            .col_expr(transaction_categories::Column::SortOrder, Expr::value(write.order))
            .col_expr(
                transaction_categories::Column::UpdatedAt,
                Expr::current_timestamp().into(),
            )
            .filter(transaction_categories::Column::Id.eq(Uuid::from(write.id)))
            .exec(db)
            .await?;
    }
    debug!(count = writes.len(), "Category group resequenced");
    Ok(())
}

async fn apply_placements<C: ConnectionTrait>(
    db: &C,
    placements: &[PlacementWrite<CategoryId>],
) -> Result<(), RepositoryError> {
    for placement in placements {
        transaction_categories::Entity::update_many()
            .col_expr(transaction_categories::Column::SortOrder, Expr::value(placement.order))
            .col_expr(
                transaction_categories::Column::ParentId,
                Expr::value(placement.parent.map(CategoryId::into_inner)),
            )
            .col_expr(
                transaction_categories::Column::UpdatedAt,
                Expr::current_timestamp().into(),
            )
            .filter(transaction_categories::Column::Id.eq(Uuid::from(placement.id)))
            .exec(db)
            .await?;
    }
    debug!(count = placements.len(), "Categories placed");
    Ok(())
}
