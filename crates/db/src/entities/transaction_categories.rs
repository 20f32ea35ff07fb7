//! `SeaORM` Entity for transaction_categories table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::ledger::{self, CategorySnapshot};
use tally_core::ordering::{self, HierarchyNode, Nested, Ordered, Position};
use tally_shared::types::{CategoryId, UserId};

use super::sea_orm_active_enums::{CategoryType, EntityStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub category_type: CategoryType,
    pub currency: String,
    pub parent_id: Option<Uuid>,
    pub sort_order: Option<i32>,
    pub status: EntityStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    Parent,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The fields the ledger reads.
    #[must_use]
    pub fn snapshot(&self) -> CategorySnapshot {
        CategorySnapshot {
            id: CategoryId::from(self.id),
            user_id: UserId::from(self.user_id),
            category_type: self.category_type.into(),
            currency: self.currency.clone(),
            status: self.status.into(),
        }
    }

    /// The fields parent assignment is checked against.
    #[must_use]
    pub fn hierarchy_node(&self, child_count: usize) -> HierarchyNode<CategoryId, ledger::CategoryType> {
        HierarchyNode {
            id: CategoryId::from(self.id),
            user_id: UserId::from(self.user_id),
            kind: self.category_type.into(),
            parent: self.parent_id.map(CategoryId::from),
            status: self.status.into(),
            child_count,
        }
    }
}

impl Ordered for Model {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        CategoryId::from(self.id)
    }

    fn position(&self) -> Option<Position> {
        self.sort_order
    }

    fn status(&self) -> ordering::EntityStatus {
        self.status.into()
    }
}

impl Nested for Model {
    fn parent(&self) -> Option<CategoryId> {
        self.parent_id.map(CategoryId::from)
    }
}
