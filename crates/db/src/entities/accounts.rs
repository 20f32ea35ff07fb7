//! `SeaORM` Entity for accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::ledger::AccountSnapshot;
use tally_core::ordering::{self, Ordered, Position};
use tally_shared::types::{AccountId, UserId};

use super::sea_orm_active_enums::{AccountType, EntityStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub account_type: AccountType,
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub init_balance: Decimal,
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
    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: AccountId::from(self.id),
            user_id: UserId::from(self.user_id),
            account_type: self.account_type.into(),
            balance: self.balance,
            currency: self.currency.clone(),
            status: self.status.into(),
        }
    }
}

impl Ordered for Model {
    type Id = AccountId;

    fn id(&self) -> AccountId {
        AccountId::from(self.id)
    }

    fn position(&self) -> Option<Position> {
        self.sort_order
    }

    fn status(&self) -> ordering::EntityStatus {
        self.status.into()
    }
}
