//! `SeaORM` Entity for transactions table.

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::ledger::Transaction;
use tally_shared::types::{AccountId, CategoryId, TransactionId, UserId};

use super::sea_orm_active_enums::TransactionType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub transaction_type: TransactionType,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub value: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub fee: Option<Decimal>,
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))", nullable)]
    pub currency_rate: Option<Decimal>,
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub from_category_id: Option<Uuid>,
    pub to_category_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub from_account_updated_balance: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub to_account_updated_balance: Option<Decimal>,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub created_at: DateTimeWithTimeZone,
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
        belongs_to = "super::accounts::Entity",
        from = "Column::FromAccountId",
        to = "super::accounts::Column::Id"
    )]
    FromAccount,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::ToAccountId",
        to = "super::accounts::Column::Id"
    )]
    ToAccount,
    #[sea_orm(
        belongs_to = "super::transaction_categories::Entity",
        from = "Column::FromCategoryId",
        to = "super::transaction_categories::Column::Id",
        on_delete = "SetNull"
    )]
    FromCategory,
    #[sea_orm(
        belongs_to = "super::transaction_categories::Entity",
        from = "Column::ToCategoryId",
        to = "super::transaction_categories::Column::Id",
        on_delete = "SetNull"
    )]
    ToCategory,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Transaction {
    fn from(model: Model) -> Self {
        Self {
            id: TransactionId::from(model.id),
            user_id: UserId::from(model.user_id),
            transaction_type: model.transaction_type.into(),
            value: model.value,
            fee: model.fee,
            currency: model.currency,
            currency_rate: model.currency_rate,
            from_account_id: model.from_account_id.map(AccountId::from),
            to_account_id: model.to_account_id.map(AccountId::from),
            from_category_id: model.from_category_id.map(CategoryId::from),
            to_category_id: model.to_category_id.map(CategoryId::from),
            from_account_updated_balance: model.from_account_updated_balance,
            to_account_updated_balance: model.to_account_updated_balance,
            note: model.note,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: Set(tx.id.into_inner()),
            user_id: Set(tx.user_id.into_inner()),
            transaction_type: Set(tx.transaction_type.into()),
            value: Set(tx.value),
            fee: Set(tx.fee),
            currency: Set(tx.currency.clone()),
            currency_rate: Set(tx.currency_rate),
            from_account_id: Set(tx.from_account_id.map(AccountId::into_inner)),
            to_account_id: Set(tx.to_account_id.map(AccountId::into_inner)),
            from_category_id: Set(tx.from_category_id.map(CategoryId::into_inner)),
            to_category_id: Set(tx.to_category_id.map(CategoryId::into_inner)),
            from_account_updated_balance: Set(tx.from_account_updated_balance),
            to_account_updated_balance: Set(tx.to_account_updated_balance),
            note: Set(tx.note.clone()),
            created_at: Set(tx.created_at.into()),
        }
    }
}
