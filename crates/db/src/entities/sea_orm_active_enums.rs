//! `SeaORM` active enums and their `tally-core` counterparts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::{ledger, ordering};

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "CASH")]
    Cash,
    #[sea_orm(string_value = "BANK")]
    Bank,
    #[sea_orm(string_value = "CREDIT_CARD")]
    CreditCard,
    #[sea_orm(string_value = "SAVINGS")]
    Savings,
    #[sea_orm(string_value = "INVESTMENT")]
    Investment,
    #[sea_orm(string_value = "I_OWE")]
    IOwe,
    #[sea_orm(string_value = "OWE_ME")]
    OweMe,
}

/// Category direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "category_type")]
pub enum CategoryType {
    #[sea_orm(string_value = "INCOME")]
    Income,
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
}

/// Transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
pub enum TransactionType {
    #[sea_orm(string_value = "TRANSFER")]
    Transfer,
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    #[sea_orm(string_value = "INCOME")]
    Income,
    #[sea_orm(string_value = "BALANCE_CORRECTION")]
    BalanceCorrection,
}

/// Lifecycle status of accounts and categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entity_status")]
pub enum EntityStatus {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "ARCHIVED")]
    Archived,
}

/// Generates `From` conversions in both directions between a database enum
/// and the core enum of the same name and variants.
macro_rules! mirror_enum {
    ($module:ident::$name:ident, [$($variant:ident),+ $(,)?]) => {
        impl From<$name> for $module::$name {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$module::$name> for $name {
            fn from(value: $module::$name) -> Self {
                match value {
                    $($module::$name::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(
    ledger::AccountType,
    [Cash, Bank, CreditCard, Savings, Investment, IOwe, OweMe]
);
mirror_enum!(ledger::CategoryType, [Income, Expense]);
mirror_enum!(
    ledger::TransactionType,
    [Transfer, Expense, Income, BalanceCorrection]
);
mirror_enum!(ordering::EntityStatus, [Active, Archived]);

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_enums_round_trip_through_core() {
        for db in AccountType::iter() {
            let core: ledger::AccountType = db.into();
            assert_eq!(AccountType::from(core), db);
        }
        assert!(ledger::AccountType::from(AccountType::IOwe).is_debt());
        assert_eq!(AccountType::IOwe.to_value(), "I_OWE");
    }
}
