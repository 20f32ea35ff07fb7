//! `SeaORM` entities.
//!
//! Each model also implements the `tally-core` traits its table plays a role
//! in, so repositories can hand loaded rows straight to the core planners.

pub mod accounts;
pub mod sea_orm_active_enums;
pub mod transaction_categories;
pub mod transactions;
pub mod users;
