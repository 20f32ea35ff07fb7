//! Repositories for data access.
//!
//! Each repository owns one aggregate, runs `tally-core` validation and
//! planning, and applies the result inside a single database transaction.

pub mod account;
pub mod category;
pub mod error;
pub mod transaction;
pub mod user;

pub use account::{AccountRepository, CreateAccountInput, UpdateAccountInput};
pub use category::{CategoryRepository, CreateCategoryInput, UpdateCategoryInput};
pub use error::RepositoryError;
pub use transaction::{TransactionRepository, UpdateTransactionInput};
pub use user::UserRepository;
