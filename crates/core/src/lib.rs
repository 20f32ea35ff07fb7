//! Core business logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Callers load entities, hand them in, and persist the writes returned here
//! inside one database transaction.
//!
//! # Modules
//!
//! - `ordering` - Dense sibling ordering, archival and category hierarchy
//! - `ledger` - Transaction creation, balance rules and aggregation
//! - `currency` - Rate application with banker's rounding
//! - `error` - Error kinds shared by the domain modules

pub mod currency;
pub mod error;
pub mod ledger;
pub mod ordering;

pub use error::ErrorKind;
