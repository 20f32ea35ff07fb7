//! Shared ids, errors, and configuration for Tally.
//!
//! - Typed ids for users and the entities they own
//! - The application-wide error type
//! - Configuration loading

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, LimitsConfig};
pub use error::{AppError, AppResult};
