//! Rate application for cross-currency transactions.

pub mod conversion;

pub use conversion::{
    AMOUNT_SCALE, MAX_AMOUNT, MAX_RATE, RATE_SCALE, apply_rate, checked_apply_rate, convert_amount,
};
