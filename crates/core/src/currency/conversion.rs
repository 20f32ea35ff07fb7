//! Currency conversion logic.
//!
//! CRITICAL: Rounding strategy for multi-currency:
//! - Rate-applied amounts are rounded to `AMOUNT_SCALE` places
//! - Use banker's rounding (round half to even)
//! - Amounts without a rate are never rounded

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

/// Decimal places kept for rate-applied amounts.
pub const AMOUNT_SCALE: u32 = 4;

/// Decimal places a currency rate may carry.
pub const RATE_SCALE: u32 = 8;

/// Exclusive bound for amounts and balances (`NUMERIC(19,4)`): 10^15.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Exclusive bound for currency rates (`NUMERIC(19,8)`): 10^11.
pub const MAX_RATE: Decimal = Decimal::from_parts(0x4876_E800, 0x17, 0, false, 0);

/// Converts an amount using the given exchange rate.
///
/// Uses banker's rounding (round half to even) to minimize cumulative errors.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal, decimal_places: u32) -> Decimal {
    let converted = amount * rate;
    converted.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
}

/// Like [`apply_rate`], but returns `None` when the product overflows.
#[must_use]
pub fn checked_apply_rate(amount: Decimal, rate: Option<Decimal>) -> Option<Decimal> {
    match rate {
        Some(rate) => amount.checked_mul(rate).map(|converted| {
            converted.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointNearestEven)
        }),
        None => Some(amount),
    }
}

/// Applies an optional transaction rate; an absent rate means 1.
#[must_use]
pub fn apply_rate(amount: Decimal, rate: Option<Decimal>) -> Decimal {
    match rate {
        Some(rate) => convert_amount(amount, rate, AMOUNT_SCALE),
        None => amount,
    }
}
