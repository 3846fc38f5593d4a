//! Investment growth projections: monthly SIP contributions and lump sums.

pub mod lump_sum;
pub mod sip;

use rust_decimal::Decimal;

use crate::error::CalcError;
use crate::types::{Money, Rate};
use crate::CalcResult;

/// Longest projection accepted (50 years).
pub const MAX_PROJECTION_MONTHS: u32 = 600;

/// Check amount, rate and term shared by both projections; returns the term
/// in months.
pub(crate) fn validate_projection(
    amount_field: &str,
    amount: Money,
    annual_return_percent: Rate,
    years: u32,
    months: u32,
) -> CalcResult<u32> {
    if amount <= Decimal::ZERO {
        return Err(CalcError::invalid(amount_field, "Amount must be positive"));
    }
    if annual_return_percent < Decimal::ZERO {
        return Err(CalcError::invalid(
            "annual_return_percent",
            "Expected return cannot be negative",
        ));
    }
    let total = years
        .checked_mul(12)
        .and_then(|m| m.checked_add(months))
        .unwrap_or(u32::MAX);
    if total == 0 || total > MAX_PROJECTION_MONTHS {
        return Err(CalcError::invalid(
            "years",
            format!("Investment period must be between 1 and {MAX_PROJECTION_MONTHS} months"),
        ));
    }
    Ok(total)
}
