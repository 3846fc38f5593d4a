use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::CalcError;
use crate::types::{Money, Rate};
use crate::CalcResult;

/// Slack removed from a solved term before rounding it up, so a term that is
/// whole up to `ln` precision does not spill into an extra month.
const TENURE_TOLERANCE: Decimal = dec!(0.000001);

/// Error for a value that leaves the representable `Decimal` range.
pub(crate) fn out_of_range(what: &str) -> CalcError {
    CalcError::FinancialImpossibility(format!("{what} exceeds the representable range"))
}

/// Nominal annual percentage (12 = 12%) to a monthly decimal rate (0.01).
pub fn monthly_rate(annual_rate_percent: Rate) -> Rate {
    annual_rate_percent / dec!(12) / dec!(100)
}

/// One period of interest on `balance`.
pub fn interest_for(balance: Money, monthly_rate: Rate) -> CalcResult<Money> {
    balance
        .checked_mul(monthly_rate)
        .ok_or_else(|| out_of_range("interest"))
}

/// Equal monthly installment that amortizes `principal` over `months`.
///
/// EMI = P * r * (1 + r)^n / ((1 + r)^n - 1), or P / n when r is zero.
/// When (1 + r)^n overflows the installment is taken at its interest-only
/// limit P * r.
pub fn installment(principal: Money, monthly_rate: Rate, months: u32) -> CalcResult<Money> {
    if months == 0 {
        return Err(CalcError::InvalidInput {
            field: "months".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(months));
    }

    let interest = interest_for(principal, monthly_rate)?;
    let one_plus_r = Decimal::ONE + monthly_rate;
    let Some(factor) = one_plus_r.checked_powu(u64::from(months)) else {
        return Ok(interest);
    };

    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(CalcError::DivisionByZero {
            context: "installment annuity factor".into(),
        });
    }

    factor
        .checked_div(denominator)
        .and_then(|annuity| interest.checked_mul(annuity))
        .ok_or_else(|| out_of_range("installment"))
}

/// Smallest whole number of months in which a fixed `installment` clears
/// `balance` at `monthly_rate`.
///
/// n = ceil(ln(I / (I - B * r)) / ln(1 + r)), or ceil(B / I) when r is zero.
/// Returns `None` when the installment does not exceed the interest due, in
/// which case no finite term exists.
pub fn tenure_for_installment(balance: Money, installment: Money, monthly_rate: Rate) -> Option<u32> {
    if balance <= Decimal::ZERO {
        return Some(0);
    }
    if installment <= Decimal::ZERO {
        return None;
    }

    if monthly_rate.is_zero() {
        return Some(ceil_months(balance.checked_div(installment)?));
    }

    let interest = balance.checked_mul(monthly_rate)?;
    if installment <= interest {
        return None;
    }

    let numerator = installment
        .checked_div(installment - interest)?
        .checked_ln()?;
    let denominator = (Decimal::ONE + monthly_rate).checked_ln()?;
    if denominator.is_zero() {
        return None;
    }

    Some(ceil_months(numerator.checked_div(denominator)?))
}

fn ceil_months(raw: Decimal) -> u32 {
    let months = (raw - TENURE_TOLERANCE).ceil().max(Decimal::ONE);
    months.to_u32().unwrap_or(u32::MAX)
}

/// Future value of `periods` payments made at the start of each period.
///
/// FV = P * ((1 + r)^n - 1) / r * (1 + r), or P * n when r is zero.
pub fn annuity_due_future_value(payment: Money, rate: Rate, periods: u32) -> CalcResult<Money> {
    let overflow = || {
        CalcError::FinancialImpossibility(format!(
            "growth factor overflows at {rate} over {periods} periods"
        ))
    };

    if rate.is_zero() {
        return payment.checked_mul(Decimal::from(periods)).ok_or_else(overflow);
    }

    let one_plus_r = Decimal::ONE + rate;
    let factor = one_plus_r
        .checked_powu(u64::from(periods))
        .ok_or_else(overflow)?;

    ((factor - Decimal::ONE) / rate)
        .checked_mul(one_plus_r)
        .and_then(|growth| payment.checked_mul(growth))
        .ok_or_else(overflow)
}

/// Compound `amount` at `rate` per period for `periods` periods.
pub fn compound(amount: Money, rate: Rate, periods: u32) -> CalcResult<Money> {
    let overflow = || {
        CalcError::FinancialImpossibility(format!(
            "growth factor overflows at {rate} over {periods} periods"
        ))
    };
    (Decimal::ONE + rate)
        .checked_powu(u64::from(periods))
        .and_then(|factor| amount.checked_mul(factor))
        .ok_or_else(overflow)
}
