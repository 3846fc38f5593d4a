//! Systematic investment plan: a fixed contribution at the start of every
//! month, compounded monthly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::investment::validate_projection;
use crate::time_value::{annuity_due_future_value, monthly_rate, out_of_range};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::CalcResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipInput {
    /// Contribution made at the start of each month.
    pub monthly_amount: Money,
    /// Expected annual return in percent.
    pub annual_return_percent: Rate,
    pub years: u32,
    #[serde(default)]
    pub months: u32,
}

/// Position at the end of a year (or at the end of the plan for the last,
/// possibly partial, year).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SipYear {
    pub year: u32,
    pub months_elapsed: u32,
    pub invested: Money,
    pub returns: Money,
    pub value: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipOutput {
    pub total_months: u32,
    pub total_invested: Money,
    pub estimated_returns: Money,
    pub maturity_value: Money,
    pub yearly_breakdown: Vec<SipYear>,
}

/// Project the maturity value of a SIP with a year-by-year breakdown.
pub fn project_sip(input: &SipInput) -> CalcResult<ComputationOutput<SipOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let total_months = validate_projection(
        "monthly_amount",
        input.monthly_amount,
        input.annual_return_percent,
        input.years,
        input.months,
    )?;
    if input.annual_return_percent.is_zero() {
        warnings.push("Zero expected return; maturity value equals contributions".into());
    }

    let rate = monthly_rate(input.annual_return_percent);
    let total_years = total_months.div_ceil(12);

    let mut yearly_breakdown = Vec::with_capacity(total_years as usize);
    for year in 1..=total_years {
        let months_elapsed = (year * 12).min(total_months);
        let value = annuity_due_future_value(input.monthly_amount, rate, months_elapsed)?;
        let invested = contributions(input.monthly_amount, months_elapsed)?;
        yearly_breakdown.push(SipYear {
            year,
            months_elapsed,
            invested,
            returns: value - invested,
            value,
        });
    }

    let maturity_value = annuity_due_future_value(input.monthly_amount, rate, total_months)?;
    let total_invested = contributions(input.monthly_amount, total_months)?;

    let output = SipOutput {
        total_months,
        total_invested,
        estimated_returns: maturity_value - total_invested,
        maturity_value,
        yearly_breakdown,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "SIP future value (annuity due, monthly compounding)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn contributions(monthly_amount: Money, months: u32) -> CalcResult<Money> {
    monthly_amount
        .checked_mul(Decimal::from(months))
        .ok_or_else(|| out_of_range("amount invested"))
}
