use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::investment::validate_projection;
use crate::time_value::{compound, monthly_rate};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::CalcResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LumpSumInput {
    pub amount: Money,
    /// Expected annual return in percent.
    pub annual_return_percent: Rate,
    pub years: u32,
    #[serde(default)]
    pub months: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LumpSumOutput {
    pub total_months: u32,
    pub initial_investment: Money,
    pub total_returns: Money,
    pub final_value: Money,
}

/// Grow a single investment: annual compounding over whole years, then
/// monthly compounding over the leftover months.
pub fn project_lump_sum(input: &LumpSumInput) -> CalcResult<ComputationOutput<LumpSumOutput>> {
    let start = Instant::now();

    let total_months = validate_projection(
        "amount",
        input.amount,
        input.annual_return_percent,
        input.years,
        input.months,
    )?;

    let after_years = compound(input.amount, input.annual_return_percent / dec!(100), input.years)?;
    let final_value = compound(
        after_years,
        monthly_rate(input.annual_return_percent),
        input.months,
    )?;

    let output = LumpSumOutput {
        total_months,
        initial_investment: input.amount,
        total_returns: final_value - input.amount,
        final_value,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Lump sum growth (annual compounding, monthly for part years)",
        input,
        Vec::new(),
        elapsed,
        output,
    ))
}
