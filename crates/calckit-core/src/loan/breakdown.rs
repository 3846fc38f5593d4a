use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::loan::events::{EventBook, EventRow};
use crate::loan::schedule::{generate_schedule, AmortizationSchedule, LoanParameters};
use crate::time_value::out_of_range;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::CalcResult;

/// Loan terms plus the editable event table, as the UI submits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    #[serde(flatten)]
    pub parameters: LoanParameters,
    #[serde(default)]
    pub events: Vec<EventRow>,
}

/// Principal vs interest split for the pie chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanBreakdown {
    pub total_principal: Money,
    pub total_interest: Money,
    /// Share of principal in principal + interest, in percent.
    pub principal_share_pct: Rate,
    pub interest_share_pct: Rate,
    /// False when the schedule was cut off before the loan closed.
    pub is_complete: bool,
}

/// Schedule and its breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAnalysis {
    pub schedule: AmortizationSchedule,
    pub breakdown: LoanBreakdown,
}

/// Split a schedule's totals into principal and interest shares.
pub fn principal_interest_breakdown(schedule: &AmortizationSchedule) -> CalcResult<LoanBreakdown> {
    let principal = schedule.totals.total_principal;
    let interest = schedule.totals.total_interest;
    let total = principal
        .checked_add(interest)
        .ok_or_else(|| out_of_range("principal plus interest"))?;

    let (principal_share_pct, interest_share_pct) = if total.is_zero() {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        (
            principal / total * dec!(100),
            interest / total * dec!(100),
        )
    };

    Ok(LoanBreakdown {
        total_principal: principal,
        total_interest: interest,
        principal_share_pct,
        interest_share_pct,
        is_complete: schedule.is_closed(),
    })
}

/// Build the event book from table rows, generate the schedule and break it
/// down in one call.
pub fn analyze_loan(input: &LoanInput) -> CalcResult<ComputationOutput<LoanAnalysis>> {
    let start = Instant::now();

    let events = EventBook::from_rows(&input.events)?;
    let run = generate_schedule(&input.parameters, &events)?;
    let breakdown = principal_interest_breakdown(&run.result)?;

    let output = LoanAnalysis {
        schedule: run.result,
        breakdown,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &run.methodology,
        &run.assumptions,
        run.warnings,
        elapsed,
        output,
    ))
}
