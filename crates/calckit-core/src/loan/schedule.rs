//! Month-by-month loan amortization with prepayments, top-ups and rate
//! changes.
//!
//! Every balance-changing event re-solves either the installment (term held
//! fixed) or the remaining term (installment held fixed), depending on the
//! loan's [`RecalculationMode`]. The rate in force for each month is resolved
//! up front by [`RateTimeline`]; the simulation loop only reads it. The loop is
//! capped at [`MAX_MONTHS`] iterations whatever the events, and the result
//! says whether the loan actually closed.

use chrono::{Months, NaiveDate};
use log::{debug, trace, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::loan::events::{EventAction, EventBook, RateTimeline};
use crate::time_value::{installment, interest_for, monthly_rate, out_of_range, tenure_for_installment};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Balance at or below which the loan is considered repaid.
pub const BALANCE_EPSILON: Decimal = dec!(0.01);

/// Hard cap on simulated months.
pub const MAX_MONTHS: u32 = 500;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// What to re-solve when the balance or the rate changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecalculationMode {
    /// Keep the term, re-solve the installment.
    #[default]
    #[serde(alias = "installment", alias = "emi")]
    RecalcInstallment,
    /// Keep the installment, re-solve the term.
    #[serde(alias = "tenure")]
    RecalcTenure,
}

/// Loan terms for one schedule run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanParameters {
    /// Original amount borrowed.
    pub principal: Money,
    /// Nominal annual rate in percent (e.g., 10.5 for 10.5%).
    pub annual_rate_percent: Rate,
    /// Requested term in months.
    pub tenure_months: u32,
    #[serde(default)]
    pub recalculation_mode: RecalculationMode,
    /// Date of the first installment. Rows get payment dates when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One simulated month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub month: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    /// Amount paid this month; principal plus interest components.
    pub installment: Money,
    pub principal_component: Money,
    pub interest_component: Money,
    /// Prepayment applied this month.
    pub prepayment: Money,
    /// Top-up disbursed this month.
    pub topup: Money,
    /// Annual rate in percent in force this month.
    pub effective_annual_rate: Rate,
    /// Principal left after this month.
    pub outstanding_balance: Money,
    /// Set on the settlement row appended after the regular months.
    #[serde(default)]
    pub is_closing: bool,
}

/// Sums over the schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTotals {
    /// Net principal repaid: regular principal plus prepayments less top-ups.
    pub total_principal: Money,
    pub total_interest: Money,
    pub total_installments: Money,
    pub total_prepayments: Money,
    pub total_topups: Money,
    /// Installments plus prepayments.
    pub total_paid: Money,
}

/// How the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Balance reached zero.
    Closed,
    /// The month cap was hit with principal still outstanding.
    Truncated,
}

/// Full amortization schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub rows: Vec<ScheduleRow>,
    pub totals: ScheduleTotals,
    pub status: ScheduleStatus,
    /// Installment implied by the original terms.
    pub original_installment: Money,
    /// Installment in force when the simulation stopped.
    pub final_installment: Money,
    /// Last simulated month.
    pub payoff_month: u32,
    /// Months where the installment stopped covering interest under
    /// `RecalcTenure` and was re-solved instead.
    pub degenerate_months: Vec<u32>,
}

impl AmortizationSchedule {
    pub fn is_closed(&self) -> bool {
        self.status == ScheduleStatus::Closed
    }

    /// Closed, and no month needed the degenerate-term fallback.
    pub fn is_clean(&self) -> bool {
        self.is_closed() && self.degenerate_months.is_empty()
    }
}

/// Result of re-solving after a balance or rate change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recalculation {
    Installment(Money),
    Tenure(u32),
    /// The fixed installment does not cover interest; no finite term exists.
    Degenerate,
}

/// Re-solve the installment or the remaining term for the current state.
pub fn recalculate(
    mode: RecalculationMode,
    balance: Money,
    monthly_rate: Rate,
    current_installment: Money,
    remaining_months: u32,
) -> CalcResult<Recalculation> {
    match mode {
        RecalculationMode::RecalcInstallment => Ok(Recalculation::Installment(installment(
            balance,
            monthly_rate,
            remaining_months.max(1),
        )?)),
        RecalculationMode::RecalcTenure => {
            Ok(tenure_for_installment(balance, current_installment, monthly_rate)
                .map_or(Recalculation::Degenerate, Recalculation::Tenure))
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

struct LoanState {
    mode: RecalculationMode,
    month: u32,
    balance: Money,
    annual_rate: Rate,
    monthly_rate: Rate,
    installment: Money,
    remaining: u32,
    warnings: Vec<String>,
    degenerate_months: Vec<u32>,
}

impl LoanState {
    fn recalculate(&mut self, cause: &str) -> CalcResult<()> {
        let month = self.month;
        match recalculate(
            self.mode,
            self.balance,
            self.monthly_rate,
            self.installment,
            self.remaining,
        )? {
            Recalculation::Installment(new_installment) => {
                debug!(
                    "month {month}: installment {} -> {} after {cause}",
                    self.installment.round_dp(2),
                    new_installment.round_dp(2)
                );
                self.installment = new_installment;
            }
            Recalculation::Tenure(months) => {
                debug!(
                    "month {month}: remaining term {} -> {months} months after {cause}",
                    self.remaining
                );
                self.remaining = months;
            }
            Recalculation::Degenerate => {
                let months = self.remaining.max(1);
                let fallback = installment(self.balance, self.monthly_rate, months)?;
                warn!(
                    "month {month}: installment {} does not cover interest {} after {cause}; \
                     re-solving installment over {months} months",
                    self.installment.round_dp(2),
                    interest_for(self.balance, self.monthly_rate)?.round_dp(2)
                );
                self.warnings.push(format!(
                    "Month {month}: installment {} no longer covers interest after {cause}; \
                     installment re-solved to {} over {months} remaining months",
                    self.installment.round_dp(2),
                    fallback.round_dp(2)
                ));
                if self.degenerate_months.last() != Some(&month) {
                    self.degenerate_months.push(month);
                }
                self.installment = fallback;
                self.remaining = months;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Generate the month-by-month schedule for `params` under `events`.
pub fn generate_schedule(
    params: &LoanParameters,
    events: &EventBook,
) -> CalcResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    validate_parameters(params)?;
    events.validate_against(params.tenure_months)?;

    // Rates past the cap are never read.
    let timeline = RateTimeline::resolve(
        params.annual_rate_percent,
        events,
        params.tenure_months.min(MAX_MONTHS),
    );
    let initial_monthly_rate = monthly_rate(params.annual_rate_percent);
    let original_installment =
        installment(params.principal, initial_monthly_rate, params.tenure_months)?;

    let mut state = LoanState {
        mode: params.recalculation_mode,
        month: 1,
        balance: params.principal,
        annual_rate: params.annual_rate_percent,
        monthly_rate: initial_monthly_rate,
        installment: original_installment,
        remaining: params.tenure_months,
        warnings: Vec::new(),
        degenerate_months: Vec::new(),
    };

    if params.tenure_months > MAX_MONTHS {
        state.warnings.push(format!(
            "Tenure of {} months exceeds the {MAX_MONTHS}-month simulation cap",
            params.tenure_months
        ));
    }
    if params.principal <= BALANCE_EPSILON {
        state.warnings.push(format!(
            "Principal {} is below the {BALANCE_EPSILON} settlement threshold; nothing to amortize",
            params.principal
        ));
    }

    let mut rows: Vec<ScheduleRow> =
        Vec::with_capacity(params.tenure_months.min(MAX_MONTHS) as usize + 1);

    while state.balance > BALANCE_EPSILON && state.month <= MAX_MONTHS {
        let month = state.month;
        let event = events.event_for(month);

        let rate = timeline.rate_for(month);
        if rate != state.annual_rate {
            debug!("month {month}: rate {}% -> {rate}%", state.annual_rate);
            state.annual_rate = rate;
            state.monthly_rate = monthly_rate(rate);
            state.recalculate("rate change")?;
        }

        // Interest accrues on the balance before this month's event.
        let interest = interest_for(state.balance, state.monthly_rate)?;

        let mut prepayment = Decimal::ZERO;
        let mut topup = Decimal::ZERO;
        match event.action {
            EventAction::Prepayment(amount) => {
                prepayment = amount.min(state.balance);
                if prepayment < amount {
                    warn!("month {month}: prepayment {amount} clamped to balance {prepayment}");
                    state.warnings.push(format!(
                        "Month {month}: prepayment {amount} exceeds the balance; {} applied",
                        prepayment.round_dp(2)
                    ));
                }
                debug!("month {month}: prepayment {prepayment}");
                state.balance -= prepayment;
                state.recalculate("prepayment")?;
            }
            EventAction::Topup(amount) => {
                topup = amount;
                debug!("month {month}: top-up {amount}");
                state.balance = state
                    .balance
                    .checked_add(amount)
                    .ok_or_else(|| out_of_range(&format!("balance after month {month} top-up")))?;
                state.recalculate("top-up")?;
            }
            EventAction::None => {}
        }

        let principal_component = (state.installment - interest)
            .min(state.balance)
            .max(Decimal::ZERO);
        state.balance = (state.balance - principal_component).max(Decimal::ZERO);

        let row = ScheduleRow {
            month,
            payment_date: payment_date(params.start_date, month),
            installment: principal_component
                .checked_add(interest)
                .ok_or_else(|| out_of_range(&format!("month {month} installment")))?,
            principal_component,
            interest_component: interest,
            prepayment,
            topup,
            effective_annual_rate: rate,
            outstanding_balance: state.balance,
            is_closing: false,
        };
        trace!("{row:?}");
        rows.push(row);

        state.month += 1;
        state.remaining = state.remaining.saturating_sub(1);
        if state.remaining == 0 {
            break;
        }
    }

    let mut status = ScheduleStatus::Closed;
    if state.balance > BALANCE_EPSILON {
        if state.month <= MAX_MONTHS {
            rows.push(closing_row(&state, params.start_date)?);
            state.balance = Decimal::ZERO;
        } else {
            status = ScheduleStatus::Truncated;
            warn!(
                "schedule truncated at {MAX_MONTHS} months with {} outstanding",
                state.balance.round_dp(2)
            );
            state.warnings.push(format!(
                "Schedule truncated at {MAX_MONTHS} months with {} still outstanding; \
                 totals understate the cost of the loan",
                state.balance.round_dp(2)
            ));
        }
    }

    let payoff_month = rows.last().map_or(0, |r| r.month);
    let skipped = events.iter().filter(|(m, _)| *m > payoff_month).count();
    if skipped > 0 && status == ScheduleStatus::Closed {
        state.warnings.push(format!(
            "{skipped} event(s) scheduled after the loan closed in month {payoff_month} were not applied"
        ));
    }

    let output = AmortizationSchedule {
        totals: compute_totals(&rows)?,
        rows,
        status,
        original_installment,
        final_installment: state.installment,
        payoff_month,
        degenerate_months: state.degenerate_months,
    };

    let methodology = match params.recalculation_mode {
        RecalculationMode::RecalcInstallment => {
            "Reducing-balance amortization (installment re-solved on events)"
        }
        RecalculationMode::RecalcTenure => {
            "Reducing-balance amortization (term re-solved on events)"
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology,
        &serde_json::json!({
            "principal": params.principal.to_string(),
            "annual_rate_percent": params.annual_rate_percent.to_string(),
            "tenure_months": params.tenure_months,
            "recalculation_mode": params.recalculation_mode,
            "event_months": events.iter().map(|(m, _)| m).collect::<Vec<_>>(),
            "rate_change_months": timeline.change_months(),
            "balance_epsilon": BALANCE_EPSILON.to_string(),
            "max_months": MAX_MONTHS,
        }),
        state.warnings,
        elapsed,
        output,
    ))
}

/// Aggregate a row sequence into totals.
pub fn compute_totals(rows: &[ScheduleRow]) -> CalcResult<ScheduleTotals> {
    let sum = |total: Money, value: Money, what: &str| {
        total.checked_add(value).ok_or_else(|| out_of_range(what))
    };

    let mut totals = ScheduleTotals::default();
    let mut regular_principal = Decimal::ZERO;
    for row in rows {
        regular_principal = sum(regular_principal, row.principal_component, "total principal")?;
        totals.total_interest = sum(totals.total_interest, row.interest_component, "total interest")?;
        totals.total_installments =
            sum(totals.total_installments, row.installment, "total installments")?;
        totals.total_prepayments =
            sum(totals.total_prepayments, row.prepayment, "total prepayments")?;
        totals.total_topups = sum(totals.total_topups, row.topup, "total top-ups")?;
    }
    totals.total_principal = (sum(regular_principal, totals.total_prepayments, "total principal")?
        - totals.total_topups)
        .max(Decimal::ZERO);
    totals.total_paid = sum(totals.total_installments, totals.total_prepayments, "total paid")?;
    Ok(totals)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_parameters(params: &LoanParameters) -> CalcResult<()> {
    if params.principal <= Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "principal".into(),
            reason: "Loan amount must be positive".into(),
        });
    }
    if params.tenure_months == 0 {
        return Err(CalcError::InvalidInput {
            field: "tenure_months".into(),
            reason: "Tenure must be at least 1 month".into(),
        });
    }
    if params.annual_rate_percent < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "annual_rate_percent".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    Ok(())
}

fn closing_row(state: &LoanState, start_date: Option<NaiveDate>) -> CalcResult<ScheduleRow> {
    let interest = interest_for(state.balance, state.monthly_rate)?;
    let installment = state
        .balance
        .checked_add(interest)
        .ok_or_else(|| out_of_range("closing installment"))?;
    debug!(
        "month {}: closing payment settles {}",
        state.month,
        state.balance.round_dp(2)
    );
    Ok(ScheduleRow {
        month: state.month,
        payment_date: payment_date(start_date, state.month),
        installment,
        principal_component: state.balance,
        interest_component: interest,
        prepayment: Decimal::ZERO,
        topup: Decimal::ZERO,
        effective_annual_rate: state.annual_rate,
        outstanding_balance: Decimal::ZERO,
        is_closing: true,
    })
}

fn payment_date(start_date: Option<NaiveDate>, month: u32) -> Option<NaiveDate> {
    start_date.and_then(|d| d.checked_add_months(Months::new(month - 1)))
}
