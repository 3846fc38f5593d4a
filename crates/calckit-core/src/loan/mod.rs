//! Loan amortization: event model, schedule engine and chart breakdown.

pub mod breakdown;
pub mod events;
pub mod schedule;

pub use breakdown::{analyze_loan, principal_interest_breakdown, LoanAnalysis, LoanBreakdown, LoanInput};
pub use events::{EventAction, EventBook, EventRow, MonthEvent, RateTimeline};
pub use schedule::{
    generate_schedule, AmortizationSchedule, LoanParameters, RecalculationMode, ScheduleRow,
    ScheduleStatus, ScheduleTotals, BALANCE_EPSILON, MAX_MONTHS,
};
