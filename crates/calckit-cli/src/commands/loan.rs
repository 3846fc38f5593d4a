use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use calckit_core::loan::{self, EventBook, LoanInput, LoanParameters, RecalculationMode};

use crate::input;

/// What absorbs a prepayment, top-up or rate change
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Keep the remaining term, re-solve the installment
    Installment,
    /// Keep the installment, re-solve the remaining term
    Tenure,
}

impl From<ModeArg> for RecalculationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Installment => RecalculationMode::RecalcInstallment,
            ModeArg::Tenure => RecalculationMode::RecalcTenure,
        }
    }
}

/// Arguments for loan amortization
#[derive(Args)]
pub struct LoanArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 8.5)
    #[arg(long, alias = "annual-rate")]
    pub rate: Option<Decimal>,

    /// Loan term in months
    #[arg(long)]
    pub tenure: Option<u32>,

    /// Recalculation mode (also overrides the input document)
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Date of the first installment, YYYY-MM-DD (also overrides the input document)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// CSV event table with columns month,prepayment,topup,new_rate
    /// (replaces any events in the input document)
    #[arg(long)]
    pub events: Option<String>,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the blank event table
#[derive(Args)]
pub struct LoanTemplateArgs {
    /// Loan term in months
    #[arg(long)]
    pub tenure: u32,
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut loan_input: LoanInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        loan_input_from_flags(&args)?
    };

    apply_overrides(&mut loan_input, &args)?;

    let result = loan::analyze_loan(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_loan_template(args: LoanTemplateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let events = EventBook::blank_rows(args.tenure)?;
    Ok(json!({
        "result": {
            "tenure_months": args.tenure,
            "events": events,
        }
    }))
}

fn loan_input_from_flags(args: &LoanArgs) -> Result<LoanInput, Box<dyn std::error::Error>> {
    Ok(LoanInput {
        parameters: LoanParameters {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args
                .rate
                .ok_or("--rate is required (or provide --input)")?,
            tenure_months: args
                .tenure
                .ok_or("--tenure is required (or provide --input)")?,
            recalculation_mode: RecalculationMode::default(),
            start_date: None,
        },
        events: Vec::new(),
    })
}

fn apply_overrides(input: &mut LoanInput, args: &LoanArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(mode) = args.mode {
        input.parameters.recalculation_mode = mode.into();
    }
    if args.start_date.is_some() {
        input.parameters.start_date = args.start_date;
    }
    if let Some(ref path) = args.events {
        input.events = input::events_csv::read_events_csv(path)?;
    }
    Ok(())
}
