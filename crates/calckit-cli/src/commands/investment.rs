use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use calckit_core::investment::lump_sum::{self, LumpSumInput};
use calckit_core::investment::sip::{self, SipInput};

use crate::input;

/// Arguments for a systematic investment plan
#[derive(Args)]
pub struct SipArgs {
    /// Contribution at the start of each month
    #[arg(long)]
    pub monthly_amount: Option<Decimal>,

    /// Expected annual return in percent (e.g. 12)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Whole years of contributions
    #[arg(long)]
    pub years: Option<u32>,

    /// Extra months beyond the whole years
    #[arg(long, default_value_t = 0)]
    pub months: u32,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a lump sum investment
#[derive(Args)]
pub struct LumpSumArgs {
    /// Amount invested up front
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Expected annual return in percent (e.g. 12)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Whole years, compounded annually
    #[arg(long)]
    pub years: Option<u32>,

    /// Extra months, compounded monthly
    #[arg(long, default_value_t = 0)]
    pub months: u32,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_sip(args: SipArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sip_input: SipInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        SipInput {
            monthly_amount: args
                .monthly_amount
                .ok_or("--monthly-amount is required (or provide --input)")?,
            annual_return_percent: args
                .rate
                .ok_or("--rate is required (or provide --input)")?,
            years: args
                .years
                .ok_or("--years is required (or provide --input)")?,
            months: args.months,
        }
    };

    let result = sip::project_sip(&sip_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_lump_sum(args: LumpSumArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ls_input: LumpSumInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        LumpSumInput {
            amount: args
                .amount
                .ok_or("--amount is required (or provide --input)")?,
            annual_return_percent: args
                .rate
                .ok_or("--rate is required (or provide --input)")?,
            years: args
                .years
                .ok_or("--years is required (or provide --input)")?,
            months: args.months,
        }
    };

    let result = lump_sum::project_lump_sum(&ls_input)?;
    Ok(serde_json::to_value(result)?)
}
