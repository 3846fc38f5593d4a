mod commands;
mod input;
mod log;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::investment::{LumpSumArgs, SipArgs};
use commands::loan::{LoanArgs, LoanTemplateArgs};

/// Loan amortization schedules and investment projections
#[derive(Parser)]
#[command(
    name = "calckit",
    version,
    about = "Loan amortization schedules and investment projections",
    long_about = "A CLI for month-by-month loan amortization with prepayments, top-ups \
                  and floating-rate changes, plus SIP and lump-sum growth projections. \
                  All arithmetic is done in decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Decimal places for currency and percentages in table, csv and minimal output
    #[arg(long, default_value_t = 2, global = true)]
    precision: u32,

    /// Log level (off, error, warn, info, debug, trace); CALCKIT_LOG_LEVEL takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a loan amortization schedule with its principal/interest breakdown
    Loan(LoanArgs),
    /// Print a blank event table for a loan term
    LoanTemplate(LoanTemplateArgs),
    /// Project a systematic investment plan
    Sip(SipArgs),
    /// Project a one-off lump sum investment
    LumpSum(LumpSumArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = log::init(cli.log_level.as_deref()) {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Loan(args) => commands::loan::run_loan(args),
        Commands::LoanTemplate(args) => commands::loan::run_loan_template(args),
        Commands::Sip(args) => commands::investment::run_sip(args),
        Commands::LumpSum(args) => commands::investment::run_lump_sum(args),
        Commands::Version => {
            println!("calckit {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(cli.output, cli.precision, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
