use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fincalc_core::{AgeBand, CompoundingFrequency};
use rust_decimal::Decimal;

use crate::utils::{parse_amount, parse_deduction, parse_rate};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Personal finance calculator: income tax, loan repayments and deposit growth.
///
/// Amounts accept comma thousands separators (`480,000`). Rates are fractions
/// (`0.1175`) or percentages (`11.75%`).
#[derive(Debug, Parser)]
#[command(name = "fincalc", version, about)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log calculation steps to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Income tax for one year.
    Tax(TaxArgs),

    /// Installment and repayment schedule for a loan.
    Loan(LoanArgs),

    /// Largest loan a monthly installment can service.
    Affordability(AffordabilityArgs),

    /// Growth of a fixed deposit or savings plan.
    Deposit(DepositArgs),

    /// List the built-in country profiles.
    Countries,
}

/// Where the country configuration comes from.
#[derive(Debug, Clone, Args)]
pub struct ProfileArgs {
    /// Built-in country profile (see `fincalc countries`).
    #[arg(long, default_value = "ZA")]
    pub country: String,

    /// TOML country profile to use instead of a built-in one.
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// CSV bracket file replacing the profile's brackets for its country and year.
    #[arg(long)]
    pub brackets: Option<PathBuf>,
}

/// Age inputs for rebate selection.
#[derive(Debug, Clone, Args)]
pub struct AgeArgs {
    /// Age band: under65, 65-74 or 75+.
    #[arg(long, conflicts_with = "birth_date")]
    pub age_band: Option<AgeBand>,

    /// Date of birth (YYYY-MM-DD); age is assessed at the end of the tax year.
    #[arg(long)]
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Args)]
pub struct TaxArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Gross annual income.
    #[arg(long, value_parser = parse_amount)]
    pub income: Decimal,

    /// Deduction as NAME=AMOUNT; capped by the profile rule of that name.
    #[arg(long = "deduction", value_parser = parse_deduction)]
    pub deductions: Vec<(String, Decimal)>,

    #[command(flatten)]
    pub age: AgeArgs,
}

#[derive(Debug, Clone, Args)]
pub struct LoanArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Purchase price or amount borrowed before any deposit.
    #[arg(long, value_parser = parse_amount)]
    pub principal: Decimal,

    /// Nominal annual interest rate.
    #[arg(long, value_parser = parse_rate)]
    pub rate: Decimal,

    /// Term in months.
    #[arg(long)]
    pub term: i32,

    /// Up-front deposit.
    #[arg(long, value_parser = parse_amount)]
    pub deposit: Option<Decimal>,

    /// Balloon as a fraction of the principal.
    #[arg(long, value_parser = parse_rate)]
    pub balloon: Option<Decimal>,

    /// Loan product whose term and balloon limits apply.
    #[arg(long, default_value = "vehicle")]
    pub product: String,

    /// Print every period of the schedule.
    #[arg(long)]
    pub schedule: bool,

    /// Quote the settlement balance after this many installments.
    #[arg(long)]
    pub settle_after: Option<u32>,
}

#[derive(Debug, Clone, Args)]
pub struct AffordabilityArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Monthly installment the borrower can pay.
    #[arg(long, value_parser = parse_amount)]
    pub installment: Decimal,

    /// Nominal annual interest rate.
    #[arg(long, value_parser = parse_rate)]
    pub rate: Decimal,

    /// Term in months.
    #[arg(long)]
    pub term: i32,

    /// Balloon as a fraction of the principal.
    #[arg(long, value_parser = parse_rate)]
    pub balloon: Option<Decimal>,

    /// Loan product whose term and balloon limits apply.
    #[arg(long, default_value = "vehicle")]
    pub product: String,
}

#[derive(Debug, Clone, Args)]
pub struct DepositArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Opening balance.
    #[arg(long, value_parser = parse_amount)]
    pub principal: Decimal,

    /// Nominal annual interest rate.
    #[arg(long, value_parser = parse_rate, allow_hyphen_values = true)]
    pub rate: Decimal,

    /// Term in months.
    #[arg(long)]
    pub term: i32,

    /// daily, monthly, quarterly, semi-annually or annually.
    #[arg(long, default_value = "monthly")]
    pub compounding: CompoundingFrequency,

    /// Monthly contribution.
    #[arg(long, value_parser = parse_amount)]
    pub contribution: Option<Decimal>,

    /// Interest exempt from tax. Defaults to the profile's exemption when
    /// `--other-income` is given.
    #[arg(long, value_parser = parse_amount)]
    pub exemption: Option<Decimal>,

    /// Print every compounding period.
    #[arg(long)]
    pub breakdown: bool,

    /// Other taxable income for the year; the taxable interest is taxed on
    /// top of it.
    #[arg(long, value_parser = parse_amount)]
    pub other_income: Option<Decimal>,

    #[command(flatten)]
    pub age: AgeArgs,
}
