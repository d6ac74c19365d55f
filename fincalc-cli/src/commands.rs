//! Subcommand handlers.
//!
//! Each handler loads what it needs, runs one engine and returns a report.
//! Reports serialize to JSON as-is and know how to print themselves as text.

use std::fmt::{self, Write};
use std::fs::File;

use anyhow::{Context, Result};
use fincalc_core::calculations::common::round_half_up;
use fincalc_core::calculations::{compute_growth, period_breakdown};
use fincalc_core::{
    AgeBand, AmortizationEngine, AmortizationPeriod, CompoundingFrequency, Deduction,
    DepositTerms, GrowthPeriod, GrowthResult, LoanTerms, TaxResult,
};
use fincalc_data::{ProfileLoader, TaxBracketLoader, TaxProfile, builtin};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::{
    AffordabilityArgs, AgeArgs, Cli, Commands, DepositArgs, LoanArgs, OutputFormat, ProfileArgs,
    TaxArgs,
};
use crate::utils::{format_amount, format_rate};

/// A command result that can be printed as text or serialized as JSON.
pub trait Report: Serialize {
    fn write_text(
        &self,
        out: &mut String,
    ) -> fmt::Result;
}

/// Runs the parsed command and returns its rendered output.
pub fn run(cli: &Cli) -> Result<String> {
    match &cli.command {
        Commands::Tax(args) => render(&tax(args)?, cli.format),
        Commands::Loan(args) => render(&loan(args)?, cli.format),
        Commands::Affordability(args) => render(&affordability(args)?, cli.format),
        Commands::Deposit(args) => render(&deposit(args)?, cli.format),
        Commands::Countries => render(&countries()?, cli.format),
    }
}

pub fn render<R: Report>(
    report: &R,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize report")
        }
        OutputFormat::Text => {
            let mut out = String::new();
            report
                .write_text(&mut out)
                .context("Failed to format report")?;
            Ok(out)
        }
    }
}

fn line(
    out: &mut String,
    label: &str,
    value: impl fmt::Display,
) -> fmt::Result {
    writeln!(out, "{label:<22}{value:>16}")
}

// ─── configuration ───────────────────────────────────────────────────────────

/// Loads the country profile, optionally with brackets from a CSV file.
pub fn load_profile(args: &ProfileArgs) -> Result<TaxProfile> {
    let profile = match &args.profile {
        Some(path) => ProfileLoader::from_path(path)
            .with_context(|| format!("Failed to load profile {}", path.display()))?,
        None => builtin::profile(&args.country)
            .with_context(|| format!("Failed to load built-in profile '{}'", args.country))?,
    };

    let Some(path) = &args.brackets else {
        return Ok(profile);
    };
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut tables = TaxBracketLoader::load(file)
        .with_context(|| format!("Invalid bracket file {}", path.display()))?;
    let key = (profile.country_code.clone(), profile.tax_year);
    let table = tables.remove(&key).with_context(|| {
        format!(
            "{} has no brackets for {} {}",
            path.display(),
            profile.country_code,
            profile.tax_year
        )
    })?;
    debug!(path = %path.display(), "using brackets from CSV");
    Ok(profile.with_table(table))
}

fn age_band(
    profile: &TaxProfile,
    args: &AgeArgs,
) -> AgeBand {
    match (args.birth_date, args.age_band) {
        (Some(birth_date), _) => profile.age_band_for(birth_date),
        (None, Some(band)) => band,
        (None, None) => AgeBand::Under65,
    }
}

fn amortization_engine(
    profile: &TaxProfile,
    product: &str,
) -> Result<AmortizationEngine> {
    profile.amortization_engine(product).with_context(|| {
        let available: Vec<&str> = profile
            .loan_products
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        format!(
            "Unknown loan product '{product}' for {}; available: {}",
            profile.country_code,
            available.join(", ")
        )
    })
}

// ─── tax ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DeductionLine {
    pub name: String,
    pub requested: Decimal,
    pub allowed: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TaxReport {
    pub country_code: String,
    pub country_name: String,
    pub currency: String,
    pub tax_year: i32,
    pub age_band: AgeBand,
    pub gross_income: Decimal,
    pub deductions: Vec<DeductionLine>,
    #[serde(flatten)]
    pub result: TaxResult,
}

pub fn tax(args: &TaxArgs) -> Result<TaxReport> {
    let profile = load_profile(&args.profile)?;
    let band = age_band(&profile, &args.age);

    let deductions: Vec<Deduction> = args
        .deductions
        .iter()
        .map(|(name, amount)| {
            profile.deduction(name, *amount).unwrap_or_else(|| {
                warn!(%name, country = %profile.country_code, "no deduction rule, applying uncapped");
                Deduction::uncapped(name.as_str(), *amount)
            })
        })
        .collect();

    let result = profile
        .evaluator()
        .compute_tax(args.income, &deductions, band)
        .context("Tax calculation failed")?;

    Ok(TaxReport {
        country_code: profile.country_code.clone(),
        country_name: profile.country_name.clone(),
        currency: profile.currency.clone(),
        tax_year: profile.tax_year,
        age_band: band,
        gross_income: args.income,
        deductions: deductions
            .iter()
            .map(|d| DeductionLine {
                name: d.name.clone(),
                requested: d.requested,
                allowed: round_half_up(d.effective(args.income)),
            })
            .collect(),
        result,
    })
}

impl Report for TaxReport {
    fn write_text(
        &self,
        out: &mut String,
    ) -> fmt::Result {
        let r = &self.result;
        writeln!(
            out,
            "{} ({}) tax year {}, {}, amounts in {}",
            self.country_name, self.country_code, self.tax_year, self.age_band, self.currency
        )?;
        line(out, "Gross income", format_amount(self.gross_income))?;
        line(out, "Deductions", format_amount(r.total_deductions))?;
        for d in &self.deductions {
            line(out, &format!("  {}", d.name), format_amount(d.allowed))?;
        }
        line(out, "Taxable income", format_amount(r.taxable_income))?;
        line(out, "Gross tax", format_amount(r.gross_tax))?;
        line(out, "Rebate", format_amount(r.rebate))?;
        line(out, "Net tax", format_amount(r.net_tax))?;
        line(out, "Monthly tax", format_amount(r.monthly_tax))?;
        line(out, "Net income", format_amount(r.net_income))?;
        line(out, "Effective rate", format_rate(r.effective_rate))?;
        line(out, "Marginal rate", format_rate(r.marginal_rate))
    }
}

// ─── loan ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Settlement {
    pub months_paid: u32,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct LoanReport {
    pub product: String,
    pub principal: Decimal,
    pub deposit: Decimal,
    pub annual_rate: Decimal,
    pub term_months: i32,
    pub financed_amount: Decimal,
    pub balloon: Decimal,
    pub installment: Decimal,
    pub total_interest: Decimal,
    pub total_paid: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<Settlement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periods: Option<Vec<AmortizationPeriod>>,
}

pub fn loan(args: &LoanArgs) -> Result<LoanReport> {
    let profile = load_profile(&args.profile)?;
    let engine = amortization_engine(&profile, &args.product)?;

    let mut terms = LoanTerms::new(args.principal, args.rate, args.term);
    if let Some(deposit) = args.deposit {
        terms = terms.with_deposit(deposit);
    }
    if let Some(balloon) = args.balloon {
        terms = terms.with_balloon(balloon);
    }

    let schedule = engine
        .compute_schedule(&terms)
        .context("Loan calculation failed")?;
    let settlement = args
        .settle_after
        .map(|months_paid| {
            engine
                .settlement_balance(&terms, months_paid)
                .map(|balance| Settlement {
                    months_paid,
                    balance,
                })
        })
        .transpose()
        .context("Settlement quote failed")?;

    Ok(LoanReport {
        product: engine.product().name.clone(),
        principal: terms.principal,
        deposit: terms.deposit(),
        annual_rate: terms.annual_rate,
        term_months: terms.term_months,
        financed_amount: schedule.financed_amount,
        balloon: schedule.balloon,
        installment: schedule.installment,
        total_interest: schedule.total_interest,
        total_paid: schedule.total_paid,
        settlement,
        periods: args.schedule.then_some(schedule.periods),
    })
}

impl Report for LoanReport {
    fn write_text(
        &self,
        out: &mut String,
    ) -> fmt::Result {
        writeln!(
            out,
            "{} over {} months at {}",
            self.product,
            self.term_months,
            format_rate(self.annual_rate)
        )?;
        line(out, "Principal", format_amount(self.principal))?;
        line(out, "Deposit", format_amount(self.deposit))?;
        line(out, "Financed amount", format_amount(self.financed_amount))?;
        line(out, "Balloon", format_amount(self.balloon))?;
        line(out, "Monthly installment", format_amount(self.installment))?;
        line(out, "Total interest", format_amount(self.total_interest))?;
        line(out, "Total paid", format_amount(self.total_paid))?;
        if let Some(settlement) = &self.settlement {
            line(
                out,
                &format!("Settlement after {}", settlement.months_paid),
                format_amount(settlement.balance),
            )?;
        }
        if let Some(periods) = &self.periods {
            writeln!(out)?;
            writeln!(
                out,
                "{:>6}{:>16}{:>14}{:>14}{:>14}{:>16}",
                "Month", "Opening", "Interest", "Principal", "Payment", "Closing"
            )?;
            for p in periods {
                writeln!(
                    out,
                    "{:>6}{:>16}{:>14}{:>14}{:>14}{:>16}",
                    p.period,
                    format_amount(p.opening_balance),
                    format_amount(p.interest),
                    format_amount(p.principal_portion),
                    format_amount(p.payment),
                    format_amount(p.closing_balance)
                )?;
            }
        }
        Ok(())
    }
}

// ─── affordability ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AffordabilityReport {
    pub product: String,
    pub installment: Decimal,
    pub annual_rate: Decimal,
    pub term_months: i32,
    pub balloon_percent: Decimal,
    pub max_principal: Decimal,
    pub balloon: Decimal,
}

pub fn affordability(args: &AffordabilityArgs) -> Result<AffordabilityReport> {
    let profile = load_profile(&args.profile)?;
    let engine = amortization_engine(&profile, &args.product)?;
    let balloon_percent = args.balloon.unwrap_or(Decimal::ZERO);

    let max_principal = engine
        .max_principal_for_installment(args.installment, args.rate, args.term, balloon_percent)
        .context("Affordability calculation failed")?;

    Ok(AffordabilityReport {
        product: engine.product().name.clone(),
        installment: args.installment,
        annual_rate: args.rate,
        term_months: args.term,
        balloon_percent,
        max_principal,
        balloon: round_half_up(max_principal * balloon_percent),
    })
}

impl Report for AffordabilityReport {
    fn write_text(
        &self,
        out: &mut String,
    ) -> fmt::Result {
        writeln!(
            out,
            "{} over {} months at {}",
            self.product,
            self.term_months,
            format_rate(self.annual_rate)
        )?;
        line(out, "Monthly installment", format_amount(self.installment))?;
        line(out, "Maximum principal", format_amount(self.max_principal))?;
        line(out, "Balloon", format_amount(self.balloon))
    }
}

// ─── deposit ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct InterestTax {
    pub country_code: String,
    pub other_income: Decimal,
    pub age_band: AgeBand,
    pub tax_on_interest: Decimal,
    pub after_tax_interest: Decimal,
}

#[derive(Debug, Serialize)]
pub struct DepositReport {
    pub principal: Decimal,
    pub annual_rate: Decimal,
    pub compounding: CompoundingFrequency,
    pub term_months: i32,
    pub interest_exemption: Option<Decimal>,
    #[serde(flatten)]
    pub growth: GrowthResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<InterestTax>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Vec<GrowthPeriod>>,
}

pub fn deposit(args: &DepositArgs) -> Result<DepositReport> {
    let profile = args
        .other_income
        .map(|_| load_profile(&args.profile))
        .transpose()?;
    let exemption = args
        .exemption
        .or_else(|| profile.as_ref().and_then(|p| p.interest_exemption));

    let mut terms = DepositTerms::new(args.principal, args.rate, args.compounding, args.term);
    if let Some(contribution) = args.contribution {
        terms = terms.with_contribution(contribution);
    }
    if let Some(exemption) = exemption {
        terms = terms.with_exemption(exemption);
    }

    let growth = compute_growth(&terms).context("Deposit calculation failed")?;

    let tax = match (&profile, args.other_income) {
        (Some(profile), Some(other_income)) => {
            let band = age_band(profile, &args.age);
            let tax_on_interest = profile
                .evaluator()
                .tax_on_additional_income(other_income, growth.taxable_interest, &[], band)
                .context("Tax on interest failed")?;
            Some(InterestTax {
                country_code: profile.country_code.clone(),
                other_income,
                age_band: band,
                tax_on_interest,
                after_tax_interest: growth.total_interest - tax_on_interest,
            })
        }
        _ => None,
    };

    let breakdown = if args.breakdown {
        let periods = period_breakdown(&terms).context("Deposit calculation failed")?;
        Some(periods.iter().collect())
    } else {
        None
    };

    Ok(DepositReport {
        principal: terms.principal,
        annual_rate: terms.annual_rate,
        compounding: terms.compounding,
        term_months: terms.term_months,
        interest_exemption: exemption,
        growth,
        tax,
        breakdown,
    })
}

impl Report for DepositReport {
    fn write_text(
        &self,
        out: &mut String,
    ) -> fmt::Result {
        writeln!(
            out,
            "{} months at {} compounded {}",
            self.term_months,
            format_rate(self.annual_rate),
            self.compounding
        )?;
        line(out, "Principal", format_amount(self.principal))?;
        line(out, "Contributions", format_amount(self.growth.total_contributions))?;
        line(out, "Interest", format_amount(self.growth.total_interest))?;
        line(out, "Terminal value", format_amount(self.growth.terminal_value))?;
        if let Some(exemption) = self.interest_exemption {
            line(out, "Interest exemption", format_amount(exemption))?;
        }
        line(out, "Taxable interest", format_amount(self.growth.taxable_interest))?;
        if let Some(tax) = &self.tax {
            line(out, "Tax on interest", format_amount(tax.tax_on_interest))?;
            line(out, "After-tax interest", format_amount(tax.after_tax_interest))?;
        }
        if let Some(periods) = &self.breakdown {
            writeln!(out)?;
            writeln!(
                out,
                "{:>6}{:>16}{:>14}{:>14}{:>16}",
                "Period", "Opening", "Interest", "Contribution", "Closing"
            )?;
            for p in periods {
                writeln!(
                    out,
                    "{:>6}{:>16}{:>14}{:>14}{:>16}",
                    p.period,
                    format_amount(p.opening_balance),
                    format_amount(p.interest),
                    format_amount(p.contribution),
                    format_amount(p.closing_balance)
                )?;
            }
        }
        Ok(())
    }
}

// ─── countries ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CountryRow {
    pub country_code: String,
    pub country_name: String,
    pub currency: String,
    pub tax_year: i32,
    pub brackets: usize,
    pub loan_products: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct CountriesReport(pub Vec<CountryRow>);

pub fn countries() -> Result<CountriesReport> {
    let profiles = builtin::profiles().context("Built-in profiles are invalid")?;
    Ok(CountriesReport(
        profiles
            .into_iter()
            .map(|p| CountryRow {
                brackets: p.table.brackets().len(),
                loan_products: p.loan_products.iter().map(|l| l.name.clone()).collect(),
                country_code: p.country_code,
                country_name: p.country_name,
                currency: p.currency,
                tax_year: p.tax_year,
            })
            .collect(),
    ))
}

impl Report for CountriesReport {
    fn write_text(
        &self,
        out: &mut String,
    ) -> fmt::Result {
        for c in &self.0 {
            writeln!(
                out,
                "{}  {:<14} {}  {}  {} brackets  loans: {}",
                c.country_code,
                c.country_name,
                c.currency,
                c.tax_year,
                c.brackets,
                c.loan_products.join(", ")
            )?;
        }
        Ok(())
    }
}
