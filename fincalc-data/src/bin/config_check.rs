use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fincalc_data::{ProfileLoader, TaxBracketLoader, builtin};
use tracing_subscriber::EnvFilter;

/// Validate calculator configuration files.
///
/// Checks a TOML country profile and/or a CSV bracket file. With no files,
/// checks the built-in profiles. Exits non-zero on the first invalid file.
///
/// The CSV file should have the following columns:
/// - country_code: ISO 3166 alpha-2 code (e.g., ZA)
/// - tax_year: The tax year (e.g., 2026)
/// - min_income: The lower bound of the bracket
/// - max_income: The upper bound (empty for unlimited)
/// - rate: The marginal tax rate as a decimal (e.g., 0.18)
#[derive(Parser, Debug)]
#[command(name = "fincalc-config-check")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML country profile
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Path to a CSV file of tax brackets
    #[arg(short, long)]
    brackets: Option<PathBuf>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .init();

    let args = Args::parse();

    if args.profile.is_none() && args.brackets.is_none() {
        let profiles = builtin::profiles().context("Built-in profiles are invalid")?;
        for profile in &profiles {
            println!(
                "{} {} ({}): {} brackets OK",
                profile.country_code,
                profile.tax_year,
                profile.country_name,
                profile.table.brackets().len()
            );
        }
        builtin::bracket_tables().context("Built-in bracket tables are invalid")?;
        return Ok(());
    }

    if let Some(path) = &args.profile {
        let profile = ProfileLoader::from_path(path)
            .with_context(|| format!("Invalid profile: {}", path.display()))?;
        println!(
            "{}: {} {} with {} brackets, {} deduction rules, {} loan products OK",
            path.display(),
            profile.country_code,
            profile.tax_year,
            profile.table.brackets().len(),
            profile.deduction_rules.len(),
            profile.loan_products.len()
        );
    }

    if let Some(path) = &args.brackets {
        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let tables = TaxBracketLoader::load(file)
            .with_context(|| format!("Invalid bracket file: {}", path.display()))?;
        for ((country_code, tax_year), table) in &tables {
            println!(
                "{}: {} {} with {} brackets OK",
                path.display(),
                country_code,
                tax_year,
                table.brackets().len()
            );
        }
    }

    Ok(())
}
