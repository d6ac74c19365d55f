//! End-to-end tests of the `fincalc` subcommands through argument parsing.

use std::path::{Path, PathBuf};

use clap::Parser;
use fincalc_cli::cli::Cli;
use fincalc_cli::commands;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

fn run(args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(std::iter::once("fincalc").chain(args.iter().copied()))?;
    commands::run(&cli)
}

fn run_json(args: &[&str]) -> Value {
    let mut full = args.to_vec();
    full.extend(["--format", "json"]);
    let output = run(&full).expect("command should succeed");
    serde_json::from_str(&output).expect("output should be JSON")
}

/// Decimals serialize as strings; compare numerically so scale does not matter.
fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {value}"))
        .parse()
        .unwrap()
}

fn data_fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../fincalc-data/tests/fixtures")
        .join(name)
}

// ===== tax =====

#[test]
fn test_tax_south_africa_salary_json() {
    let json = run_json(&["tax", "--income", "480,000", "--deduction", "retirement=93,600"]);

    assert_eq!(json["country_code"], "ZA");
    assert_eq!(json["age_band"], "under_65");
    assert_eq!(decimal(&json["taxable_income"]), dec!(386400));
    assert_eq!(decimal(&json["gross_tax"]), dec!(82291));
    assert_eq!(decimal(&json["rebate"]), dec!(17235));
    assert_eq!(decimal(&json["net_tax"]), dec!(65056));
    assert_eq!(decimal(&json["monthly_tax"]), dec!(5421.33));
    assert_eq!(decimal(&json["marginal_rate"]), dec!(0.31));
    assert_eq!(json["deductions"][0]["name"], "retirement");
    assert_eq!(decimal(&json["deductions"][0]["allowed"]), dec!(93600));
}

#[test]
fn test_tax_text_output() {
    let output = run(&["tax", "--income", "480000", "--deduction", "retirement=93600"]).unwrap();

    assert!(output.starts_with("South Africa (ZA) tax year 2026"));
    assert!(output.contains("386,400.00"));
    assert!(output.contains("65,056.00"));
    assert!(output.contains("13.55%"));
}

#[test]
fn test_tax_birth_date_selects_age_band() {
    let json = run_json(&["tax", "--income", "480000", "--birth-date", "1950-01-01"]);

    assert_eq!(json["age_band"], "75_plus");
    assert_eq!(decimal(&json["rebate"]), dec!(29824));
}

#[test]
fn test_tax_age_band_and_birth_date_conflict() {
    let result = run(&[
        "tax",
        "--income",
        "480000",
        "--age-band",
        "65-74",
        "--birth-date",
        "1950-01-01",
    ]);

    assert!(result.is_err());
}

#[test]
fn test_tax_unknown_deduction_is_uncapped() {
    let json = run_json(&["tax", "--income", "100000", "--deduction", "medical=70000"]);

    assert_eq!(decimal(&json["total_deductions"]), dec!(70000));
}

#[test]
fn test_tax_negative_income_is_rejected() {
    let result = run(&["tax", "--income=-1"]);

    assert!(result.is_err());
}

#[test]
fn test_tax_with_profile_and_csv_brackets() {
    let profile = data_fixture("testland.toml");
    let brackets = data_fixture("testland.csv");

    let json = run_json(&[
        "tax",
        "--profile",
        profile.to_str().unwrap(),
        "--brackets",
        brackets.to_str().unwrap(),
        "--income",
        "35000",
    ]);

    assert_eq!(json["country_code"], "TL");
    assert_eq!(decimal(&json["gross_tax"]), dec!(3000));
    assert_eq!(decimal(&json["net_tax"]), dec!(2500));
}

#[test]
fn test_tax_unknown_country_fails() {
    let result = run(&["tax", "--country", "XX", "--income", "1000"]);

    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("XX"), "{message}");
}

// ===== loan =====

#[test]
fn test_loan_with_balloon_and_schedule() {
    let json = run_json(&[
        "loan",
        "--principal",
        "200,000",
        "--rate",
        "11.75%",
        "--term",
        "72",
        "--balloon",
        "0.30",
        "--schedule",
        "--settle-after",
        "72",
    ]);

    assert_eq!(json["product"], "vehicle");
    assert_eq!(decimal(&json["installment"]), dec!(3306.36));
    assert_eq!(decimal(&json["balloon"]), dec!(60000));
    assert_eq!(json["periods"].as_array().unwrap().len(), 72);
    assert_eq!(decimal(&json["periods"][71]["closing_balance"]), dec!(60000));
    assert_eq!(decimal(&json["settlement"]["balance"]), dec!(60000));
}

#[test]
fn test_loan_without_schedule_omits_periods() {
    let json = run_json(&["loan", "--principal", "200000", "--rate", "0.1175", "--term", "72"]);

    assert_eq!(decimal(&json["installment"]), dec!(3884.09));
    assert!(json.get("periods").is_none());
    assert!(json.get("settlement").is_none());
}

#[test]
fn test_loan_balloon_not_allowed_on_personal_loan() {
    let result = run(&[
        "loan",
        "--principal",
        "50000",
        "--rate",
        "0.20",
        "--term",
        "36",
        "--product",
        "personal",
        "--balloon",
        "0.10",
    ]);

    assert!(result.is_err());
}

#[test]
fn test_loan_unknown_product() {
    let result = run(&[
        "loan",
        "--principal",
        "50000",
        "--rate",
        "0.20",
        "--term",
        "36",
        "--product",
        "boat",
    ]);

    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Unknown loan product 'boat'"), "{message}");
}

#[test]
fn test_loan_settlement_beyond_term_fails() {
    let result = run(&[
        "loan",
        "--principal",
        "200000",
        "--rate",
        "0.1175",
        "--term",
        "72",
        "--settle-after",
        "73",
    ]);

    assert!(result.is_err());
}

#[test]
fn test_loan_steep_rate_on_long_home_loan() {
    let json = run_json(&[
        "loan",
        "--principal",
        "100000",
        "--rate",
        "300%",
        "--term",
        "360",
        "--product",
        "home",
    ]);

    assert_eq!(decimal(&json["installment"]), dec!(25000));
}

// ===== affordability =====

#[test]
fn test_affordability_inverts_installment() {
    let json = run_json(&[
        "affordability",
        "--installment",
        "3,884.09",
        "--rate",
        "0.1175",
        "--term",
        "72",
    ]);

    assert_eq!(decimal(&json["max_principal"]), dec!(200000.20));
    assert_eq!(decimal(&json["balloon"]), dec!(0));
}

#[test]
fn test_affordability_with_balloon() {
    let json = run_json(&[
        "affordability",
        "--installment",
        "3306.36",
        "--rate",
        "0.1175",
        "--term",
        "72",
        "--balloon",
        "0.30",
    ]);

    assert_eq!(decimal(&json["max_principal"]), dec!(199999.98));
    assert_eq!(decimal(&json["balloon"]), dec!(60000.00));
}

// ===== deposit =====

#[test]
fn test_deposit_fixed_term() {
    let json = run_json(&["deposit", "--principal", "10000", "--rate", "0.0925", "--term", "12"]);

    assert_eq!(json["compounding"], "monthly");
    assert_eq!(decimal(&json["terminal_value"]), dec!(10965.24));
    assert_eq!(decimal(&json["total_interest"]), dec!(965.24));
    assert_eq!(json["periods"], 12);
    assert!(json.get("tax").is_none());
}

#[test]
fn test_deposit_breakdown_chains() {
    let json = run_json(&[
        "deposit",
        "--principal",
        "10000",
        "--rate",
        "0.0925",
        "--term",
        "12",
        "--breakdown",
    ]);

    let rows = json["breakdown"].as_array().unwrap();
    assert_eq!(rows.len(), 12);
    for pair in rows.windows(2) {
        assert_eq!(decimal(&pair[0]["closing_balance"]), decimal(&pair[1]["opening_balance"]));
    }
    assert_eq!(decimal(&rows[11]["closing_balance"]), dec!(10965.24));
}

#[test]
fn test_deposit_interest_taxed_on_top_of_other_income() {
    let json = run_json(&[
        "deposit",
        "--principal",
        "1,000,000",
        "--rate",
        "0.0925",
        "--term",
        "12",
        "--country",
        "ZA",
        "--other-income",
        "300000",
    ]);

    // Profile exemption of 23 800 applies when none is given.
    assert_eq!(decimal(&json["interest_exemption"]), dec!(23800));
    assert_eq!(decimal(&json["total_interest"]), dec!(96524.15));
    assert_eq!(decimal(&json["taxable_interest"]), dec!(72724.15));
    assert_eq!(decimal(&json["tax"]["tax_on_interest"]), dec!(19019.49));
    assert_eq!(decimal(&json["tax"]["after_tax_interest"]), dec!(77504.66));
}

#[test]
fn test_deposit_interest_below_exemption_is_untaxed() {
    let json = run_json(&[
        "deposit",
        "--principal",
        "10000",
        "--rate",
        "0.0925",
        "--term",
        "12",
        "--other-income",
        "300000",
    ]);

    assert_eq!(decimal(&json["taxable_interest"]), dec!(0));
    assert_eq!(decimal(&json["tax"]["tax_on_interest"]), dec!(0));
}

#[test]
fn test_deposit_negative_rate_parses() {
    let json = run_json(&["deposit", "--principal", "10000", "--rate", "-0.01", "--term", "12"]);

    assert!(decimal(&json["total_interest"]) < Decimal::ZERO);
}

#[test]
fn test_deposit_out_of_range_growth_is_reported() {
    let result = run(&["deposit", "--principal", "10000", "--rate", "100%", "--term", "1200"]);

    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("representable decimal range"), "{message}");
}

#[test]
fn test_deposit_daily_contributions_total_monthly_amounts() {
    let json = run_json(&[
        "deposit",
        "--principal",
        "0",
        "--rate",
        "0.0925",
        "--term",
        "12",
        "--compounding",
        "daily",
        "--contribution",
        "100",
    ]);

    assert_eq!(decimal(&json["total_contributions"]), dec!(1200));
}

#[test]
fn test_deposit_rejects_unknown_compounding() {
    let result = run(&[
        "deposit",
        "--principal",
        "10000",
        "--rate",
        "0.0925",
        "--term",
        "12",
        "--compounding",
        "hourly",
    ]);

    assert!(result.is_err());
}

// ===== countries =====

#[test]
fn test_countries_lists_builtin_profiles() {
    let json = run_json(&["countries"]);

    let codes: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["country_code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["ZA", "KE"]);
    assert_eq!(json[0]["brackets"], 7);
}
