//! Integration tests that load configuration from on-disk fixtures and run
//! the engines against the result.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fincalc_core::{AgeBand, ConfigurationError, LoanTerms};
use fincalc_data::{ProfileLoader, TaxBracketLoader, TaxBracketLoaderError, builtin};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_load_profile_from_file() {
    let profile = ProfileLoader::from_path(&fixture("testland.toml")).expect("fixture should load");

    assert_eq!(profile.country_code, "TL");
    assert_eq!(profile.currency, "TLD");
    assert_eq!(profile.table.brackets().len(), 3);
    assert_eq!(profile.loan_products.len(), 1);
}

#[test]
fn test_profile_tax_with_capped_deduction() {
    let profile = ProfileLoader::from_path(&fixture("testland.toml")).unwrap();
    let deduction = profile.deduction("pension", dec!(20000)).unwrap();

    let result = profile
        .evaluator()
        .compute_tax(dec!(100000), &[deduction], AgeBand::Under65)
        .unwrap();

    // Pension capped at 15% of 100 000 and then at 10 000.
    assert_eq!(result.total_deductions, dec!(10000.00));
    assert_eq!(result.taxable_income, dec!(90000.00));
    // 0.20 * 60 000 + 0.40 * 10 000
    assert_eq!(result.gross_tax, dec!(16000.00));
    assert_eq!(result.net_tax, dec!(15500.00));
}

#[test]
fn test_profile_age_band_uses_tax_year_end() {
    let profile = ProfileLoader::from_path(&fixture("testland.toml")).unwrap();
    let birth = NaiveDate::from_ymd_opt(1951, 7, 1).unwrap();

    // Turns 75 the day after the year ends.
    assert_eq!(profile.age_band_for(birth), AgeBand::From65To74);
}

#[test]
fn test_profile_loan_product_bounds_apply() {
    let profile = ProfileLoader::from_path(&fixture("testland.toml")).unwrap();
    let engine = profile.amortization_engine("vehicle").unwrap();

    let within = engine.compute_schedule(
        &LoanTerms::new(dec!(100000), dec!(0.10), 48).with_balloon(dec!(0.25)),
    );
    let too_long = engine.compute_schedule(&LoanTerms::new(dec!(100000), dec!(0.10), 72));

    assert!(within.is_ok());
    assert!(too_long.is_err());
}

#[test]
fn test_csv_table_overrides_profile_brackets() {
    let file = File::open(fixture("testland.csv")).unwrap();
    let tables = TaxBracketLoader::load(file).unwrap();
    let table = tables[&("TL".to_string(), 2026)].clone();
    let profile = ProfileLoader::from_path(&fixture("testland.toml"))
        .unwrap()
        .with_table(table);

    let result = profile
        .evaluator()
        .compute_tax(dec!(35000), &[], AgeBand::Under65)
        .unwrap();

    assert_eq!(result.gross_tax, dec!(3000.00));
    assert_eq!(result.marginal_rate, dec!(0.30));
}

#[test]
fn test_overlapping_csv_is_fatal() {
    let file = File::open(fixture("overlapping.csv")).unwrap();

    let result = TaxBracketLoader::load(file);

    match result {
        Err(TaxBracketLoaderError::Configuration { source, .. }) => assert_eq!(
            source,
            ConfigurationError::BracketOverlap {
                index: 0,
                previous_max: dec!(20000),
                next_min: dec!(15000),
            }
        ),
        other => panic!("expected overlap error, got {other:?}"),
    }
}

#[test]
fn test_builtin_south_africa_salary() {
    let profile = builtin::profile("ZA").unwrap();
    let deduction = profile.deduction("retirement", dec!(93600)).unwrap();

    let result = profile
        .evaluator()
        .compute_tax(dec!(480000), &[deduction], AgeBand::Under65)
        .unwrap();

    assert_eq!(result.taxable_income, dec!(386400));
    assert_eq!(result.gross_tax, dec!(82291));
    assert_eq!(result.net_tax, dec!(65056));
    assert_eq!(result.monthly_tax, dec!(5421.33));
}

#[test]
fn test_builtin_kenya_relief_applies_at_every_age() {
    let profile = builtin::profile("KE").unwrap();
    let evaluator = profile.evaluator();

    let young = evaluator.compute_tax(dec!(1200000), &[], AgeBand::Under65).unwrap();
    let old = evaluator.compute_tax(dec!(1200000), &[], AgeBand::Over75).unwrap();

    // 28 800 + 25 000 + 0.30 * 812 000 = 297 400, less 28 800 relief
    assert_eq!(young.gross_tax, dec!(297400));
    assert_eq!(young.net_tax, dec!(268600));
    assert_eq!(young, old);
}
