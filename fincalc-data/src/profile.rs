//! Per-country tax profiles loaded from TOML.
//!
//! A profile bundles everything a country's calculators need: the bracket
//! table, rebates, deduction rules and loan products. Profiles are validated
//! once on load into a [`TaxProfile`]; an invalid profile never reaches an
//! engine.
//!
//! ```toml
//! country_code = "ZA"
//! country_name = "South Africa"
//! currency = "ZAR"
//! tax_year = 2026
//! tax_year_end = "2026-02-28"
//! interest_exemption = 23800
//!
//! [[brackets]]
//! min = 0
//! max = 237100
//! rate = 0.18
//!
//! [[brackets]]
//! min = 237100
//! rate = 0.26
//!
//! [rebates]
//! under_65 = 17235
//! from_65_to_74 = 26679
//! from_75 = 29824
//!
//! [[deduction_rules]]
//! name = "retirement"
//! percentage_cap = 0.275
//! absolute_cap = 350000
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fincalc_core::{
    AgeBand, AmortizationEngine, BracketTaxEvaluator, ConfigurationError, Deduction,
    DeductionRule, LoanProduct, RebateTable, TaxBracket, TaxTable,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors that can occur when loading a country profile.
#[derive(Debug, Error)]
pub enum ProfileLoaderError {
    #[error("cannot read profile '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid profile for {country_code}: {source}")]
    Configuration {
        country_code: String,
        #[source]
        source: ConfigurationError,
    },

    #[error("no profile for country '{0}'")]
    UnknownCountry(String),
}

/// A country profile exactly as written in the TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProfile {
    pub country_code: String,
    pub country_name: String,
    pub currency: String,
    pub tax_year: i32,
    /// Last day of the tax year; ages are assessed on this date.
    pub tax_year_end: NaiveDate,
    pub brackets: Vec<TaxBracket>,
    #[serde(default)]
    pub rebates: RebateTable,
    #[serde(default)]
    pub deduction_rules: Vec<DeductionRule>,
    #[serde(default)]
    pub interest_exemption: Option<Decimal>,
    /// Falls back to [`LoanProduct::builtin`] when empty.
    #[serde(default)]
    pub loan_products: Vec<LoanProduct>,
}

/// A validated country profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxProfile {
    pub country_code: String,
    pub country_name: String,
    pub currency: String,
    pub tax_year: i32,
    pub tax_year_end: NaiveDate,
    pub table: TaxTable,
    pub rebates: RebateTable,
    pub deduction_rules: Vec<DeductionRule>,
    pub interest_exemption: Option<Decimal>,
    pub loan_products: Vec<LoanProduct>,
}

impl TaxProfile {
    /// Validates a raw profile.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the brackets are not contiguous, a
    /// deduction rule or loan product is malformed, or two rules or products
    /// share a name. Negative rebates are already refused while parsing.
    pub fn from_raw(raw: CountryProfile) -> Result<Self, ConfigurationError> {
        let table = TaxTable::new(raw.brackets)?;

        let mut seen = HashSet::new();
        for rule in &raw.deduction_rules {
            rule.validate()?;
            if !seen.insert(rule.name.as_str()) {
                return Err(ConfigurationError::InvalidDeductionRule {
                    name: rule.name.clone(),
                    reason: "duplicate rule name".to_string(),
                });
            }
        }

        let loan_products = if raw.loan_products.is_empty() {
            LoanProduct::builtin()
        } else {
            raw.loan_products
        };
        let mut seen = HashSet::new();
        for product in &loan_products {
            product.validate()?;
            if !seen.insert(product.name.as_str()) {
                return Err(ConfigurationError::InvalidLoanProduct {
                    name: product.name.clone(),
                    reason: "duplicate product name".to_string(),
                });
            }
        }

        Ok(Self {
            country_code: raw.country_code.trim().to_ascii_uppercase(),
            country_name: raw.country_name,
            currency: raw.currency,
            tax_year: raw.tax_year,
            tax_year_end: raw.tax_year_end,
            table,
            rebates: raw.rebates,
            deduction_rules: raw.deduction_rules,
            interest_exemption: raw.interest_exemption,
            loan_products,
        })
    }

    /// Replaces the bracket table, e.g. with one loaded from CSV.
    pub fn with_table(
        mut self,
        table: TaxTable,
    ) -> Self {
        self.table = table;
        self
    }

    pub fn evaluator(&self) -> BracketTaxEvaluator<'_> {
        BracketTaxEvaluator::new(&self.table, &self.rebates)
    }

    pub fn deduction_rule(
        &self,
        name: &str,
    ) -> Option<&DeductionRule> {
        self.deduction_rules
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// A deduction of `requested` under the named rule's caps.
    pub fn deduction(
        &self,
        name: &str,
        requested: Decimal,
    ) -> Option<Deduction> {
        self.deduction_rule(name).map(|r| r.request(requested))
    }

    pub fn loan_product(
        &self,
        name: &str,
    ) -> Option<&LoanProduct> {
        self.loan_products
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// An amortization engine for the named product.
    pub fn amortization_engine(
        &self,
        product: &str,
    ) -> Option<AmortizationEngine> {
        self.loan_product(product).cloned().map(AmortizationEngine::new)
    }

    /// Age band of someone born on `birth_date`, assessed on the last day of
    /// this profile's tax year.
    pub fn age_band_for(
        &self,
        birth_date: NaiveDate,
    ) -> AgeBand {
        AgeBand::on(birth_date, self.tax_year_end)
    }
}

/// Reads and validates [`TaxProfile`]s.
pub struct ProfileLoader;

impl ProfileLoader {
    pub fn from_toml_str(source: &str) -> Result<TaxProfile, ProfileLoaderError> {
        let raw: CountryProfile = toml::from_str(source)?;
        let country_code = raw.country_code.clone();
        let profile = TaxProfile::from_raw(raw).map_err(|source| {
            ProfileLoaderError::Configuration {
                country_code,
                source,
            }
        })?;

        info!(
            country = %profile.country_code,
            tax_year = profile.tax_year,
            brackets = profile.table.brackets().len(),
            "loaded tax profile"
        );
        Ok(profile)
    }

    pub fn from_path(path: &Path) -> Result<TaxProfile, ProfileLoaderError> {
        let source = fs::read_to_string(path).map_err(|source| ProfileLoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}
