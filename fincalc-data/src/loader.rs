use std::collections::BTreeMap;
use std::io::Read;

use fincalc_core::{ConfigurationError, TaxBracket, TaxTable};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors that can occur when loading tax bracket data.
#[derive(Debug, Error)]
pub enum TaxBracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("invalid bracket table for {country_code} {tax_year}: {source}")]
    Configuration {
        country_code: String,
        tax_year: i32,
        #[source]
        source: ConfigurationError,
    },
}

impl From<csv::Error> for TaxBracketLoaderError {
    fn from(err: csv::Error) -> Self {
        TaxBracketLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from a tax brackets CSV file.
///
/// - `country_code`: ISO 3166 alpha-2 code (e.g., ZA)
/// - `tax_year`: the tax year the table applies to (e.g., 2026)
/// - `min_income`: the lower bound of the bracket
/// - `max_income`: the upper bound, inclusive (empty for unlimited)
/// - `rate`: the marginal tax rate as a decimal (e.g., 0.18 for 18%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxBracketRecord {
    pub country_code: String,
    pub tax_year: i32,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Bracket tables keyed by `(country_code, tax_year)`.
pub type TaxTables = BTreeMap<(String, i32), TaxTable>;

/// Loader for tax bracket tables from CSV files.
///
/// Rows for the same country and year form one table, in file order. Every
/// table is validated on load; a gap or overlap stops the load.
pub struct TaxBracketLoader;

impl TaxBracketLoader {
    /// Parse tax bracket records from a CSV reader.
    ///
    /// The reader can be any type that implements `Read`, such as a file or a
    /// string slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxBracketRecord>, TaxBracketLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: TaxBracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Group records by country and year and validate each group into a
    /// [`TaxTable`].
    ///
    /// Country codes are normalised to upper case.
    pub fn tables(records: &[TaxBracketRecord]) -> Result<TaxTables, TaxBracketLoaderError> {
        let mut groups: BTreeMap<(String, i32), Vec<TaxBracket>> = BTreeMap::new();

        for record in records {
            groups
                .entry((record.country_code.trim().to_ascii_uppercase(), record.tax_year))
                .or_default()
                .push(TaxBracket::new(record.min_income, record.max_income, record.rate));
        }

        let mut tables = TaxTables::new();
        for ((country_code, tax_year), brackets) in groups {
            let count = brackets.len();
            let table = TaxTable::new(brackets).map_err(|source| {
                TaxBracketLoaderError::Configuration {
                    country_code: country_code.clone(),
                    tax_year,
                    source,
                }
            })?;
            info!(%country_code, tax_year, brackets = count, "loaded tax table");
            tables.insert((country_code, tax_year), table);
        }

        Ok(tables)
    }

    /// [`parse`](Self::parse) followed by [`tables`](Self::tables).
    pub fn load<R: Read>(reader: R) -> Result<TaxTables, TaxBracketLoaderError> {
        let records = Self::parse(reader)?;
        Self::tables(&records)
    }
}
