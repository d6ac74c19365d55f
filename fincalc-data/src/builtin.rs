//! Country profiles compiled into the binary.

use crate::loader::{TaxBracketLoader, TaxBracketLoaderError, TaxTables};
use crate::profile::{ProfileLoader, ProfileLoaderError, TaxProfile};

const PROFILES: &[(&str, &str)] = &[
    ("ZA", include_str!("../data/za_2026.toml")),
    ("KE", include_str!("../data/ke_2025.toml")),
];

const BRACKETS_CSV: &str = include_str!("../data/brackets.csv");

/// Country codes with a built-in profile.
pub fn country_codes() -> Vec<&'static str> {
    PROFILES.iter().map(|(code, _)| *code).collect()
}

/// Every built-in profile, validated.
pub fn profiles() -> Result<Vec<TaxProfile>, ProfileLoaderError> {
    PROFILES
        .iter()
        .map(|(_, source)| ProfileLoader::from_toml_str(source))
        .collect()
}

/// The built-in profile for `country_code` (case-insensitive).
pub fn profile(country_code: &str) -> Result<TaxProfile, ProfileLoaderError> {
    let (_, source) = PROFILES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(country_code.trim()))
        .ok_or_else(|| ProfileLoaderError::UnknownCountry(country_code.to_string()))?;
    ProfileLoader::from_toml_str(source)
}

/// The built-in bracket tables, keyed by country and year.
pub fn bracket_tables() -> Result<TaxTables, TaxBracketLoaderError> {
    TaxBracketLoader::load(BRACKETS_CSV.as_bytes())
}
