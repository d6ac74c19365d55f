use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Error returned when a command-line argument cannot be parsed.
#[derive(Debug, Error)]
pub enum ParseArgError {
    #[error("invalid amount '{input}': {source}")]
    Decimal {
        input: String,
        #[source]
        source: rust_decimal::Error,
    },

    #[error("value must not be empty")]
    Empty,

    #[error("expected NAME=AMOUNT, got '{0}'")]
    Deduction(String),
}

/// Normalizes input for decimal parsing: trims whitespace and removes commas (thousands separator).
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses a currency amount.
///
/// Handles comma as thousands separator (e.g. `"480,000"`). Unlike a form
/// field, an empty argument is an error rather than zero.
pub fn parse_amount(s: &str) -> Result<Decimal, ParseArgError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Err(ParseArgError::Empty);
    }
    normalized.parse().map_err(|e| {
        tracing::debug!(input = %s, "invalid amount: {}", e);
        ParseArgError::Decimal {
            input: s.to_string(),
            source: e,
        }
    })
}

/// Parses a rate as a fraction (`0.1175`) or a percentage (`11.75%`).
pub fn parse_rate(s: &str) -> Result<Decimal, ParseArgError> {
    match s.trim().strip_suffix('%') {
        Some(percent) => Ok(parse_amount(percent)? / Decimal::ONE_HUNDRED),
        None => parse_amount(s),
    }
}

/// Parses a `NAME=AMOUNT` deduction argument, e.g. `retirement=93,600`.
pub fn parse_deduction(s: &str) -> Result<(String, Decimal), ParseArgError> {
    let (name, amount) = s
        .split_once('=')
        .ok_or_else(|| ParseArgError::Deduction(s.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ParseArgError::Deduction(s.to_string()));
    }
    Ok((name.to_string(), parse_amount(amount)?))
}

/// Formats an amount to cents with comma thousands separators.
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{cents}")
}

/// Formats a fractional rate as a percentage, e.g. `0.135533` as `13.55%`.
pub fn format_rate(rate: Decimal) -> String {
    let percent = (rate * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{percent:.2}%")
}
