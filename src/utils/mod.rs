//! Utility functions for formatting and common operations
//!
//! This module provides centralized formatting utilities for consistent
//! display of currency, percentage and price values throughout the
//! application, plus the inverse: cleaning brokerage currency strings.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::InputError;

/// Currency symbol options for formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySymbol {
    /// Include "$" prefix
    Usd,
    /// No currency symbol (quantities, percentages)
    None,
}

/// Core formatting function with full control over output.
///
/// Formats a Decimal value using US locale conventions:
/// - Thousands separator: `,`
/// - Decimal separator: `.`
///
/// Values are rounded half away from zero to `places` decimals. The sign
/// goes after the symbol (`$-1,234.56`), matching what brokerages export.
///
/// # Examples
/// ```
/// use breakeven::utils::{format_grouped, CurrencySymbol};
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_grouped(dec!(1234.56), 2, CurrencySymbol::Usd), "$1,234.56");
/// assert_eq!(format_grouped(dec!(105.12674), 4, CurrencySymbol::None), "105.1267");
/// ```
pub fn format_grouped(value: Decimal, places: u32, symbol: CurrencySymbol) -> String {
    let rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    let is_negative = rounded < Decimal::ZERO;
    let formatted = format!("{:.*}", places as usize, rounded.abs());
    let (integer_part, decimal_part) = match formatted.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (formatted.as_str(), None),
    };

    // Add thousands separators (,) to integer part
    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    let prefix = match symbol {
        CurrencySymbol::Usd => "$",
        CurrencySymbol::None => "",
    };

    match decimal_part {
        Some(d) => format!("{}{}{}.{}", prefix, sign, with_separators, d),
        None => format!("{}{}{}", prefix, sign, with_separators),
    }
}

// ============ Convenience functions ============

/// Format as dollars: "$1,234.56"
///
/// # Examples
/// ```
/// use breakeven::utils::format_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(1234.56)), "$1,234.56");
/// assert_eq!(format_currency(dec!(-500)), "$-500.00");
/// ```
pub fn format_currency(value: Decimal) -> String {
    format_grouped(value, 2, CurrencySymbol::Usd)
}

/// Per-share breakeven prices keep four decimals: "$105.1267"
pub fn format_price(value: Decimal) -> String {
    format_grouped(value, 4, CurrencySymbol::Usd)
}

/// Percentage with two decimals: "20.00%"
pub fn format_percent(value: Decimal) -> String {
    format!("{}%", format_grouped(value, 2, CurrencySymbol::None))
}

/// Share quantities print without trailing zeros: "10", "12.5"
pub fn format_quantity(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Parse a brokerage currency string: strips `$`, thousands separators and
/// surrounding whitespace. Parenthesised values are negative.
///
/// # Examples
/// ```
/// use breakeven::utils::parse_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(parse_currency("$1,234.50").unwrap(), dec!(1234.50));
/// assert_eq!(parse_currency("($20.00)").unwrap(), dec!(-20.00));
/// ```
pub fn parse_currency(text: &str) -> Result<Decimal> {
    let trimmed = text.trim();
    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    let cleaned = body.replace(['$', ','], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(anyhow!("empty amount"));
    }
    let value = Decimal::from_str(cleaned)
        .with_context(|| format!("could not parse amount '{}'", text.trim()))?;
    Ok(if negative { -value } else { value })
}

/// Lenient amount cleaning for interactive input: every character that is not
/// a digit or a dot is dropped ("USD 1 000.00" → 1000.00).
pub fn clean_amount(text: &str) -> Result<Decimal> {
    static NON_NUMERIC: OnceLock<Regex> = OnceLock::new();
    let re = NON_NUMERIC.get_or_init(|| Regex::new(r"[^\d.]").expect("valid regex"));
    let cleaned = re.replace_all(text, "");
    Decimal::from_str(&cleaned).with_context(|| format!("invalid amount '{}'", text.trim()))
}

/// Parse a `YYYY-MM-DD` date as typed on the command line
pub fn parse_date(text: &str) -> std::result::Result<NaiveDate, InputError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| InputError::InvalidDate(text.trim().to_string()))
}
