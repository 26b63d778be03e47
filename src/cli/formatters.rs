//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of data calculation from presentation.

use chrono::NaiveDate;
use colored::Colorize;
use rust_decimal::Decimal;
use std::path::Path;

use crate::importers::TradeConfirmation;
use crate::reports::ReportTable;
use crate::universe::UniverseMeta;
use crate::utils::{format_currency, format_percent};

/// Section title followed by the rendered table
pub fn format_section(title: &str, table: &ReportTable) -> String {
    format!("\n{} {}\n\n{}\n", "📊".cyan().bold(), title.bold(), table.render())
}

pub fn format_saved(what: &str, path: &Path) -> String {
    format!("{} {} saved to {}", "✓".green().bold(), what, path.display())
}

pub fn format_info(message: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), message)
}

pub fn format_warning(message: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), message)
}

pub fn format_error(message: &str) -> String {
    format!("{} Error: {}", "✗".red().bold(), message)
}

/// Percent with sign colour: green for gains, red for losses
pub fn format_change(pct: Decimal) -> String {
    let text = format_percent(pct);
    if pct >= Decimal::ZERO {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

/// Interest and breakeven for a single recorded trade
pub fn format_confirmation(
    trade: &TradeConfirmation,
    interest: Decimal,
    breakeven: Decimal,
    rate: Decimal,
) -> String {
    let rate_pct = format_percent(rate * Decimal::ONE_HUNDRED);
    format!(
        "\n{:<28} {} {} {} @ {}\n{:<28} {}\n{:<28} {}\n",
        "Trade:".bold(),
        trade.action,
        trade.quantity.normalize(),
        trade.symbol,
        format_currency(trade.price),
        format!("Interest at {} since {}:", rate_pct, trade.trade_date.format("%m/%d/%Y")).bold(),
        format_currency(interest),
        "Breakeven sell price:".bold(),
        format_currency(breakeven).green().bold(),
    )
}

/// Cache status line for `universe show`
pub fn format_universe_meta(meta: Option<&UniverseMeta>, as_of: NaiveDate) -> String {
    match meta {
        Some(meta) => format!(
            "{} {} constituents fetched {} from {} (as of {})",
            "ℹ".blue().bold(),
            meta.count,
            meta.fetched_at.format("%Y-%m-%d %H:%M UTC"),
            meta.source_url,
            as_of
        ),
        None => format_info("No cached S&P 500 list. Run: breakeven universe refresh"),
    }
}
