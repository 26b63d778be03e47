//! Tab-separated lot lines as copied from a brokerage "purchase history" view.
//!
//! Only three columns matter: 0 (acquired date, `Jan-15-2024`), 5 (quantity)
//! and 7 (total cost basis, `$1,234.56`). The rest is display noise.

use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, info};

use super::read_input;
use crate::error::InputError;
use crate::models::Lot;
use crate::utils::{format_currency, format_quantity, parse_currency};

pub const DATE_FORMAT: &str = "%b-%d-%Y";

const DATE_COL: usize = 0;
const QUANTITY_COL: usize = 5;
const COST_BASIS_COL: usize = 7;
const MIN_COLUMNS: usize = COST_BASIS_COL + 1;

/// Parse one line. Blank lines and the header line yield `Ok(None)`.
pub fn parse_lot_line(line: &str, line_no: usize, symbol: &str) -> Result<Option<Lot>, InputError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.to_lowercase().starts_with("acquired") {
        return Ok(None);
    }

    let parse_err = |message: String| InputError::Parse {
        line: line_no,
        message,
    };

    let parts: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    if parts.len() < MIN_COLUMNS {
        return Err(parse_err(format!(
            "expected at least {} tab-separated columns, found {}",
            MIN_COLUMNS,
            parts.len()
        )));
    }

    let date_text = parts[DATE_COL].trim();
    let purchase_date = NaiveDate::parse_from_str(date_text, DATE_FORMAT)
        .map_err(|_| parse_err(format!("invalid date '{}', expected e.g. Jan-15-2024", date_text)))?;

    let quantity = parse_currency(parts[QUANTITY_COL])
        .map_err(|e| parse_err(format!("invalid quantity: {:#}", e)))?;
    let cost_basis = parse_currency(parts[COST_BASIS_COL])
        .map_err(|e| parse_err(format!("invalid cost basis: {:#}", e)))?;

    Lot::new(symbol, purchase_date, quantity, cost_basis)
        .map(Some)
        .map_err(parse_err)
}

/// Parse every line, stopping at the first malformed one
pub fn parse_lots(content: &str, symbol: &str) -> Result<Vec<Lot>, InputError> {
    let mut lots = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if let Some(lot) = parse_lot_line(line, idx + 1, symbol)? {
            debug!("Parsed lot: {} {} @ {}", lot.purchase_date(), lot.quantity(), lot.cost_basis_total());
            lots.push(lot);
        }
    }
    Ok(lots)
}

pub fn parse_lots_file<P: AsRef<Path>>(path: P, symbol: &str) -> Result<Vec<Lot>, InputError> {
    let content = read_input(path.as_ref())?;
    let lots = parse_lots(&content, symbol)?;
    info!("Parsed {} lots from {:?}", lots.len(), path.as_ref());
    Ok(lots)
}

/// Render a lot back into the export layout (unused columns left empty)
pub fn format_lot_line(lot: &Lot) -> String {
    let mut cols = vec![String::new(); MIN_COLUMNS];
    cols[DATE_COL] = lot.purchase_date().format(DATE_FORMAT).to_string();
    cols[QUANTITY_COL] = format_quantity(lot.quantity());
    cols[COST_BASIS_COL] = format_currency(lot.cost_basis_total());
    cols.join("\t")
}
