//! Trade confirmation text pasted from a brokerage order-status page.
//!
//! Non-blank lines are positional:
//! ```text
//! 05/01/2025 Buy          <- trade date, action
//! Order details           <- ignored
//! AAPL                    <- symbol
//! APPLE INC               <- ignored
//! 10                      <- quantity
//! $170.50 ... -$1,705.00  <- price (first token), total (last token)
//! ```

use chrono::NaiveDate;
use csv::WriterBuilder;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::info;

use crate::basis;
use crate::error::{BasisError, InputError};
use crate::utils::{format_quantity, parse_currency};

pub const DATE_FORMAT: &str = "%m/%d/%Y";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeConfirmation {
    pub trade_date: NaiveDate,
    pub action: String,
    pub symbol: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub total: Decimal,
    /// Confirmations don't list one; always zero
    pub commission: Decimal,
}

#[derive(Serialize)]
struct TradeRecord<'a> {
    #[serde(rename = "Trade date")]
    trade_date: String,
    #[serde(rename = "Symbol")]
    symbol: &'a str,
    #[serde(rename = "Action")]
    action: &'a str,
    #[serde(rename = "Quantity")]
    quantity: String,
    #[serde(rename = "Price")]
    price: String,
    #[serde(rename = "Total")]
    total: String,
    #[serde(rename = "Commission")]
    commission: String,
}

fn line_err(line: usize, message: impl Into<String>) -> InputError {
    InputError::Parse {
        line,
        message: message.into(),
    }
}

/// Parse confirmation text
pub fn parse_confirmation(content: &str) -> Result<TradeConfirmation, InputError> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < 6 {
        return Err(InputError::Validation(format!(
            "expected at least 6 non-blank lines, found {}",
            lines.len()
        )));
    }

    let mut head = lines[0].split_whitespace();
    let (Some(date_text), Some(action)) = (head.next(), head.next()) else {
        return Err(line_err(1, "expected '<MM/DD/YYYY> <action>'"));
    };
    let trade_date = NaiveDate::parse_from_str(date_text, DATE_FORMAT)
        .map_err(|_| line_err(1, format!("invalid trade date '{}'", date_text)))?;

    let symbol = lines[2].to_uppercase();

    let quantity = parse_currency(lines[4])
        .map_err(|e| line_err(5, format!("invalid quantity: {:#}", e)))?;
    if quantity <= Decimal::ZERO {
        return Err(line_err(5, "quantity must be positive"));
    }

    let amounts: Vec<&str> = lines[5].split_whitespace().collect();
    let (Some(price_text), Some(total_text)) = (amounts.first(), amounts.last()) else {
        return Err(line_err(6, "expected '<price> ... <total>'"));
    };
    let price = parse_currency(price_text)
        .map_err(|e| line_err(6, format!("invalid price: {:#}", e)))?;
    let total = parse_currency(total_text)
        .map_err(|e| line_err(6, format!("invalid total: {:#}", e)))?;

    Ok(TradeConfirmation {
        trade_date,
        action: action.to_string(),
        symbol,
        quantity,
        price,
        total,
        commission: Decimal::ZERO,
    })
}

impl TradeConfirmation {
    /// Simple interest on the absolute trade total since the trade date
    pub fn interest(&self, as_of: NaiveDate, rate: Decimal) -> Result<Decimal, BasisError> {
        let days = basis::days_held(self.trade_date, as_of);
        basis::simple_interest(self.total.abs(), days, rate)
    }

    /// Per-share sale price recovering the total plus interest, in cents
    pub fn breakeven(&self, as_of: NaiveDate, rate: Decimal) -> Result<Decimal, BasisError> {
        let interest = self.interest(as_of, rate)?;
        let price = basis::breakeven_price(self.total.abs() + interest, self.quantity)?;
        Ok(price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Append as one row to a trades CSV, writing the header if the file is new
    pub fn append_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), InputError> {
        let path = path.as_ref();
        let is_new = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = WriterBuilder::new().has_headers(is_new).from_writer(file);
        writer
            .serialize(TradeRecord {
                trade_date: self.trade_date.format(DATE_FORMAT).to_string(),
                symbol: &self.symbol,
                action: &self.action,
                quantity: format_quantity(self.quantity),
                price: self.price.normalize().to_string(),
                total: self.total.normalize().to_string(),
                commission: format!("{:.2}", self.commission),
            })
            .map_err(|e| InputError::Validation(format!("failed to write trade record: {}", e)))?;
        writer.flush()?;
        info!("Appended {} {} to {:?}", self.action, self.symbol, path);
        Ok(())
    }
}
