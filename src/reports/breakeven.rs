//! Per-lot breakeven table with totals and an optional projection to a
//! future disposal date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::{ReportTable, SEPARATOR};
use crate::basis::{self, LotBreakeven};
use crate::utils::{format_currency, format_percent, format_price, format_quantity};

pub const HEADERS: [&str; 9] = [
    "Symbol",
    "Purchase Date",
    "QTY",
    "Cost-Basis",
    "Days-Held",
    "Int-Earned",
    "Cost-Basis+INT",
    "Min. Sell-Price",
    "SPY%",
];

const NOT_AVAILABLE: &str = "N/A";
const PROJECTION_FILL: &str = "=====";
const PROJECTION_LABEL: &str = "=== Projected Future Values ===";

/// The same lots recomputed as of a future disposal date
#[derive(Debug, Clone, Copy)]
pub struct Projection<'a> {
    pub disposal_date: NaiveDate,
    pub rows: &'a [LotBreakeven],
}

/// Build the breakeven table.
///
/// `spy_change` maps purchase dates to the lot's standing against SPY since
/// that date (SPY's percent change, negated); lots without an entry show `N/A`.
pub fn breakeven_table(
    symbol: &str,
    current: &[LotBreakeven],
    spy_change: &HashMap<NaiveDate, Decimal>,
    projection: Option<Projection<'_>>,
) -> ReportTable {
    let mut table = ReportTable::new(HEADERS);

    for row in current {
        let spy = spy_change
            .get(&row.lot.purchase_date())
            .map(|pct| format_percent(*pct))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        table.push_row(lot_row(symbol, row, row.days_held.to_string(), spy));
    }

    if let Some(totals) = basis::totals(current) {
        table.push_separator();
        table.push_row(vec![
            symbol.to_string(),
            "TOTAL".to_string(),
            format_quantity(totals.quantity),
            format_currency(totals.average_unit_cost),
            SEPARATOR.to_string(),
            format_currency(totals.interest),
            format_currency(totals.adjusted_cost),
            format_price(totals.breakeven_price),
            NOT_AVAILABLE.to_string(),
        ]);
    }

    if let Some(projection) = projection {
        push_projection(&mut table, symbol, projection);
    }

    table
}

fn push_projection(table: &mut ReportTable, symbol: &str, projection: Projection<'_>) {
    table.push_filled(PROJECTION_FILL);
    if let Some(last) = table.rows.last_mut() {
        last[1] = PROJECTION_LABEL.to_string();
    }

    for row in projection.rows {
        table.push_row(lot_row(
            symbol,
            row,
            format!("{} (future)", row.days_held),
            NOT_AVAILABLE.to_string(),
        ));
    }

    if let Some(totals) = basis::totals(projection.rows) {
        table.push_separator();
        table.push_row(vec![
            symbol.to_string(),
            format!("FUTURE ({})", projection.disposal_date.format("%Y-%m-%d")),
            format_quantity(totals.quantity),
            format_currency(totals.average_unit_cost),
            SEPARATOR.to_string(),
            format_currency(totals.interest),
            format_currency(totals.adjusted_cost),
            format_price(totals.breakeven_price),
            SEPARATOR.to_string(),
        ]);
    }
}

fn lot_row(symbol: &str, row: &LotBreakeven, days: String, spy: String) -> Vec<String> {
    vec![
        symbol.to_string(),
        row.lot.purchase_date().format("%Y-%m-%d").to_string(),
        format_quantity(row.lot.quantity()),
        format_currency(row.lot.cost_basis_total()),
        days,
        format_currency(row.interest),
        format_currency(row.adjusted_cost),
        format_price(row.breakeven_price),
        spy,
    ]
}
