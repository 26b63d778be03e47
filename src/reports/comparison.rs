//! Tables for benchmark/index comparisons, growth runs and portfolio
//! performance.

use std::collections::HashMap;

use super::ReportTable;
use crate::models::{EvaluationResult, Failure, GrowthResult, YearEndValuation};
use crate::universe::Constituent;
use crate::utils::{format_currency, format_percent, format_quantity};

fn day(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// One row per (symbol, purchase date) result, in the order given
pub fn comparison_table(results: &[EvaluationResult]) -> ReportTable {
    let mut table = ReportTable::new([
        "Symbol",
        "Purchase Date",
        "Investment Amount",
        "Current Value",
        "Percent Change",
    ]);
    for r in results {
        table.push_row(vec![
            r.symbol.clone(),
            day(r.purchase_date),
            format_currency(r.investment_amount),
            format_currency(r.current_value),
            format_percent(r.percent_change),
        ]);
    }
    table
}

/// Terminal failures; a symbol-level failure shows `ALL` as its date
pub fn failure_table(failures: &[Failure]) -> ReportTable {
    let mut table = ReportTable::new(["Symbol", "Date", "Error"]);
    for f in failures {
        table.push_row(vec![
            f.symbol.clone(),
            f.date.map(day).unwrap_or_else(|| "ALL".to_string()),
            f.reason.to_string(),
        ]);
    }
    table
}

/// Growth rows, with security name and sector when the symbol is known
pub fn growth_table(results: &[GrowthResult], constituents: &HashMap<String, Constituent>) -> ReportTable {
    let mut table = ReportTable::new([
        "Symbol",
        "Start Date",
        "End Date",
        "Duration (Days)",
        "Start Price",
        "End Price",
        "Final Value",
        "Nominal % Growth",
        "Dividend Reinvested % Growth",
        "Security",
        "Sector",
    ]);
    for r in results {
        let info = constituents.get(&r.symbol);
        table.push_row(vec![
            r.symbol.clone(),
            day(r.start_date),
            day(r.end_date),
            r.duration_days.to_string(),
            format_currency(r.start_price),
            format_currency(r.end_price),
            format_currency(r.final_value),
            format_percent(r.nominal_growth_pct),
            format_percent(r.dividend_growth_pct),
            info.map(|c| c.security.clone()).unwrap_or_default(),
            info.map(|c| c.sector.clone()).unwrap_or_default(),
        ]);
    }
    table
}

/// Current value of each investment in the portfolio
pub fn performance_table(results: &[EvaluationResult]) -> ReportTable {
    let mut table = ReportTable::new([
        "Symbol",
        "Investment Date",
        "Start Price",
        "Shares Bought",
        "Valuation Date",
        "Latest Price",
        "Initial Investment",
        "Current Value",
        "% Growth",
    ]);
    for r in results {
        table.push_row(vec![
            r.symbol.clone(),
            day(r.purchase_date),
            format_currency(r.purchase_price),
            format_quantity(r.shares.round_dp(4)),
            day(r.valuation_date),
            format_currency(r.current_price),
            format_currency(r.investment_amount),
            format_currency(r.current_value),
            format_percent(r.percent_change),
        ]);
    }
    table
}

pub fn yearly_table(valuations: &[YearEndValuation]) -> ReportTable {
    let mut table = ReportTable::new([
        "Year",
        "Symbol",
        "Valuation Date",
        "Year-End Price",
        "Value at Year-End",
        "% Growth",
    ]);
    for v in valuations {
        table.push_row(vec![
            v.year.to_string(),
            v.symbol.clone(),
            day(v.valuation_date),
            format_currency(v.price),
            format_currency(v.value),
            format_percent(v.growth_pct),
        ]);
    }
    table
}

/// First `n` and last `n` of an already sorted slice (best first). The
/// bottom list runs worst first.
pub fn top_and_bottom<T>(sorted: &[T], n: usize) -> (&[T], Vec<&T>) {
    let top = &sorted[..n.min(sorted.len())];
    let bottom = sorted.iter().rev().take(n).collect();
    (top, bottom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn result(symbol: &str, pct: rust_decimal::Decimal) -> EvaluationResult {
        EvaluationResult {
            symbol: symbol.to_string(),
            purchase_date: date(2024, 1, 2),
            investment_amount: dec!(1000),
            purchase_price: dec!(100),
            current_price: dec!(120),
            valuation_date: date(2025, 1, 2),
            shares: dec!(10),
            current_value: dec!(1000) + dec!(10) * pct,
            percent_change: pct,
        }
    }

    #[test]
    fn test_comparison_rows() {
        let table = comparison_table(&[result("AAPL", dec!(20))]);
        assert_eq!(
            table.rows[0],
            vec!["AAPL", "2024-01-02", "$1,000.00", "$1,200.00", "20.00%"]
        );
    }

    #[test]
    fn test_failure_rows() {
        let table = failure_table(&[
            Failure::for_symbol("ZZZ", LookupError::NoDataForSymbol),
            Failure::for_investment("AAPL", date(2024, 1, 2), LookupError::ZeroInvestment),
        ]);
        assert_eq!(table.rows[0][1], "ALL");
        assert_eq!(table.rows[0][2], "no data returned for symbol");
        assert_eq!(table.rows[1][1], "2024-01-02");
    }

    #[test]
    fn test_performance_rounds_shares() {
        let mut r = result("KO", dec!(5));
        r.shares = dec!(16.666666666);
        let table = performance_table(&[r]);
        assert_eq!(table.rows[0][3], "16.6667");
        assert_eq!(table.rows[0][4], "2025-01-02");
    }

    #[test]
    fn test_top_and_bottom() {
        let sorted = [5, 4, 3, 2, 1];
        let (top, bottom) = top_and_bottom(&sorted, 2);
        assert_eq!(top, &[5, 4]);
        assert_eq!(bottom, vec![&1, &2]);

        let (top, bottom) = top_and_bottom(&sorted, 10);
        assert_eq!(top.len(), 5);
        assert_eq!(bottom.len(), 5);
    }

    #[test]
    fn test_growth_rows_include_constituent_info() {
        let growth = GrowthResult {
            symbol: "KO".to_string(),
            start_date: date(2024, 1, 2),
            end_date: date(2024, 12, 31),
            duration_days: 364,
            start_price: dec!(50),
            end_price: dec!(60),
            final_value: dec!(1320),
            nominal_growth_pct: dec!(20),
            dividend_growth_pct: dec!(32),
            requested_start: date(2024, 1, 1),
        };
        let info = HashMap::from([(
            "KO".to_string(),
            Constituent {
                symbol: "KO".to_string(),
                security: "Coca-Cola Company (The)".to_string(),
                sector: "Consumer Staples".to_string(),
            },
        )]);
        let table = growth_table(&[growth], &info);
        assert_eq!(table.rows[0][8], "32.00%");
        assert_eq!(table.rows[0][10], "Consumer Staples");
    }
}
