//! Lot evaluation against a price series
//!
//! Pure functions: the caller fetches the series, these only do arithmetic.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::error::LookupError;
use crate::models::{EvaluationResult, GrowthResult, Investment, YearEndValuation};
use crate::pricing::{PricePoint, PriceSeries};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Value `investment` as if it had bought `series.symbol()` instead.
///
/// Purchase price is the first close on or after the purchase date; the
/// current price is the last close in the series.
pub fn evaluate(
    investment: &Investment,
    series: &PriceSeries,
) -> Result<EvaluationResult, LookupError> {
    if series.is_empty() {
        return Err(LookupError::NoDataForSymbol);
    }

    let purchase = series
        .first_on_or_after(investment.purchase_date)
        .ok_or(LookupError::NoPriceOnOrAfterPurchase(investment.purchase_date))?;
    let current = series.latest().ok_or(LookupError::NoDataForSymbol)?;
    check_price(purchase)?;

    let amount = investment.amount;
    let shares = amount / purchase.close;
    let current_value = shares * current.close;
    let percent_change = percent_growth(current_value, amount)?;

    Ok(EvaluationResult {
        symbol: series.symbol().to_string(),
        purchase_date: investment.purchase_date,
        investment_amount: amount,
        purchase_price: purchase.close,
        current_price: current.close,
        valuation_date: current.date,
        shares,
        current_value,
        percent_change,
    })
}

/// Percent change of a symbol's own price since `date` (no investment amount)
pub fn price_change_since(series: &PriceSeries, date: NaiveDate) -> Result<Decimal, LookupError> {
    if series.is_empty() {
        return Err(LookupError::NoDataForSymbol);
    }
    let start = series
        .first_on_or_after(date)
        .ok_or(LookupError::NoPriceOnOrAfterPurchase(date))?;
    check_price(start)?;
    let current = series.latest().ok_or(LookupError::NoDataForSymbol)?;
    Ok((current.close - start.close) / start.close * HUNDRED)
}

/// Growth between the first close on/after the investment date and the last
/// close on/before `end_date`, with and without dividend reinvestment.
///
/// Expects a [`crate::pricing::PriceBasis::Raw`] series: dividends are
/// reinvested at each ex-date close, which would double count on an adjusted
/// series.
pub fn growth_with_dividends(
    investment: &Investment,
    end_date: NaiveDate,
    series: &PriceSeries,
) -> Result<GrowthResult, LookupError> {
    if series.is_empty() {
        return Err(LookupError::NoDataForSymbol);
    }

    let start = series
        .first_on_or_after(investment.purchase_date)
        .ok_or(LookupError::NoPriceOnOrAfterPurchase(investment.purchase_date))?;
    let end = series
        .last_on_or_before(end_date)
        .filter(|p| p.date >= start.date)
        .ok_or(LookupError::NoPriceOnOrBefore(end_date))?;
    check_price(start)?;

    let amount = investment.amount;
    let nominal_growth_pct = (end.close - start.close) / start.close * HUNDRED;

    let mut units = amount / start.close;
    for dividend in series.dividends() {
        if dividend.date < start.date || dividend.date > end.date || dividend.amount <= Decimal::ZERO {
            continue;
        }
        // Reinvest at that day's close; skip dividends paid on non-trading days
        if let Some(price) = series.close_on(dividend.date).filter(|p| *p > Decimal::ZERO) {
            units += units * dividend.amount / price;
        }
    }

    let final_value = units * end.close;
    let dividend_growth_pct = percent_growth(final_value, amount)?;

    Ok(GrowthResult {
        symbol: series.symbol().to_string(),
        start_date: start.date,
        end_date: end.date,
        duration_days: end.date.signed_duration_since(start.date).num_days(),
        start_price: start.close,
        end_price: end.close,
        final_value,
        nominal_growth_pct,
        dividend_growth_pct,
        requested_start: investment.purchase_date,
    })
}

/// Year-end values for every completed year since the investment.
///
/// The year of `as_of` counts only when `as_of` is December 31. Years with no
/// close between Dec 20 and Dec 31 are skipped.
pub fn year_end_valuations(
    investment: &Investment,
    series: &PriceSeries,
    as_of: NaiveDate,
) -> Result<Vec<YearEndValuation>, LookupError> {
    let purchase = evaluate(investment, series)?;
    let last_year = if as_of.month() == 12 && as_of.day() == 31 {
        as_of.year()
    } else {
        as_of.year() - 1
    };

    let mut valuations = Vec::new();
    for year in investment.purchase_date.year()..=last_year {
        let (Some(window_start), Some(window_end)) = (
            NaiveDate::from_ymd_opt(year, 12, 20),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            continue;
        };
        let Some(point) = series.between(window_start, window_end).last() else {
            continue;
        };
        let value = purchase.shares * point.close;
        valuations.push(YearEndValuation {
            year,
            symbol: purchase.symbol.clone(),
            valuation_date: point.date,
            price: point.close,
            value,
            growth_pct: percent_growth(value, investment.amount)?,
        });
    }
    Ok(valuations)
}

fn check_price(point: &PricePoint) -> Result<(), LookupError> {
    if point.close <= Decimal::ZERO {
        return Err(LookupError::InvalidPrice(point.date));
    }
    Ok(())
}

fn percent_growth(value: Decimal, amount: Decimal) -> Result<Decimal, LookupError> {
    if amount.is_zero() {
        return Err(LookupError::ZeroInvestment);
    }
    Ok((value - amount) / amount * HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{Dividend, PriceBasis};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(points: &[(NaiveDate, Decimal)]) -> PriceSeries {
        PriceSeries::new(
            "SPY",
            PriceBasis::Adjusted,
            points
                .iter()
                .map(|&(date, close)| PricePoint { date, close })
                .collect(),
        )
    }

    #[test]
    fn test_ten_shares_up_twenty_percent() {
        let s = series(&[
            (date(2024, 1, 2), dec!(100)),
            (date(2024, 6, 3), dec!(110)),
            (date(2025, 1, 2), dec!(120)),
        ]);
        let result = evaluate(&Investment::new(date(2024, 1, 1), dec!(1000)), &s).unwrap();
        assert_eq!(result.purchase_price, dec!(100));
        assert_eq!(result.shares, dec!(10));
        assert_eq!(result.current_value, dec!(1200));
        assert_eq!(result.percent_change, dec!(20));
        assert_eq!(result.symbol, "SPY");
        assert_eq!(result.valuation_date, date(2025, 1, 2));
    }

    #[test]
    fn test_exact_formula_for_awkward_prices() {
        for (p, c, a) in [
            (dec!(3), dec!(7), dec!(1000)),
            (dec!(123.45), dec!(98.76), dec!(2500.50)),
            (dec!(0.37), dec!(1.11), dec!(10)),
        ] {
            let s = series(&[(date(2024, 3, 1), p), (date(2024, 9, 1), c)]);
            let result = evaluate(&Investment::new(date(2024, 3, 1), a), &s).unwrap();
            let expected_value = (a / p) * c;
            assert_eq!(result.current_value, expected_value);
            assert_eq!(result.percent_change, (expected_value - a) / a * dec!(100));
        }
    }

    #[test]
    fn test_empty_series_is_no_data() {
        let s = series(&[]);
        assert_eq!(
            evaluate(&Investment::new(date(2024, 1, 1), dec!(1)), &s),
            Err(LookupError::NoDataForSymbol)
        );
    }

    #[test]
    fn test_no_price_after_purchase() {
        let s = series(&[(date(2024, 1, 2), dec!(100))]);
        assert_eq!(
            evaluate(&Investment::new(date(2024, 1, 3), dec!(1)), &s),
            Err(LookupError::NoPriceOnOrAfterPurchase(date(2024, 1, 3)))
        );
    }

    #[test]
    fn test_zero_price_and_zero_amount_are_failures() {
        let s = series(&[(date(2024, 1, 2), dec!(0)), (date(2024, 1, 3), dec!(5))]);
        assert_eq!(
            evaluate(&Investment::new(date(2024, 1, 2), dec!(100)), &s),
            Err(LookupError::InvalidPrice(date(2024, 1, 2)))
        );
        let s = series(&[(date(2024, 1, 2), dec!(4)), (date(2024, 1, 3), dec!(5))]);
        assert_eq!(
            evaluate(&Investment::new(date(2024, 1, 2), dec!(0)), &s),
            Err(LookupError::ZeroInvestment)
        );
    }

    #[test]
    fn test_price_change_since() {
        let s = series(&[(date(2024, 1, 2), dec!(400)), (date(2024, 12, 31), dec!(500))]);
        assert_eq!(price_change_since(&s, date(2024, 1, 1)).unwrap(), dec!(25));
    }

    #[test]
    fn test_growth_reinvests_dividends() {
        let s = PriceSeries::new(
            "KO",
            PriceBasis::Raw,
            vec![
                PricePoint { date: date(2024, 1, 2), close: dec!(50) },
                PricePoint { date: date(2024, 6, 14), close: dec!(50) },
                PricePoint { date: date(2024, 12, 31), close: dec!(60) },
                PricePoint { date: date(2025, 1, 6), close: dec!(80) },
            ],
        )
        .with_dividends(vec![
            Dividend { date: date(2024, 6, 14), amount: dec!(5) },
            // After the end date: ignored
            Dividend { date: date(2025, 1, 6), amount: dec!(5) },
        ]);

        let growth =
            growth_with_dividends(&Investment::new(date(2024, 1, 1), dec!(1000)), date(2025, 1, 1), &s)
                .unwrap();
        assert_eq!(growth.start_date, date(2024, 1, 2));
        assert_eq!(growth.end_date, date(2024, 12, 31));
        assert_eq!(growth.duration_days, 364);
        assert_eq!(growth.nominal_growth_pct, dec!(20));
        // 20 units + 20 * 5 / 50 = 22 units at 60
        assert_eq!(growth.final_value, dec!(1320));
        assert_eq!(growth.dividend_growth_pct, dec!(32));
    }

    #[test]
    fn test_growth_needs_end_price_after_start() {
        let s = series(&[(date(2024, 5, 1), dec!(10))]);
        assert_eq!(
            growth_with_dividends(&Investment::new(date(2024, 4, 1), dec!(10)), date(2024, 4, 15), &s),
            Err(LookupError::NoPriceOnOrBefore(date(2024, 4, 15)))
        );
    }

    #[test]
    fn test_year_end_valuations_skip_current_year() {
        let s = series(&[
            (date(2022, 3, 1), dec!(10)),
            (date(2022, 12, 30), dec!(12)),
            (date(2023, 12, 29), dec!(15)),
            (date(2024, 12, 31), dec!(20)),
        ]);
        let investment = Investment::new(date(2022, 3, 1), dec!(100));

        let mid_year = year_end_valuations(&investment, &s, date(2024, 7, 1)).unwrap();
        assert_eq!(mid_year.len(), 2);
        assert_eq!(mid_year[0].year, 2022);
        assert_eq!(mid_year[0].value, dec!(120));
        assert_eq!(mid_year[1].valuation_date, date(2023, 12, 29));
        assert_eq!(mid_year[1].growth_pct, dec!(50));

        let year_end = year_end_valuations(&investment, &s, date(2024, 12, 31)).unwrap();
        assert_eq!(year_end.len(), 3);
        assert_eq!(year_end[2].value, dec!(200));
    }
}
