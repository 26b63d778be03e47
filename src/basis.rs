//! Interest-adjusted cost basis
//!
//! Money tied up in a position could have earned a savings-account rate
//! instead. The adjusted cost of a lot is its cost basis plus the interest
//! that money would have accrued, compounded daily; dividing by the share
//! count gives the minimum sale price that beats the savings account.

use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use std::collections::HashMap;

use crate::error::BasisError;
use crate::models::Lot;

const DAYS_PER_YEAR: Decimal = Decimal::from_parts(365, 0, 0, false, 0);

/// Calendar days between purchase and evaluation (negative if purchase is later)
pub fn days_held(purchase_date: NaiveDate, as_of: NaiveDate) -> i64 {
    as_of.signed_duration_since(purchase_date).num_days()
}

/// `principal * ((1 + rate/365)^days - 1)`
pub fn compound_interest(principal: Decimal, days: i64, rate: Decimal) -> Result<Decimal, BasisError> {
    if days < 0 {
        return Err(BasisError::NegativeHoldingPeriod(days));
    }
    let daily = Decimal::ONE + rate / DAYS_PER_YEAR;
    let growth = daily
        .checked_powu(days as u64)
        .ok_or(BasisError::Overflow)?;
    principal
        .checked_mul(growth - Decimal::ONE)
        .ok_or(BasisError::Overflow)
}

/// Cost basis plus daily-compounded interest
pub fn adjusted_cost(principal: Decimal, days: i64, rate: Decimal) -> Result<Decimal, BasisError> {
    Ok(principal + compound_interest(principal, days, rate)?)
}

/// `principal * rate * days / 365`, used for single trade confirmations
pub fn simple_interest(principal: Decimal, days: i64, rate: Decimal) -> Result<Decimal, BasisError> {
    if days < 0 {
        return Err(BasisError::NegativeHoldingPeriod(days));
    }
    Ok(principal * rate * Decimal::from(days) / DAYS_PER_YEAR)
}

/// Adjusted cost spread over the share count
pub fn breakeven_price(adjusted_cost: Decimal, quantity: Decimal) -> Result<Decimal, BasisError> {
    adjusted_cost
        .checked_div(quantity)
        .ok_or(BasisError::ZeroQuantity)
}

/// How per-lot breakeven prices are derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakevenStrategy {
    /// Adjusted cost / quantity
    #[default]
    Standard,
    /// Never below the highest per-share price paid for the same symbol, so a
    /// sale at breakeven is never a loss against any lot.
    WashSaleSafe,
}

/// Per-lot figures at one evaluation date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotBreakeven {
    pub lot: Lot,
    pub days_held: i64,
    pub interest: Decimal,
    pub adjusted_cost: Decimal,
    pub breakeven_price: Decimal,
}

/// Aggregate over a set of lots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakevenTotals {
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub interest: Decimal,
    pub adjusted_cost: Decimal,
    /// Total cost basis / total quantity
    pub average_unit_cost: Decimal,
    /// Total adjusted cost / total quantity (quantity-weighted breakeven)
    pub breakeven_price: Decimal,
}

/// Compute breakeven figures for every lot as of `as_of`.
pub fn compute_breakevens(
    lots: &[Lot],
    as_of: NaiveDate,
    rate: Decimal,
    strategy: BreakevenStrategy,
) -> Result<Vec<LotBreakeven>, BasisError> {
    let mut rows = lots
        .iter()
        .map(|lot| {
            let days = lot.days_held(as_of)?;
            let adjusted = adjusted_cost(lot.cost_basis_total(), days, rate)?;
            Ok(LotBreakeven {
                lot: lot.clone(),
                days_held: days,
                interest: adjusted - lot.cost_basis_total(),
                adjusted_cost: adjusted,
                breakeven_price: breakeven_price(adjusted, lot.quantity())?,
            })
        })
        .collect::<Result<Vec<_>, BasisError>>()?;

    if strategy == BreakevenStrategy::WashSaleSafe {
        let mut highest: HashMap<&str, Decimal> = HashMap::new();
        for lot in lots {
            let entry = highest.entry(lot.symbol()).or_insert(Decimal::ZERO);
            *entry = (*entry).max(lot.unit_cost());
        }
        for row in &mut rows {
            if let Some(floor) = highest.get(row.lot.symbol()) {
                row.breakeven_price = row.breakeven_price.max(*floor);
            }
        }
    }

    Ok(rows)
}

/// Totals row; `None` when there are no lots.
pub fn totals(rows: &[LotBreakeven]) -> Option<BreakevenTotals> {
    if rows.is_empty() {
        return None;
    }
    let quantity: Decimal = rows.iter().map(|r| r.lot.quantity()).sum();
    let cost_basis: Decimal = rows.iter().map(|r| r.lot.cost_basis_total()).sum();
    let interest: Decimal = rows.iter().map(|r| r.interest).sum();
    let adjusted_cost: Decimal = rows.iter().map(|r| r.adjusted_cost).sum();
    Some(BreakevenTotals {
        quantity,
        cost_basis,
        interest,
        adjusted_cost,
        average_unit_cost: cost_basis / quantity,
        breakeven_price: adjusted_cost / quantity,
    })
}
