//! Core records shared by the importers, the evaluator and the reports.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{BasisError, LookupError};

/// A single purchase record.
///
/// Fields are private so the invariants checked in [`Lot::new`] hold for the
/// lifetime of the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    symbol: String,
    purchase_date: NaiveDate,
    quantity: Decimal,
    cost_basis_total: Decimal,
}

impl Lot {
    /// Create a lot. Quantity must be positive and cost basis non-negative.
    pub fn new(
        symbol: impl Into<String>,
        purchase_date: NaiveDate,
        quantity: Decimal,
        cost_basis_total: Decimal,
    ) -> Result<Self, String> {
        if quantity <= Decimal::ZERO {
            return Err(format!("quantity must be positive, got {}", quantity));
        }
        if cost_basis_total < Decimal::ZERO {
            return Err(format!(
                "cost basis must not be negative, got {}",
                cost_basis_total
            ));
        }
        Ok(Self {
            symbol: symbol.into().trim().to_uppercase(),
            purchase_date,
            quantity,
            cost_basis_total,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn purchase_date(&self) -> NaiveDate {
        self.purchase_date
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn cost_basis_total(&self) -> Decimal {
        self.cost_basis_total
    }

    /// Cost basis per share
    pub fn unit_cost(&self) -> Decimal {
        self.cost_basis_total / self.quantity
    }

    /// The amount this lot put to work on its purchase date
    pub fn investment(&self) -> Investment {
        Investment {
            purchase_date: self.purchase_date,
            amount: self.cost_basis_total,
        }
    }

    /// Holding period up to `as_of`; errors if the lot was bought after it.
    pub fn days_held(&self, as_of: NaiveDate) -> Result<i64, BasisError> {
        let days = crate::basis::days_held(self.purchase_date, as_of);
        if days < 0 {
            return Err(BasisError::NegativeHoldingPeriod(days));
        }
        Ok(days)
    }
}

/// A sum of money put into a symbol on a given date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Investment {
    pub purchase_date: NaiveDate,
    pub amount: Decimal,
}

impl Investment {
    pub fn new(purchase_date: NaiveDate, amount: Decimal) -> Self {
        Self {
            purchase_date,
            amount,
        }
    }
}

/// Outcome of evaluating one investment against one symbol's price series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    pub symbol: String,
    pub purchase_date: NaiveDate,
    pub investment_amount: Decimal,
    pub purchase_price: Decimal,
    pub current_price: Decimal,
    /// Date of `current_price`
    pub valuation_date: NaiveDate,
    pub shares: Decimal,
    pub current_value: Decimal,
    pub percent_change: Decimal,
}

/// Anything the bulk comparator can key by (symbol, purchase date)
pub trait Keyed {
    fn symbol(&self) -> &str;
    fn key_date(&self) -> NaiveDate;
}

impl Keyed for EvaluationResult {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn key_date(&self) -> NaiveDate {
        self.purchase_date
    }
}

/// A lookup or computation that could not produce a result.
///
/// `date` is `None` when the symbol-level lookup failed, which covers every
/// investment evaluated against that symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub symbol: String,
    pub date: Option<NaiveDate>,
    pub reason: LookupError,
}

impl Failure {
    pub fn for_symbol(symbol: impl Into<String>, reason: LookupError) -> Self {
        Self {
            symbol: symbol.into(),
            date: None,
            reason,
        }
    }

    pub fn for_investment(symbol: impl Into<String>, date: NaiveDate, reason: LookupError) -> Self {
        Self {
            symbol: symbol.into(),
            date: Some(date),
            reason,
        }
    }

    /// Whether this failure covers the investment made on `date`
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.date.map_or(true, |d| d == date)
    }
}

/// Growth of an investment between two dates, with and without reinvesting
/// dividends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrowthResult {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: i64,
    pub start_price: Decimal,
    pub end_price: Decimal,
    pub final_value: Decimal,
    pub nominal_growth_pct: Decimal,
    pub dividend_growth_pct: Decimal,
    /// Requested start date; the key used for retries
    pub requested_start: NaiveDate,
}

impl Keyed for GrowthResult {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn key_date(&self) -> NaiveDate {
        self.requested_start
    }
}

/// Value of an investment at the last trading day of a completed year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearEndValuation {
    pub year: i32,
    pub symbol: String,
    pub valuation_date: NaiveDate,
    pub price: Decimal,
    pub value: Decimal,
    pub growth_pct: Decimal,
}
