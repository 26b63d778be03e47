//! Error handling for breakeven
//!
//! Typed errors for the places where callers must branch on the failure kind
//! (price lookups, cost-basis math, input validation), plus a unified Result
//! type using anyhow for context chaining in the command layer.

use chrono::NaiveDate;
use thiserror::Error;

/// Why a single symbol (or symbol/lot pair) could not be evaluated.
///
/// These never abort a batch; they are recorded as [`crate::models::Failure`]s.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no data returned for symbol")]
    NoDataForSymbol,

    #[error("no price available on or after {0}")]
    NoPriceOnOrAfterPurchase(NaiveDate),

    #[error("no price available on or before {0}")]
    NoPriceOnOrBefore(NaiveDate),

    #[error("non-positive price on {0}")]
    InvalidPrice(NaiveDate),

    #[error("investment amount is zero")]
    ZeroInvestment,

    #[error("provider error: {0}")]
    Provider(String),
}

/// Cost-basis arithmetic preconditions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BasisError {
    #[error("holding period is negative ({0} days); purchase date is after the evaluation date")]
    NegativeHoldingPeriod(i64),

    #[error("interest computation overflowed")]
    Overflow,

    #[error("quantity must be positive")]
    ZeroQuantity,
}

/// Input errors: reported to the user, abort only the current run
#[derive(Error, Debug)]
pub enum InputError {
    #[error("file '{0}' not found")]
    FileNotFound(String),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;
