// Pricing module - price series and the market-data provider seam

pub mod yahoo;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::LookupError;

/// Which close a series carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceBasis {
    /// Split- and dividend-adjusted close
    #[default]
    Adjusted,
    /// Close as traded; pair with dividend events to reinvest manually
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Decimal,
}

/// Cash dividend per share paid on `date`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dividend {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Daily closes for one symbol, ascending by date with no duplicate dates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PriceSeries {
    symbol: String,
    basis: PriceBasis,
    points: Vec<PricePoint>,
    dividends: Vec<Dividend>,
}

impl PriceSeries {
    /// Build a series from points in any order; a later point for a date
    /// already seen replaces the earlier one.
    pub fn new(symbol: impl Into<String>, basis: PriceBasis, mut points: Vec<PricePoint>) -> Self {
        // Stable sort keeps input order within a date, so the last one wins below
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self {
            symbol: symbol.into(),
            basis,
            points: deduped,
            dividends: Vec::new(),
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, PriceBasis::default(), Vec::new())
    }

    pub fn with_dividends(mut self, mut dividends: Vec<Dividend>) -> Self {
        dividends.sort_by_key(|d| d.date);
        self.dividends = dividends;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn basis(&self) -> PriceBasis {
        self.basis
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn dividends(&self) -> &[Dividend] {
        &self.dividends
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// First point dated on or after `date`
    pub fn first_on_or_after(&self, date: NaiveDate) -> Option<&PricePoint> {
        let idx = self.points.partition_point(|p| p.date < date);
        self.points.get(idx)
    }

    /// Last point dated on or before `date`
    pub fn last_on_or_before(&self, date: NaiveDate) -> Option<&PricePoint> {
        let idx = self.points.partition_point(|p| p.date <= date);
        idx.checked_sub(1).and_then(|i| self.points.get(i))
    }

    /// Most recent point
    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Close on an exact date
    pub fn close_on(&self, date: NaiveDate) -> Option<Decimal> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].close)
    }

    /// Points within `[from, to]`
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> &[PricePoint] {
        let start = self.points.partition_point(|p| p.date < from);
        let end = self.points.partition_point(|p| p.date <= to);
        &self.points[start..end.max(start)]
    }
}

/// A source of historical closes.
///
/// Implementations must return an empty series (not an error) for unknown or
/// delisted symbols; errors are reserved for transport and provider faults.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Daily closes for `symbol` between `from` and `to`, inclusive
    async fn history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        basis: PriceBasis,
    ) -> Result<PriceSeries, LookupError>;
}

/// Stand-in used when network access is disabled: knows no symbols.
pub struct OfflineSource;

#[async_trait]
impl PriceSource for OfflineSource {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn history(
        &self,
        symbol: &str,
        _from: NaiveDate,
        _to: NaiveDate,
        basis: PriceBasis,
    ) -> Result<PriceSeries, LookupError> {
        tracing::debug!("Offline mode: no prices for {}", symbol);
        Ok(PriceSeries::new(symbol, basis, Vec::new()))
    }
}
