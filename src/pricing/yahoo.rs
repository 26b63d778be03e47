use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{Dividend, PriceBasis, PricePoint, PriceSeries, PriceSource};
use crate::config::ProviderConfig;
use crate::error::LookupError;

/// Yahoo Finance chart response
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Meta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
    events: Option<Events>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct Events {
    #[serde(default)]
    dividends: Option<HashMap<String, DividendEvent>>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: Option<String>,
}

/// Yahoo uses dashes where exchanges use dots in share classes (BRK.B → BRK-B)
pub fn provider_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase().replace('.', "-")
}

/// Historical closes from the Yahoo Finance chart endpoint
pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> Result<String, LookupError> {
        // Convert dates to Unix timestamps
        let from_timestamp = from
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| LookupError::Provider("invalid from date".to_string()))?
            .and_utc()
            .timestamp();

        let to_timestamp = to
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| LookupError::Provider("invalid to date".to_string()))?
            .and_utc()
            .timestamp();

        Ok(format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=div",
            self.base_url,
            provider_symbol(symbol),
            from_timestamp,
            to_timestamp
        ))
    }
}

#[async_trait]
impl PriceSource for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        basis: PriceBasis,
    ) -> Result<PriceSeries, LookupError> {
        let url = self.chart_url(symbol, from, to)?;
        info!("Fetching historical prices for {} from {} to {}", symbol, from, to);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LookupError::Provider(format!("request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("Yahoo Finance does not know {}", symbol);
            return Ok(PriceSeries::new(symbol, basis, Vec::new()));
        }
        if !status.is_success() {
            return Err(LookupError::Provider(format!(
                "Yahoo Finance returned error status: {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Provider(format!("failed reading response: {}", e)))?;

        parse_chart_response(symbol, basis, &body)
    }
}

/// Turn a chart response body into a series.
///
/// Rows with a missing close (halted days, the in-progress session) are
/// dropped rather than failing the whole series.
pub fn parse_chart_response(
    symbol: &str,
    basis: PriceBasis,
    body: &str,
) -> Result<PriceSeries, LookupError> {
    let data: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| LookupError::Provider(format!("failed to parse Yahoo Finance response: {}", e)))?;

    if let Some(error) = data.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Ok(PriceSeries::new(symbol, basis, Vec::new()));
        }
        return Err(LookupError::Provider(format!(
            "Yahoo Finance API error: {} - {}",
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    let Some(result) = data.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceSeries::new(symbol, basis, Vec::new()));
    };

    let offset = result.meta.gmtoffset.unwrap_or(0);
    let to_date = |ts: i64| DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive());

    let timestamps = result.timestamp.unwrap_or_default();
    let raw_closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .and_then(|q| q.close)
        .unwrap_or_default();
    let adjusted_closes = result
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .and_then(|a| a.adjclose);

    let closes = match (basis, adjusted_closes) {
        (PriceBasis::Adjusted, Some(adj)) => adj,
        (PriceBasis::Adjusted, None) => {
            warn!("No adjusted closes for {}, falling back to raw closes", symbol);
            raw_closes
        }
        (PriceBasis::Raw, _) => raw_closes,
    };

    let mut points = Vec::with_capacity(timestamps.len());
    for (i, &timestamp) in timestamps.iter().enumerate() {
        let Some(date) = to_date(timestamp) else {
            continue;
        };
        let Some(close) = closes.get(i).copied().flatten().and_then(to_decimal) else {
            continue;
        };
        points.push(PricePoint { date, close });
    }

    let dividends = result
        .events
        .and_then(|e| e.dividends)
        .map(|divs| {
            divs.into_values()
                .filter_map(|d| {
                    Some(Dividend {
                        date: to_date(d.date)?,
                        amount: to_decimal(d.amount)?,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    debug!("Fetched {} historical prices for {}", points.len(), symbol);
    Ok(PriceSeries::new(symbol, basis, points).with_dividends(dividends))
}

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64_retain(value).map(|d| d.round_dp(6))
}
