//! `breakeven growth`: how a fixed amount would have grown in every S&P 500
//! constituent, with and without reinvested dividends.

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use tracing::info;

use super::App;
use crate::cli::formatters::{format_info, format_saved, format_section, format_warning};
use crate::error::InputError;
use crate::evaluator;
use crate::models::{GrowthResult, Investment};
use crate::pricing::{PriceBasis, PriceSeries};
use crate::reports::{failure_table, growth_table, top_and_bottom};
use crate::ui::progress::{ProgressEvent, ProgressPrinter};
use crate::ui::Prompter;
use crate::universe::{self, Constituent};
use crate::utils::{clean_amount, parse_date};

const DEFAULT_START: &str = "2024-02-29";
const DEFAULT_END: &str = "2025-05-07";
const DEFAULT_AMOUNT: &str = "1000";
/// Extra days fetched past the end date so a holiday end still has a close
const FETCH_SLACK_DAYS: i64 = 5;
const TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
struct GrowthRequest {
    start: NaiveDate,
    end: NaiveDate,
    amount: Decimal,
}

fn resolve_request<R: BufRead, W: Write>(
    start: Option<String>,
    end: Option<String>,
    amount: Option<String>,
    prompter: &mut Prompter<R, W>,
) -> Result<GrowthRequest> {
    let mut value = |given: Option<String>, label: &str, default: &str| -> Result<String> {
        match given {
            Some(v) => Ok(v),
            None => prompter.ask_or(&format!("Enter {} [default: {}]: ", label, default), default),
        }
    };
    let start = parse_date(&value(start, "start date (YYYY-MM-DD)", DEFAULT_START)?)?;
    let end = parse_date(&value(end, "end date (YYYY-MM-DD)", DEFAULT_END)?)?;
    let amount_text = value(amount, "amount to invest", DEFAULT_AMOUNT)?;
    let amount = clean_amount(&amount_text)
        .map_err(|_| InputError::Validation(format!("invalid amount '{}'", amount_text.trim())))?;

    if start >= end {
        return Err(InputError::Validation(format!(
            "start date {} must be before end date {}",
            start, end
        ))
        .into());
    }
    if amount <= Decimal::ZERO {
        return Err(InputError::Validation("amount must be positive".to_string()).into());
    }
    Ok(GrowthRequest { start, end, amount })
}

pub async fn dispatch_growth<R: BufRead, W: Write>(
    app: &App,
    start: Option<String>,
    end: Option<String>,
    amount: Option<String>,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let request = resolve_request(start, end, amount, prompter)?;

    let constituents =
        match universe::load(&app.config.universe, &app.config.provider, !app.offline).await {
            Ok(list) => list,
            Err(e) => {
                println!(
                    "{}",
                    format_warning(&format!("S&P 500 list unavailable: {:#}", e))
                );
                return Ok(());
            }
        };
    let symbols: Vec<String> = constituents.iter().map(|c| c.symbol.clone()).collect();
    let info_by_symbol: HashMap<String, Constituent> = constituents
        .into_iter()
        .map(|c| (c.symbol.clone(), c))
        .collect();

    info!(
        "Growth of {} from {} to {} across {} symbols",
        request.amount,
        request.start,
        request.end,
        symbols.len()
    );
    println!(
        "{}",
        format_info(&format!(
            "Growth of {} invested {} to {} across {} S&P 500 symbols...",
            request.amount,
            request.start,
            request.end,
            symbols.len()
        ))
    );

    let end = request.end;
    let investment = Investment::new(request.start, request.amount);
    let mut printer = ProgressPrinter::new(app.show_progress);
    let mut batch = app
        .comparator()
        .with_basis(PriceBasis::Raw)
        .compare(
            &symbols,
            &[investment],
            end + Duration::days(FETCH_SLACK_DAYS),
            move |inv: &Investment, series: &PriceSeries| {
                evaluator::growth_with_dividends(inv, end, series)
            },
            &mut |event: &ProgressEvent| printer.handle_event(event),
        )
        .await;
    printer.finish();

    sort_by_dividend_growth(&mut batch.results);

    if batch.results.is_empty() {
        println!("{}", format_info("No growth results."));
    } else {
        let (top, bottom) = top_and_bottom(&batch.results, TOP_N);
        let bottom: Vec<GrowthResult> = bottom.into_iter().cloned().collect();
        println!(
            "{}",
            format_section(
                &format!("Top {} by dividend-reinvested growth", top.len()),
                &growth_table(top, &info_by_symbol)
            )
        );
        println!(
            "{}",
            format_section(
                &format!("Bottom {} by dividend-reinvested growth", bottom.len()),
                &growth_table(&bottom, &info_by_symbol)
            )
        );
    }

    let path = app.report_path("sp500_growth_comparison");
    growth_table(&batch.results, &info_by_symbol).write_csv(std::fs::File::create(&path)?)?;
    println!("{}", format_saved("Growth comparison", &path));

    if !batch.failures.is_empty() {
        let path = app.report_path("sp500_failed_fetches");
        failure_table(&batch.failures).write_csv(std::fs::File::create(&path)?)?;
        println!(
            "{}",
            format_warning(&format!("{} symbols failed after retry", batch.failures.len()))
        );
        println!("{}", format_saved("Failed lookups", &path));
    }
    Ok(())
}

fn sort_by_dividend_growth(results: &mut [GrowthResult]) {
    results.sort_by(|a, b| b.dividend_growth_pct.cmp(&a.dividend_growth_pct));
}
