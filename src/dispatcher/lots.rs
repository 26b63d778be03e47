//! `breakeven lots`: per-lot breakeven prices, benchmarks, and the optional
//! S&P 500 comparison.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use tracing::{info, warn};

use super::{basis_error, required, App};
use crate::basis::{compute_breakevens, BreakevenStrategy};
use crate::cli::formatters::{format_info, format_saved, format_section, format_warning};
use crate::error::{InputError, LookupError};
use crate::evaluator;
use crate::importers::{parse_lots, read_input};
use crate::models::{EvaluationResult, Failure, Lot};
use crate::pricing::{PriceBasis, PriceSeries};
use crate::reports::{
    breakeven_table, comparison_table, failure_table, top_and_bottom, CsvReport, Projection,
};
use crate::ui::progress::{ProgressEvent, ProgressPrinter};
use crate::ui::Prompter;
use crate::universe;
use crate::utils::parse_date;

const INPUT_PROMPT: &str = "Enter the name of the input file (e.g., input.txt): ";
const SYMBOL_PROMPT: &str = "Enter the stock/ETF symbol to analyze: ";
const BENCHMARK_PROMPT: &str =
    "Enter one or more benchmark symbols (comma-separated). SPY will always be included: ";
const SP500_PROMPT: &str =
    "Would you like to compare your investments against all S&P 500 stocks? (y/n): ";

const SPY: &str = "SPY";
const TOP_N: usize = 10;

/// Lots command arguments; `None` means ask
#[derive(Debug, Clone, Default)]
pub struct LotsOptions {
    pub input: Option<String>,
    pub symbol: Option<String>,
    pub disposal: Option<String>,
    pub benchmarks: Option<Vec<String>>,
    pub sp500: Option<bool>,
    pub wash_sale_safe: bool,
}

pub async fn dispatch_lots<R: BufRead, W: Write>(
    app: &App,
    options: LotsOptions,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let input = required(options.input, prompter, INPUT_PROMPT, "input file")?;
    let content = read_input(&input)?;
    let symbol = required(options.symbol, prompter, SYMBOL_PROMPT, "symbol")?.to_uppercase();

    let lots = parse_lots(&content, &symbol)?;
    if lots.is_empty() {
        return Err(InputError::Validation(format!("no lots found in '{}'", input)).into());
    }
    info!("Loaded {} lots of {} from {}", lots.len(), symbol, input);

    let disposal = disposal_date(app.as_of, options.disposal, prompter)?;
    let strategy = if options.wash_sale_safe {
        BreakevenStrategy::WashSaleSafe
    } else {
        BreakevenStrategy::Standard
    };
    let rate = app.config.savings_rate;
    let current = compute_breakevens(&lots, app.as_of, rate, strategy).map_err(basis_error)?;
    let future = compute_breakevens(&lots, disposal, rate, strategy).map_err(basis_error)?;

    let extra = match options.benchmarks {
        Some(list) => list,
        None => prompter
            .ask(BENCHMARK_PROMPT)?
            .map(|answer| answer.split(',').map(str::to_string).collect())
            .unwrap_or_default(),
    };
    let benchmarks = benchmark_symbols(&extra);

    let earliest = earliest_purchase(&lots);
    let mut spy_change = HashMap::new();
    let mut bench_results = Vec::new();
    let mut bench_failures = Vec::new();
    for benchmark in &benchmarks {
        let series = match fetch_series(app, benchmark, earliest).await {
            Ok(series) => series,
            Err(failure) => {
                bench_failures.push(failure);
                continue;
            }
        };
        if benchmark == SPY {
            spy_change = spy_changes(&lots, &series);
        }
        for lot in &lots {
            match evaluator::evaluate(&lot.investment(), &series) {
                Ok(result) => bench_results.push(result),
                Err(reason) => bench_failures.push(Failure::for_investment(
                    benchmark.as_str(),
                    lot.purchase_date(),
                    reason,
                )),
            }
        }
    }

    let table = breakeven_table(
        &symbol,
        &current,
        &spy_change,
        Some(Projection {
            disposal_date: disposal,
            rows: &future,
        }),
    );
    println!(
        "{}",
        format_section(
            &format!("Breakeven prices for {} as of {}", symbol, app.as_of),
            &table
        )
    );

    let bench_table = comparison_table(&bench_results);
    let benchmarks_title = format!("Benchmarks used: {}", benchmarks.join(", "));
    if bench_table.is_empty() {
        println!("{}", format_info(&format!("{} (no benchmark data)", benchmarks_title)));
    } else {
        println!("{}", format_section(&benchmarks_title, &bench_table));
    }
    for failure in &bench_failures {
        println!("{}", format_warning(&failure_message(failure)));
    }

    let path = app.report_path("breakeven_output");
    CsvReport::new(&table)
        .section(benchmarks_title, &bench_table)
        .save(&path)?;
    println!("{}", format_saved("Breakeven report", &path));

    let run_index = match options.sp500 {
        Some(choice) => choice,
        None => prompter.confirm(SP500_PROMPT)?,
    };
    if run_index {
        compare_with_index(app, &lots).await?;
    }

    Ok(())
}

/// Disposal date from the argument or prompt; defaults to Dec 31 of the
/// evaluation year and must not precede the evaluation date.
fn disposal_date<R: BufRead, W: Write>(
    as_of: NaiveDate,
    given: Option<String>,
    prompter: &mut Prompter<R, W>,
) -> Result<NaiveDate> {
    let default = NaiveDate::from_ymd_opt(as_of.year(), 12, 31).unwrap_or(as_of);
    let text = match given {
        Some(text) => text,
        None => prompter.ask_or(
            &format!(
                "Enter a future disposal date (YYYY-MM-DD) [default: {}]: ",
                default
            ),
            &default.to_string(),
        )?,
    };
    let date = parse_date(&text)?;
    if date < as_of {
        return Err(InputError::Validation(format!(
            "disposal date {} is before the evaluation date {}",
            date, as_of
        ))
        .into());
    }
    Ok(date)
}

/// SPY first, then the extra symbols, uppercased and without repeats
fn benchmark_symbols(extra: &[String]) -> Vec<String> {
    std::iter::once(SPY.to_string())
        .chain(extra.iter().map(|s| s.trim().to_uppercase()))
        .filter(|s| !s.is_empty())
        .unique()
        .collect()
}

fn earliest_purchase(lots: &[Lot]) -> NaiveDate {
    lots.iter()
        .map(Lot::purchase_date)
        .min()
        .unwrap_or(NaiveDate::MIN)
}

async fn fetch_series(app: &App, symbol: &str, from: NaiveDate) -> Result<PriceSeries, Failure> {
    match app
        .source
        .history(symbol, from, app.as_of, PriceBasis::Adjusted)
        .await
    {
        Ok(series) if series.is_empty() => {
            Err(Failure::for_symbol(symbol, LookupError::NoDataForSymbol))
        }
        Ok(series) => Ok(series),
        Err(reason) => {
            warn!("Benchmark lookup for {} failed: {}", symbol, reason);
            Err(Failure::for_symbol(symbol, reason))
        }
    }
}

/// Negated SPY percent change since each distinct purchase date
fn spy_changes(lots: &[Lot], spy: &PriceSeries) -> HashMap<NaiveDate, Decimal> {
    lots.iter()
        .map(Lot::purchase_date)
        .unique()
        .filter_map(|date| {
            evaluator::price_change_since(spy, date)
                .ok()
                .map(|pct| (date, -pct))
        })
        .collect()
}

fn failure_message(failure: &Failure) -> String {
    match failure.date {
        Some(date) => format!("{} ({}): {}", failure.symbol, date, failure.reason),
        None => format!("{}: {}", failure.symbol, failure.reason),
    }
}

async fn compare_with_index(app: &App, lots: &[Lot]) -> Result<()> {
    let constituents =
        match universe::load(&app.config.universe, &app.config.provider, !app.offline).await {
            Ok(list) => list,
            Err(e) => {
                println!(
                    "{}",
                    format_warning(&format!("S&P 500 comparison skipped: {:#}", e))
                );
                return Ok(());
            }
        };
    let symbols: Vec<String> = constituents.into_iter().map(|c| c.symbol).collect();
    let investments: Vec<_> = lots.iter().map(Lot::investment).collect();

    println!(
        "{}",
        format_info(&format!(
            "Comparing {} lots against {} S&P 500 symbols...",
            lots.len(),
            symbols.len()
        ))
    );
    let mut printer = ProgressPrinter::new(app.show_progress);
    let batch = app
        .comparator()
        .compare_investments(&symbols, &investments, app.as_of, &mut |event: &ProgressEvent| {
            printer.handle_event(event)
        })
        .await;
    printer.finish();

    print_top_and_bottom(&batch.results);

    let path = app.report_path("sp500_comparison");
    comparison_table(&batch.results).write_csv(std::fs::File::create(&path)?)?;
    println!("{}", format_saved("S&P 500 comparison", &path));

    if !batch.failures.is_empty() {
        let path = app.report_path("sp500_failed_final");
        failure_table(&batch.failures).write_csv(std::fs::File::create(&path)?)?;
        println!(
            "{}",
            format_warning(&format!(
                "{} comparisons failed after retry",
                batch.failures.len()
            ))
        );
        println!("{}", format_saved("Failed lookups", &path));
    }
    Ok(())
}

fn print_top_and_bottom(sorted: &[EvaluationResult]) {
    if sorted.is_empty() {
        println!("{}", format_info("No S&P 500 comparison results."));
        return;
    }
    let (top, bottom) = top_and_bottom(sorted, TOP_N);
    let bottom: Vec<EvaluationResult> = bottom.into_iter().cloned().collect();
    println!(
        "{}",
        format_section(&format!("Top {} performers", top.len()), &comparison_table(top))
    );
    println!(
        "{}",
        format_section(
            &format!("Bottom {} performers", bottom.len()),
            &comparison_table(&bottom)
        )
    );
}
