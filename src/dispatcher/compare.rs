//! `breakeven compare`: current and year-end value of each investment in a
//! CSV, priced in its own symbol.

use anyhow::Result;
use chrono::NaiveDate;
use std::path::Path;
use tracing::info;

use super::App;
use crate::cli::formatters::{format_info, format_saved, format_section, format_warning};
use crate::error::{InputError, LookupError};
use crate::evaluator;
use crate::importers::parse_investments_csv;
use crate::models::{EvaluationResult, Investment, Keyed, YearEndValuation};
use crate::pricing::PriceSeries;
use crate::reports::{failure_table, performance_table, yearly_table, CsvReport};
use crate::ui::progress::{ProgressEvent, ProgressPrinter};

const DEFAULT_OUTPUT: &str = "portfolio_performance.csv";
const YEARLY_TITLE: &str = "Yearly Growth Breakdown";

/// Current value plus the completed year-ends of one investment
#[derive(Debug, Clone)]
struct PortfolioValuation {
    current: EvaluationResult,
    year_ends: Vec<YearEndValuation>,
}

impl Keyed for PortfolioValuation {
    fn symbol(&self) -> &str {
        &self.current.symbol
    }

    fn key_date(&self) -> NaiveDate {
        self.current.purchase_date
    }
}

fn value_investment(
    investment: &Investment,
    series: &PriceSeries,
    as_of: NaiveDate,
) -> Result<PortfolioValuation, LookupError> {
    Ok(PortfolioValuation {
        current: evaluator::evaluate(investment, series)?,
        year_ends: evaluator::year_end_valuations(investment, series, as_of)?,
    })
}

pub async fn dispatch_compare(app: &App, file: &str, output: Option<&Path>) -> Result<()> {
    let rows = parse_investments_csv(file)?;
    if rows.is_empty() {
        return Err(InputError::Validation(format!("no investments found in '{}'", file)).into());
    }
    info!("Valuing {} investments from {}", rows.len(), file);

    let groups = rows
        .into_iter()
        .map(|row| (row.symbol, vec![row.investment]))
        .collect();
    let as_of = app.as_of;
    let mut printer = ProgressPrinter::new(app.show_progress);
    let batch = app
        .comparator()
        .compare_groups(
            groups,
            as_of,
            move |inv: &Investment, series: &PriceSeries| value_investment(inv, series, as_of),
            &mut |event: &ProgressEvent| printer.handle_event(event),
        )
        .await;
    printer.finish();

    let mut valuations = batch.results;
    valuations.sort_by(|a, b| {
        (a.symbol(), a.key_date()).cmp(&(b.symbol(), b.key_date()))
    });
    let current: Vec<EvaluationResult> = valuations.iter().map(|v| v.current.clone()).collect();
    let mut year_ends: Vec<YearEndValuation> = valuations
        .into_iter()
        .flat_map(|v| v.year_ends)
        .collect();
    year_ends.sort_by(|a, b| (a.year, &a.symbol).cmp(&(b.year, &b.symbol)));

    let performance = performance_table(&current);
    let yearly = yearly_table(&year_ends);
    if performance.is_empty() {
        println!("{}", format_info("No investments could be valued."));
    } else {
        println!("{}", format_section("Portfolio performance", &performance));
    }
    if !yearly.is_empty() {
        println!("{}", format_section(YEARLY_TITLE, &yearly));
    }
    if !batch.failures.is_empty() {
        println!(
            "{}",
            format_warning(&format!("{} lookups failed", batch.failures.len()))
        );
        println!("{}", failure_table(&batch.failures).render());
    }

    let path = app.output_file(output.unwrap_or(Path::new(DEFAULT_OUTPUT)));
    CsvReport::new(&performance)
        .section(YEARLY_TITLE, &yearly)
        .save(&path)?;
    println!("{}", format_saved("Portfolio performance", &path));
    Ok(())
}
