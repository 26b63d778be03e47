use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::info;

use super::{basis_error, App};
use crate::cli::formatters::{format_confirmation, format_saved};
use crate::importers::{parse_confirmation, read_input};
use crate::ui::Prompter;

const PASTE_PROMPT: &str = "Paste the trade details and press Enter twice:";

/// Record a trade confirmation and print its simple-interest breakeven
pub fn dispatch_confirm<R: BufRead, W: Write>(
    app: &App,
    input: Option<&str>,
    trades: &Path,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let content = match input {
        Some(path) => read_input(path)?,
        None => prompter.read_block(PASTE_PROMPT)?,
    };
    let trade = parse_confirmation(&content)?;

    let rate = app.config.savings_rate;
    let interest = trade.interest(app.as_of, rate).map_err(basis_error)?;
    let breakeven = trade.breakeven(app.as_of, rate).map_err(basis_error)?;

    let path = app.output_file(trades);
    trade.append_to_csv(&path)?;
    info!("Recorded {} {} {} in {}", trade.action, trade.quantity, trade.symbol, path.display());

    println!("{}", format_confirmation(&trade, interest, breakeven, rate));
    println!("{}", format_saved("Trade", &path));
    Ok(())
}
