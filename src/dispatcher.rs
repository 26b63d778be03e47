//! Command dispatcher that routes parsed clap commands to their handlers.
//!
//! Handlers receive an [`App`] with everything resolved up front (config,
//! price source, evaluation date) plus a [`Prompter`] for values missing from
//! the command line.

mod compare;
mod confirm;
mod growth;
mod lots;
mod universe;

pub use lots::LotsOptions;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bulk::BulkComparator;
use crate::cli::{Commands, UniverseCommands};
use crate::config::Config;
use crate::error::{BasisError, InputError};
use crate::pricing::PriceSource;
use crate::reports;
use crate::ui::Prompter;

/// Resolved runtime context shared by every command
pub struct App {
    pub config: Config,
    pub source: Arc<dyn PriceSource>,
    /// Evaluation date for holding periods and price windows
    pub as_of: NaiveDate,
    /// Wall clock used for report timestamps
    pub now: NaiveDateTime,
    pub output_dir: PathBuf,
    /// No network: price lookups come back empty, the S&P 500 list must be cached
    pub offline: bool,
    pub show_progress: bool,
}

impl App {
    pub fn comparator(&self) -> BulkComparator {
        BulkComparator::new(self.source.clone(), self.config.bulk.clone())
    }

    /// `<output dir>/<prefix>_<timestamp>.csv`
    pub fn report_path(&self, prefix: &str) -> PathBuf {
        reports::report_path(&self.output_dir, prefix, self.now)
    }

    /// Relative paths land in the output directory
    pub fn output_file(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.output_dir.join(path)
        }
    }
}

/// Route a parsed command to its handler
pub async fn dispatch<R: BufRead, W: Write>(
    app: &App,
    command: Commands,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    match command {
        Commands::Lots {
            input,
            symbol,
            disposal,
            benchmarks,
            sp500,
            no_sp500,
            wash_sale_safe,
        } => {
            let options = LotsOptions {
                input,
                symbol,
                disposal,
                benchmarks,
                sp500: match (sp500, no_sp500) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                wash_sale_safe,
            };
            lots::dispatch_lots(app, options, prompter).await
        }
        Commands::Compare { file, output } => {
            compare::dispatch_compare(app, &file, output.as_deref()).await
        }
        Commands::Growth { start, end, amount } => {
            growth::dispatch_growth(app, start, end, amount, prompter).await
        }
        Commands::Confirm {
            input,
            paste: _,
            trades,
        } => confirm::dispatch_confirm(app, input.as_deref(), &trades, prompter),
        Commands::Universe { action } => match action {
            UniverseCommands::Refresh => universe::dispatch_refresh(app).await,
            UniverseCommands::Show { limit } => universe::dispatch_show(app, limit),
        },
    }
}

/// Cost-basis preconditions fail on user data (e.g. a lot bought after the
/// evaluation date), so they are reported as input errors.
fn basis_error(err: BasisError) -> InputError {
    InputError::Validation(err.to_string())
}

/// A value from the command line, else from the prompt; empty is an error.
fn required<R: BufRead, W: Write>(
    value: Option<String>,
    prompter: &mut Prompter<R, W>,
    prompt: &str,
    what: &str,
) -> Result<String> {
    let value = match value {
        Some(v) => v.trim().to_string(),
        None => prompter.ask(prompt)?.unwrap_or_default(),
    };
    if value.is_empty() {
        return Err(InputError::Validation(format!("no {} given", what)).into());
    }
    Ok(value)
}
