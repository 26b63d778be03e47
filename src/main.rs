use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use breakeven::cli::formatters::format_error;
use breakeven::cli::Cli;
use breakeven::config::{offline_mode, Config};
use breakeven::dispatcher::{dispatch, App};
use breakeven::error::InputError;
use breakeven::pricing::yahoo::YahooProvider;
use breakeven::pricing::{OfflineSource, PriceSource};
use breakeven::ui::Prompter;
use breakeven::utils::parse_date;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Bad input ends the run with a message, not a failure status
    match run(cli).await {
        Err(e) => match e.downcast_ref::<InputError>() {
            Some(input) => {
                println!("{}", format_error(&input.to_string()));
                Ok(())
            }
            None => Err(e),
        },
        ok => ok,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let as_of = match cli.as_of.as_deref() {
        Some(text) => parse_date(text)?,
        None => Local::now().date_naive(),
    };
    let config = Config::load(cli.config.as_deref())?;

    let offline = offline_mode();
    let source: Arc<dyn PriceSource> = if offline {
        Arc::new(OfflineSource)
    } else {
        Arc::new(YahooProvider::new(&config.provider)?)
    };
    debug!("Using {} price source, as of {}", source.name(), as_of);

    let output_dir = cli.output_dir.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&output_dir)?;

    let app = App {
        config,
        source,
        as_of,
        now: Local::now().naive_local(),
        output_dir,
        offline,
        show_progress: std::io::stderr().is_terminal(),
    };
    let mut prompter = Prompter::stdio();
    dispatch(&app, cli.command, &mut prompter).await
}
