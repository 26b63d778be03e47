use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "breakeven")]
#[command(
    version,
    about = "Interest-adjusted breakeven prices and benchmark comparisons for brokerage lots"
)]
#[command(
    long_about = "Compute the minimum sale price for each brokerage lot that beats a savings account (5% APR, compounded daily), and compare lots or portfolios against benchmarks and every S&P 500 constituent."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Evaluation date (YYYY-MM-DD); defaults to today
    #[arg(long = "as-of", global = true, value_name = "DATE")]
    pub as_of: Option<String>,

    /// Config file (default: <config dir>/breakeven/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for generated CSV reports (default: current directory)
    #[arg(long = "output-dir", global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Breakeven prices for lots exported as tab-separated text
    Lots {
        /// Lots file (prompted for when missing)
        #[arg(short, long)]
        input: Option<String>,

        /// Symbol the lots belong to
        #[arg(short, long)]
        symbol: Option<String>,

        /// Future disposal date for the projection (YYYY-MM-DD, default Dec 31)
        #[arg(short = 'd', long = "disposal", value_name = "DATE")]
        disposal: Option<String>,

        /// Extra benchmark symbols, comma-separated (SPY is always included)
        #[arg(short, long, value_delimiter = ',')]
        benchmarks: Option<Vec<String>>,

        /// Also compare against every S&P 500 constituent
        #[arg(long, conflicts_with = "no_sp500")]
        sp500: bool,

        /// Skip the S&P 500 comparison without asking
        #[arg(long = "no-sp500")]
        no_sp500: bool,

        /// Never show a breakeven below the highest price paid for the symbol
        #[arg(long = "wash-sale-safe")]
        wash_sale_safe: bool,
    },

    /// Current and year-end value of investments listed in a CSV
    Compare {
        /// CSV with Symbol, Date Invested, Amount Invested columns
        file: String,

        /// Output CSV (default: portfolio_performance.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Growth of every S&P 500 constituent, with dividends reinvested
    Growth {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Amount invested in each symbol
        #[arg(long)]
        amount: Option<String>,
    },

    /// Record a pasted trade confirmation and show its breakeven
    Confirm {
        /// Read the confirmation from a file
        #[arg(short, long, conflicts_with = "paste", required_unless_present = "paste")]
        input: Option<String>,

        /// Paste the confirmation on stdin (ends at a blank line)
        #[arg(short = 'c', long = "paste")]
        paste: bool,

        /// Trades CSV to append to
        #[arg(long, default_value = "trades.csv")]
        trades: PathBuf,
    },

    /// S&P 500 constituent list management
    Universe {
        #[command(subcommand)]
        action: UniverseCommands,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum UniverseCommands {
    /// Download the constituent list now
    Refresh,
    /// Show the cached list
    Show {
        /// Print at most this many rows
        #[arg(long)]
        limit: Option<usize>,
    },
}
