//! CLI argument definitions for tickerlens.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `report` | Validate a ticker list, then print financial metrics per ticker |
//! | `validate` | Check which tickers the provider knows |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | `10000` | Per-request timeout in ms |
//! | `--concurrency` | `4` | Tickers fetched at once |
//! | `--retries` | `2` | Retries per provider request |
//! | `--lookback-days` | `5` | Days of daily history for the current price |
//! | `--skip-failed` | `false` | Leave out tickers whose lookup fails |
//! | `--fixture` | none | Serve data from a JSON fixture file |
//! | `--as-of` | today | Reference date for upcoming earnings |
//! | `-v` | warn | Raise log verbosity (repeatable) |
//!
//! # Examples
//!
//! ```bash
//! # Prompt for tickers until every one is found, then print the table
//! tickerlens report
//!
//! # Non-interactive JSON report
//! tickerlens report AAPL,MSFT,BRK-B --format json --pretty
//!
//! # Offline run against canned data
//! tickerlens report AAPL --fixture portfolio.json --as-of 2024-06-01
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use time::Date;

/// Ticker validation and financial metrics for a small portfolio.
#[derive(Debug, Parser)]
#[command(
    name = "tickerlens",
    author,
    version,
    about = "Validate portfolio tickers and report their key financial metrics"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Per-request timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Number of tickers fetched at once.
    #[arg(
        long,
        global = true,
        default_value_t = 4,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub concurrency: u16,

    /// Retries per provider request after the first attempt.
    #[arg(long, global = true, default_value_t = 2)]
    pub retries: u32,

    /// Calendar days of daily history searched for the latest close.
    #[arg(
        long,
        global = true,
        default_value_t = 5,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub lookback_days: u16,

    /// Leave out tickers whose metadata lookup fails instead of aborting.
    #[arg(long, global = true, default_value_t = false)]
    pub skip_failed: bool,

    /// Serve provider data from a JSON fixture file instead of Yahoo.
    #[arg(long, global = true, value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// Reference date (YYYY-MM-DD) for upcoming earnings; defaults to today.
    #[arg(long, global = true, value_name = "DATE", value_parser = parse_as_of)]
    pub as_of: Option<Date>,

    /// Yahoo session cookie to use instead of negotiating one.
    #[arg(long, global = true, env = "YAHOO_COOKIE", hide_env_values = true)]
    pub yahoo_cookie: Option<String>,

    /// Raise log verbosity: -v for info, -vv for debug.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One labeled block per ticker.
    Table,
    /// Single JSON object.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate tickers, then print their financial metrics.
    ///
    /// Without TICKERS the list is read interactively until every entry is
    /// found.
    Report(ReportArgs),
    /// Check which tickers the provider knows.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Comma- or space-separated ticker symbols.
    pub tickers: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Comma- or space-separated ticker symbols.
    #[arg(required = true)]
    pub tickers: Vec<String>,
}

/// Join positional ticker arguments into one comma-separated list.
pub fn joined_tickers(tickers: &[String]) -> String {
    tickers.join(",")
}

fn parse_as_of(value: &str) -> Result<Date, String> {
    tickerlens_core::parse_date(value).map_err(|error| error.to_string())
}
