//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// A terminal dashboard for stock quotes and market indices.
///
/// Keeps a watchlist of tickers refreshed on a timer, with vi-style
/// navigation, column sorting and saved portfolios.
#[derive(Parser, Debug, Clone)]
#[command(name = "tickerdash")]
#[command(version)]
#[command(about = "A terminal dashboard for stock quotes and market indices", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "TICKERDASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Profile file holding the watchlist and saved portfolios
    #[arg(short = 'p', long, env = "TICKERDASH_PROFILE")]
    pub profile: Option<PathBuf>,

    /// Refresh interval, e.g. "30s" or "2m"
    #[arg(short = 'd', long, value_parser = humantime::parse_duration, env = "TICKERDASH_DELAY")]
    pub delay: Option<Duration>,

    /// Directory for log files
    #[arg(long, env = "TICKERDASH_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Args {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Args::parse()
    }
}
