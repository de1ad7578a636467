//! tickerdash - a terminal dashboard for stock quotes and market indices.

mod api;
mod app;
mod browser;
mod cli;
mod config;
mod error;
mod layout;
mod line_editor;
mod logging;
mod models;
mod profile;
mod ui;
mod window;

use anyhow::{Context, Result};
use api::YahooFinanceClient;
use app::App;
use cli::Args;
use config::Config;
use crossterm::{
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use profile::Profile;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use ui::Ui;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();
    let _log_guard = logging::init_logging(args.log_dir.clone(), args.verbose)?;

    // Everything that can fail on bad user files happens before raw mode.
    let config = match &args.config {
        Some(path) => Config::load(path),
        None => Config::load_or_default(),
    };
    let config = match config {
        Ok(config) => config.with_overrides(&args),
        Err(err) => {
            eprintln!("Error: {err:#}");
            eprintln!();
            eprintln!("Sample config:");
            eprintln!("{}", config::sample_config());
            std::process::exit(1);
        }
    };

    let profile_path = config
        .profile
        .path
        .clone()
        .or_else(Profile::default_path)
        .context("Could not determine a profile location; pass --profile")?;
    let profile = Profile::load_or_create(&profile_path)?;

    let client = YahooFinanceClient::new(config.api.quote_url.clone(), config.timeout())
        .context("Failed to build HTTP client")?;

    run_interactive(client, profile, &config).await
}

/// Own the terminal for the lifetime of the dashboard.
async fn run_interactive(client: YahooFinanceClient, profile: Profile, config: &Config) -> Result<()> {
    let (width, height) = terminal::size().context("Failed to read terminal size")?;
    let ui = Ui::new(client, profile, config.market.symbols.clone(), width, height);
    let app = App::new(ui, config.refresh_interval(), config.general.browser_debounce);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "dashboard exited with an error");
    }
    result
}
