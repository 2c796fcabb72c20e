mod config;
mod db;
mod error;
mod export;
mod models;
mod run;
mod summary;
mod ui;
mod workflow;

use anyhow::{Context, Result};
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = Config::from_env()?;
    let interactive = args.len() == 1;
    init_logging(&config, interactive)?;

    let mut db = db::Database::open(&config.db_path)
        .with_context(|| format!("Failed to open {}", config.db_path.display()))?;

    if interactive {
        run::as_tui(&mut db, &config)
    } else {
        run::as_cli(&args, &mut db, &config)
    }
}

/// The TUI owns the terminal, so its logs go to a file in the data directory.
/// One-shot commands log to stderr and stay quiet unless asked.
fn init_logging(config: &Config, interactive: bool) -> Result<()> {
    let default_level = if interactive { "info" } else { "warn" };
    let filter = config
        .log_filter
        .as_deref()
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));

    if interactive {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_path)
            .with_context(|| format!("Failed to open log file {}", config.log_path.display()))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .compact()
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
    Ok(())
}
