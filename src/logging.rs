use crate::config::Cli;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. With the full-screen interface and no log
/// file nothing is installed, since stderr shares the terminal.
pub fn init(cli: &Cli) -> Result<()> {
    let filter = match &cli.log_level {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter '{}'", directive))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    if let Some(path) = &cli.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
            .try_init()?;
    } else if !cli.owns_screen() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()?;
    }
    Ok(())
}
