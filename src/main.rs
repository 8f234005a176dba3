mod config;
mod logging;

#[cfg(feature = "line")]
mod line_mode;
#[cfg(feature = "tui")]
mod render_help;
#[cfg(feature = "tui")]
mod tui_mode;

use anyhow::Result;
use clap::Parser;
use config::{Cli, Mode};
use hackcalc::{completions, format_value, Evaluator};
use std::process::ExitCode;
use tracing::info;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(&cli)?;

    if let Some(prefix) = &cli.complete {
        for name in completions(prefix) {
            println!("{}", name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let evaluator = Evaluator::global(cli.limits());

    if let Some(expr) = &cli.expr {
        return Ok(match evaluator.evaluate(expr) {
            Ok(value) => {
                for (label, text) in format_value(value).rows() {
                    println!("{:<8}{}", label, text);
                }
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("{}: {}", err.kind(), err);
                ExitCode::FAILURE
            }
        });
    }

    info!(mode = ?cli.mode, "starting");
    match cli.mode {
        Mode::Tui => run_tui(evaluator)?,
        Mode::Line => run_line(evaluator)?,
    }
    info!("exiting");
    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "tui")]
fn run_tui(evaluator: Evaluator<'static>) -> Result<()> {
    tui_mode::run_tui(evaluator)
}

#[cfg(not(feature = "tui"))]
fn run_tui(_: Evaluator<'static>) -> Result<()> {
    anyhow::bail!("built without the `tui` feature; use --mode line, --expr or --complete")
}

#[cfg(feature = "line")]
fn run_line(evaluator: Evaluator<'static>) -> Result<()> {
    line_mode::run_line(evaluator)
}

#[cfg(not(feature = "line"))]
fn run_line(_: Evaluator<'static>) -> Result<()> {
    anyhow::bail!("built without the `line` feature; rebuild with --features line")
}
