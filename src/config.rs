use clap::{Parser, ValueEnum};
use hackcalc::Limits;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Full-screen interface with live results and suggestions.
    Tui,
    /// Raw-mode prompt with Tab completion.
    Line,
}

/// Restricted-expression calculator with decimal, hex and binary output.
#[derive(Debug, Parser)]
#[command(name = "hackcalc", version)]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = Mode::Tui)]
    pub mode: Mode,

    /// Evaluate one expression, print the result and exit.
    #[arg(short, long, value_name = "EXPR", conflicts_with = "complete")]
    pub expr: Option<String>,

    /// List the completions for a prefix and exit.
    #[arg(short, long, value_name = "PREFIX")]
    pub complete: Option<String>,

    #[arg(long, default_value_t = Limits::default().max_depth)]
    pub max_depth: usize,

    #[arg(long, default_value_t = Limits::default().max_input_len)]
    pub max_input_len: usize,

    /// Filter directive such as `debug` or `hackcalc=trace`. Falls back to RUST_LOG.
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,

    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn limits(&self) -> Limits {
        Limits {
            max_depth: self.max_depth,
            max_input_len: self.max_input_len,
        }
    }

    pub fn is_one_shot(&self) -> bool {
        self.expr.is_some() || self.complete.is_some()
    }

    /// Whether stderr belongs to a full-screen interface for this run.
    pub fn owns_screen(&self) -> bool {
        !self.is_one_shot() && self.mode == Mode::Tui
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["hackcalc"]);
        assert_eq!(cli.mode, Mode::Tui);
        assert_eq!(cli.limits(), Limits::default());
        assert!(cli.owns_screen());
    }

    #[test]
    fn one_shot_flags() {
        let cli = Cli::parse_from(["hackcalc", "-e", "2 ** 10", "--max-depth", "16"]);
        assert_eq!(cli.expr.as_deref(), Some("2 ** 10"));
        assert_eq!(cli.limits().max_depth, 16);
        assert!(!cli.owns_screen());

        let cli = Cli::parse_from(["hackcalc", "--mode", "line", "-c", "sq"]);
        assert_eq!(cli.mode, Mode::Line);
        assert_eq!(cli.complete.as_deref(), Some("sq"));
    }

    #[test]
    fn expr_and_complete_conflict() {
        assert!(Cli::try_parse_from(["hackcalc", "-e", "1", "-c", "s"]).is_err());
    }
}
