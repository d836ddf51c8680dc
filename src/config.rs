use clap::Parser;
use std::path::PathBuf;

/// Command-line options for the `slim` binary.
#[derive(Debug, Parser)]
#[command(name = "slim", version, about = "A small dynamically-typed scripting language")]
pub struct Cli {
    /// The script file to execute
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print diagnostics without colour
    #[arg(long, default_value_t = false)]
    pub no_color: bool,
}

impl Cli {
    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "slim=debug",
            _ => "slim=trace",
        }
    }
}

/// Settings the runner needs to report diagnostics.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name shown in diagnostics; `None` renders as `<input>`.
    pub filename: Option<String>,
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filename: None,
            color: true,
        }
    }
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Self {
            filename: Some(cli.file.display().to_string()),
            color: !cli.no_color,
        }
    }
}
