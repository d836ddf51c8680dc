use clap::Parser;
use std::fs;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use slim::config::{Cli, Config};
use slim::runner;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_filter());

    let path = &cli.file;
    if !path.exists() {
        eprintln!("Error: File '{}' does not exist", path.display());
        return ExitCode::from(1);
    }

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            return ExitCode::from(1);
        }
    };

    let config = Config::from(&cli);
    tracing::debug!(file = %path.display(), bytes = source.len(), "running script");
    let outcome = runner::run(&source, &config);
    ExitCode::from(outcome.exit_code() as u8)
}

/// Logs go to stderr so script output on stdout stays clean. `RUST_LOG`
/// overrides the verbosity flags.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}
