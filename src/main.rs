// Entry point: parse arguments, set up logging, run one report and turn any
// fatal error into a message on stderr plus its exit status.
use std::process::ExitCode;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use well_report::config::Cli;
use well_report::pipeline;

const USAGE: &str = "Usage: well_report <INPUT.csv> [--threshold <FRACTION>] [--out-dir <DIR>] [--no-charts]";

/// Diagnostics go to stderr so stdout carries only the report.
/// An unparseable filter falls back to `warn`.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    tracing_subscriber::registry().with(filter).with(layer).init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse_args(std::env::args_os()) {
        Ok(Some(cli)) => cli,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            return ExitCode::from(e.exit_code());
        }
    };
    init_logging(&cli.log_level);

    let result = cli.into_config().and_then(|config| pipeline::run(&config));
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(code = e.exit_code(), "run aborted");
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
