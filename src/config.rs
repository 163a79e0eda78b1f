//! Command-line and environment configuration.

use crate::error::AppError;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::Parser;
use std::path::{Path, PathBuf};

pub const DEFAULT_THRESHOLD: f64 = 0.30;

/// Well production analysis: clean daily records, compute per-well KPIs,
/// flag day-over-day anomalies and render trend charts.
#[derive(Debug, Clone, Parser)]
#[command(name = "well_report", version)]
pub struct Cli {
    /// Production CSV with Well_name, Date, Oil_rate, Gas_rate, Water_rate columns.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Fractional day-over-day change that counts as an anomaly (0.3 = 30%).
    #[arg(long, env = "WELL_REPORT_THRESHOLD", default_value_t = DEFAULT_THRESHOLD, allow_negative_numbers = true)]
    pub threshold: f64,

    /// Directory for CSV, JSON and chart outputs.
    #[arg(long, env = "WELL_REPORT_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Skip chart rendering.
    #[arg(long)]
    pub no_charts: bool,

    /// Rows shown in terminal previews.
    #[arg(long, default_value_t = 10)]
    pub preview_rows: usize,

    /// Log filter for diagnostics on stderr (error, warn, info, debug, trace).
    #[arg(long, env = "WELL_REPORT_LOG", default_value = "warn")]
    pub log_level: String,
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub threshold: f64,
    pub out_dir: PathBuf,
    pub charts: bool,
    pub preview_rows: usize,
}

impl Cli {
    /// Parse arguments, turning argument-count mistakes into a usage error
    /// with its own exit code. Help and version requests are handed back
    /// as `Ok(None)` after being printed.
    pub fn try_parse_args<I, T>(args: I) -> Result<Option<Cli>, AppError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match Cli::try_parse_from(args) {
            Ok(cli) => Ok(Some(cli)),
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = e.print();
                    Ok(None)
                }
                ErrorKind::MissingRequiredArgument => {
                    Err(AppError::Usage("Too few command-line arguments.".to_string()))
                }
                ErrorKind::UnknownArgument if !is_flag(&e) => {
                    Err(AppError::Usage("Too many command-line arguments.".to_string()))
                }
                _ => Err(AppError::Usage(e.to_string().trim_end().to_string())),
            },
        }
    }

    pub fn into_config(self) -> Result<RunConfig, AppError> {
        validate_threshold(self.threshold)?;
        validate_extension(&self.input)?;
        Ok(RunConfig {
            input: self.input,
            threshold: self.threshold,
            out_dir: self.out_dir,
            charts: !self.no_charts,
            preview_rows: self.preview_rows,
        })
    }
}

// A stray positional shows up as an unknown argument without a leading dash.
fn is_flag(e: &clap::Error) -> bool {
    matches!(
        e.get(ContextKind::InvalidArg),
        Some(ContextValue::String(s)) if s.starts_with('-')
    )
}

pub fn validate_threshold(threshold: f64) -> Result<(), AppError> {
    if threshold.is_finite() && threshold >= 0.0 {
        Ok(())
    } else {
        Err(AppError::InvalidThreshold(threshold))
    }
}

pub fn validate_extension(path: &Path) -> Result<(), AppError> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(())
    } else {
        Err(AppError::BadExtension(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let cli = Cli::try_parse_args(["well_report", "data.csv"]).unwrap().unwrap();
        assert_eq!(cli.input, PathBuf::from("data.csv"));
        assert_eq!(cli.out_dir, PathBuf::from("."));
        assert!(!cli.no_charts);
        let config = cli.into_config().unwrap();
        assert!(config.charts);
        assert!(config.threshold >= 0.0);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_args([
            "well_report",
            "data.CSV",
            "--threshold",
            "0.5",
            "--out-dir",
            "reports",
            "--no-charts",
        ])
        .unwrap()
        .unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.out_dir, PathBuf::from("reports"));
        assert!(!config.charts);
    }

    #[test]
    fn argument_count_errors_are_usage_errors() {
        let err = Cli::try_parse_args(["well_report"]).unwrap_err();
        assert_eq!(err.to_string(), "Too few command-line arguments.");
        assert_eq!(err.exit_code(), 2);

        let err = Cli::try_parse_args(["well_report", "a.csv", "b.csv"]).unwrap_err();
        assert_eq!(err.to_string(), "Too many command-line arguments.");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn extension_must_be_csv() {
        assert!(validate_extension(Path::new("wells.csv")).is_ok());
        assert!(validate_extension(Path::new("wells.Csv")).is_ok());
        let err = validate_extension(Path::new("wells.xlsx")).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(validate_extension(Path::new("wells")).is_err());
    }

    #[test]
    fn threshold_must_be_non_negative_and_finite() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(0.3).is_ok());
        assert!(matches!(validate_threshold(-0.1), Err(AppError::InvalidThreshold(_))));
        assert!(validate_threshold(f64::NAN).is_err());
        assert!(validate_threshold(f64::INFINITY).is_err());
    }
}
