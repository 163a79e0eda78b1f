use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions of a report run. Row-level data problems are never
/// represented here; the cleaner drops those rows and counts them instead.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Usage(String),

    #[error("Not a CSV file: {}", .0.display())]
    BadExtension(PathBuf),

    #[error("File does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Insufficient permissions to read the file: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("File is empty: {}", .0.display())]
    EmptyFile(PathBuf),

    #[error("File cannot be read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid anomaly threshold {0}: must be a finite, non-negative fraction")]
    InvalidThreshold(f64),

    #[error("Failed to write {}: {message}", path.display())]
    Output { path: PathBuf, message: String },

    #[error("Failed to render chart {}: {message}", path.display())]
    Chart { path: PathBuf, message: String },
}

impl AppError {
    /// Process exit status for this error. Every variant has its own code so
    /// scripts can tell the failure modes apart.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Usage(_) => 2,
            AppError::BadExtension(_) => 3,
            AppError::NotFound(_) => 4,
            AppError::PermissionDenied(_) => 5,
            AppError::EmptyFile(_) => 6,
            AppError::Unreadable { .. } => 7,
            AppError::MissingColumns(_) => 8,
            AppError::InvalidThreshold(_) => 9,
            AppError::Output { .. } => 10,
            AppError::Chart { .. } => 11,
        }
    }

    pub(crate) fn output(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        AppError::Output { path: path.into(), message: err.to_string() }
    }

    pub(crate) fn chart(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        AppError::Chart { path: path.into(), message: err.to_string() }
    }
}
