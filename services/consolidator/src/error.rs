use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the consolidation engine.
///
/// Only `Config` and the master-table variants are surfaced as run failures.
/// Everything else is caught at the file or sheet level and logged.
#[derive(Error, Debug)]
pub enum ConsolidateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Workbook error in {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("Sheet '{sheet}' not found in {path}")]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("Missing required columns in {path} [{sheet}]: {missing:?}")]
    MissingColumns {
        path: PathBuf,
        sheet: String,
        missing: Vec<String>,
    },

    #[error("Failed to load master table {path}: {message}")]
    MasterLoad { path: PathBuf, message: String },

    #[error("Failed to write master table {path}: {message}")]
    MasterWrite { path: PathBuf, message: String },
}

impl ConsolidateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConsolidateError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        ConsolidateError::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsolidateError>;
