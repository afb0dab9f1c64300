//! Error types for connector I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving datasets.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File uses an encoding the connectors do not support.
    #[error("unsupported encoding in {path}: {encoding}")]
    UnsupportedEncoding {
        path: PathBuf,
        encoding: &'static str,
    },

    /// Failed to parse file content.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A configured column is missing from the loaded data.
    #[error("column '{column}' not found in {path}")]
    ColumnNotFound { column: String, path: PathBuf },

    /// A value did not match the configured datetime format.
    #[error("invalid datetime '{value}' in column '{column}' (format '{format}')")]
    DatetimeParse {
        column: String,
        value: String,
        format: String,
    },

    /// Failed DataFrame operation.
    #[error("dataframe operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for ConnectError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for connector operations.
pub type Result<T> = std::result::Result<T, ConnectError>;
