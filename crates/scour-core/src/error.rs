//! Error types for pipeline execution.

use thiserror::Error;

/// Errors surfaced by the pipeline engine.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid executor or pipeline settings, detected at construction.
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },

    /// A step's underlying unit failed while processing a partition or the
    /// whole dataset.
    #[error("step '{step}' failed: {source}")]
    StepExecution {
        step: String,
        #[source]
        source: anyhow::Error,
    },

    /// A filter step produced a mask whose length does not match the input.
    #[error("filter '{step}' returned a mask of {actual} rows for {expected} input rows")]
    MaskLength {
        step: String,
        expected: usize,
        actual: usize,
    },

    /// A partition worker thread panicked.
    #[error("partition {partition} worker panicked")]
    WorkerPanic { partition: usize },

    /// The observed error rate exceeded the per-run maximum.
    #[error("error rate {observed_pct:.2}% exceeds maximum allowed {allowed_pct:.2}%", observed_pct = .observed * 100.0, allowed_pct = .allowed * 100.0)]
    ErrorRateExceeded { observed: f64, allowed: f64 },

    /// Failed DataFrame operation.
    #[error("dataframe operation failed: {0}")]
    Frame(#[from] polars::prelude::PolarsError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
