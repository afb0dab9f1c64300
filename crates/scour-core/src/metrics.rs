//! Metrics sink contract.

use polars::prelude::DataFrame;

/// Destination for per-run quality metrics.
///
/// The orchestrator invokes `collect` exactly once per `run` call, on every
/// exit path: on success with the output frame, on failure with `None`. The
/// input frame is the windowed input actually fed to the step chain.
/// `export` is a separate, caller-triggered action the pipeline never
/// invokes.
///
/// `collect` takes `&self`; implementations synchronize their own state.
pub trait MetricsSink: Send + Sync {
    /// Record metrics for one run.
    fn collect(&self, input: &DataFrame, output: Option<&DataFrame>);

    /// Render collected metrics to the sink's configured destination.
    fn export(&self) -> anyhow::Result<()>;
}
