//! Pipeline orchestrator and builder.
//!
//! The orchestrator owns an ordered list of steps, an executor, an optional
//! incremental window, and an optional metrics sink. Each `run` feeds one
//! dataset through the executor and enforces the per-run error policy.

use std::sync::Arc;

use polars::prelude::DataFrame;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::executor::ParallelExecutor;
use crate::metrics::MetricsSink;
use crate::policy::{ErrorPolicy, IncrementalWindow};
use crate::step::{PipelineStep, Transform, Validator};

/// An immutable, reusable processing pipeline.
///
/// Constructed once via [`PipelineBuilder`] and reused across many `run`
/// invocations; step order is fixed at build time.
pub struct Pipeline {
    steps: Vec<PipelineStep>,
    executor: ParallelExecutor,
    incremental: Option<IncrementalWindow>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(PipelineStep::name).collect()
    }

    /// Run the pipeline on a dataset under a per-run error policy.
    ///
    /// The incremental window (when configured) narrows the input before
    /// any step runs. After execution, `max_error_rate` is checked against
    /// `(rows_in - rows_out) / rows_in` using the windowed input count; a
    /// breach fails the run with no partial result. The metrics sink's
    /// `collect` fires exactly once regardless of which exit path is taken.
    pub fn run(&self, df: &DataFrame, policy: &ErrorPolicy) -> Result<DataFrame> {
        let windowed = match &self.incremental {
            Some(window) => {
                let narrowed = window.apply(df)?;
                info!(
                    rows_before = df.height(),
                    rows_after = narrowed.height(),
                    column = %window.checkpoint_column,
                    lookback_days = window.lookback_days,
                    "applied incremental window"
                );
                narrowed
            }
            None => df.clone(),
        };

        info!(
            rows_in = windowed.height(),
            steps = self.steps.len(),
            partitions = self.executor.partitions(),
            "pipeline run started"
        );

        let result = self.execute_with_policy(&windowed, policy);

        // Guaranteed finalizer: the sink sees every run, including failed ones.
        if let Some(metrics) = &self.metrics {
            metrics.collect(&windowed, result.as_ref().ok());
        }

        match &result {
            Ok(output) => info!(rows_out = output.height(), "pipeline run finished"),
            Err(error) => warn!(%error, "pipeline run failed"),
        }
        result
    }

    fn execute_with_policy(&self, windowed: &DataFrame, policy: &ErrorPolicy) -> Result<DataFrame> {
        let output = self.executor.execute(windowed, &self.steps)?;

        if let Some(allowed) = policy.max_error_rate {
            let rows_in = windowed.height();
            if rows_in > 0 {
                let dropped = rows_in.saturating_sub(output.height());
                let observed = dropped as f64 / rows_in as f64;
                if observed > allowed {
                    return Err(PipelineError::ErrorRateExceeded { observed, allowed });
                }
            }
        }

        Ok(output)
    }
}

/// Fluent pipeline construction.
///
/// Steps accumulate in call order. A missing executor defaults to
/// [`ParallelExecutor::sequential`]; no other validation is performed.
#[derive(Default)]
pub struct PipelineBuilder {
    steps: Vec<PipelineStep>,
    executor: Option<ParallelExecutor>,
    incremental: Option<IncrementalWindow>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pre-built step.
    #[must_use]
    pub fn step(mut self, step: PipelineStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Append a transform unit as the next step.
    #[must_use]
    pub fn transform(self, unit: impl Transform + 'static) -> Self {
        self.step(PipelineStep::transform(unit))
    }

    /// Append a filter unit as the next step.
    #[must_use]
    pub fn filter(self, unit: impl Validator + 'static) -> Self {
        self.step(PipelineStep::filter(unit))
    }

    /// Set the executor.
    #[must_use]
    pub fn executor(mut self, executor: ParallelExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Enable incremental processing over a checkpoint column.
    #[must_use]
    pub fn incremental(mut self, checkpoint_column: &str, lookback_days: i64) -> Self {
        self.incremental = Some(IncrementalWindow::new(checkpoint_column, lookback_days));
        self
    }

    /// Set the metrics sink.
    #[must_use]
    pub fn metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Build the immutable pipeline.
    pub fn build(self) -> Pipeline {
        Pipeline {
            steps: self.steps,
            executor: self.executor.unwrap_or_else(ParallelExecutor::sequential),
            incremental: self.incremental,
            metrics: self.metrics,
        }
    }
}
