//! Step abstraction: one unit of work over a dataset.
//!
//! A step wraps either a transform (dataset in, dataset out) or a filter (a
//! per-row boolean decision) behind a single `execute` contract, so the
//! orchestrator and executor never see the distinction.

use polars::prelude::{BooleanChunked, DataFrame};

use crate::error::{PipelineError, Result};

/// A unit that maps a dataset to a new dataset.
///
/// Implementations must not mutate their input; they consume one frame and
/// produce a new one. The engine makes no concurrency guarantee about a
/// unit's internal state: when the executor runs partitions in parallel the
/// same unit is called from several threads, and any internal cache must
/// bring its own synchronization.
pub trait Transform: Send + Sync {
    /// Process the dataset, returning the transformed copy.
    fn process(&self, df: &DataFrame) -> anyhow::Result<DataFrame>;
}

/// A unit that computes a per-row accept/reject decision.
///
/// The returned mask must have exactly one entry per input row; malformed
/// input is signalled by failing, never by returning a mask of a different
/// length. The same concurrency caveat as [`Transform`] applies.
pub trait Validator: Send + Sync {
    /// Evaluate the dataset, returning the keep-mask.
    fn validate(&self, df: &DataFrame) -> anyhow::Result<BooleanChunked>;
}

enum StepUnit {
    Transform(Box<dyn Transform>),
    Filter(Box<dyn Validator>),
}

/// A named step in a pipeline.
///
/// The name defaults to the wrapped unit's type name and, together with the
/// step's position in the pipeline, identifies it in errors and logs. Steps
/// are immutable once added to a pipeline.
pub struct PipelineStep {
    name: String,
    unit: StepUnit,
}

impl PipelineStep {
    /// Wrap a transform unit.
    pub fn transform<T: Transform + 'static>(unit: T) -> Self {
        Self {
            name: short_type_name::<T>(),
            unit: StepUnit::Transform(Box::new(unit)),
        }
    }

    /// Wrap a filter unit.
    pub fn filter<V: Validator + 'static>(unit: V) -> Self {
        Self {
            name: short_type_name::<V>(),
            unit: StepUnit::Filter(Box::new(unit)),
        }
    }

    /// Override the default step name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The step's configured name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute the step against a dataset.
    ///
    /// Transform output passes through unchanged. For a filter, the mask is
    /// evaluated and the dataset narrowed to masked rows; row order is
    /// preserved and the row count never grows. Unit failures surface as
    /// [`PipelineError::StepExecution`] carrying the step name.
    pub fn execute(&self, df: &DataFrame) -> Result<DataFrame> {
        match &self.unit {
            StepUnit::Transform(unit) => {
                unit.process(df)
                    .map_err(|source| PipelineError::StepExecution {
                        step: self.name.clone(),
                        source,
                    })
            }
            StepUnit::Filter(unit) => {
                let mask = unit
                    .validate(df)
                    .map_err(|source| PipelineError::StepExecution {
                        step: self.name.clone(),
                        source,
                    })?;
                if mask.len() != df.height() {
                    return Err(PipelineError::MaskLength {
                        step: self.name.clone(),
                        expected: df.height(),
                        actual: mask.len(),
                    });
                }
                Ok(df.filter(&mask)?)
            }
        }
    }
}

/// Last path segment of a type name, e.g. `scour_clean::ColumnSanitizer`
/// becomes `ColumnSanitizer`.
fn short_type_name<T>() -> String {
    std::any::type_name::<T>()
        .rsplit("::")
        .next()
        .unwrap_or("step")
        .to_string()
}
