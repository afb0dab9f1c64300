//! Pipeline execution engine for tabular data cleaning.
//!
//! Records flow from a source, through an ordered sequence of
//! transformation and validation steps, to a destination. This crate owns
//! the engine only: the step abstraction, the partitioned executor, and the
//! orchestrator that sequences steps and enforces error-rate and
//! incremental-window policies. Connectors, concrete transforms, validation
//! rule sets, and report rendering live in sibling crates and reach the
//! engine through the [`Transform`], [`Validator`], and [`MetricsSink`]
//! traits.

pub mod error;
pub mod executor;
pub mod metrics;
pub mod pipeline;
pub mod policy;
pub mod step;

pub use error::{PipelineError, Result};
pub use executor::{DEFAULT_MEMORY_LIMIT, ParallelExecutor, parse_memory_limit};
pub use metrics::MetricsSink;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use policy::{ErrorPolicy, IncrementalWindow};
pub use step::{PipelineStep, Transform, Validator};
