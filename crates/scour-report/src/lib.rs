//! Data-quality reporting and resource monitoring.
//!
//! [`DataQualityReport`] implements the engine's metrics-sink contract and
//! renders an HTML report on demand. [`ResourceMonitor`] times runs and
//! raises anomaly alerts through an injected sink instead of global
//! printing.

pub mod monitor;
pub mod quality;

pub use monitor::{AlertSink, ResourceMonitor, TracingAlerts};
pub use quality::{ColumnMetrics, DataQualityReport, RunMetrics};
