//! Per-run error policy and incremental-window configuration.

use std::path::PathBuf;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use polars::prelude::{DataFrame, IntoLazy, col, lit};

use crate::error::Result;

/// Error-handling policy supplied to each `run` invocation.
///
/// Supplied per run rather than baked into the pipeline, so the same
/// pipeline can run under different strictness per invocation.
#[derive(Debug, Clone, Default)]
pub struct ErrorPolicy {
    /// Maximum tolerated error rate in `[0, 1]`.
    ///
    /// The error rate is `(rows_in - rows_out) / rows_in`, computed against
    /// the windowed input row count. Row loss is attributed to the run as a
    /// whole: a transform step that drops rows is indistinguishable from
    /// filter rejection in this metric.
    pub max_error_rate: Option<f64>,

    /// Where rejected rows should be stored.
    ///
    /// Accepted here so callers can thread it through a run; the engine
    /// itself never reads it. Error storage is the concern of reporting
    /// layers.
    pub error_store: Option<PathBuf>,
}

impl ErrorPolicy {
    /// Policy with a maximum error rate and no error store.
    pub fn with_max_error_rate(max_error_rate: f64) -> Self {
        Self {
            max_error_rate: Some(max_error_rate),
            ..Self::default()
        }
    }
}

/// Time-based pre-filter restricting a run to recent rows.
///
/// Rows whose `checkpoint_column` value is older than `lookback_days`
/// before "now" are dropped before any step runs; this filtering is not
/// counted against the error-rate budget.
#[derive(Debug, Clone)]
pub struct IncrementalWindow {
    pub checkpoint_column: String,
    pub lookback_days: i64,
}

impl IncrementalWindow {
    pub fn new(checkpoint_column: impl Into<String>, lookback_days: i64) -> Self {
        Self {
            checkpoint_column: checkpoint_column.into(),
            lookback_days: lookback_days.max(0),
        }
    }

    /// The cutoff timestamp for a given "now".
    pub fn cutoff(&self, now: DateTime<Utc>) -> NaiveDateTime {
        (now - Duration::days(self.lookback_days)).naive_utc()
    }

    /// Restrict the dataset to rows at or after the current cutoff.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply_at(df, self.cutoff(Utc::now()))
    }

    /// Restrict the dataset to rows at or after an explicit cutoff.
    pub fn apply_at(&self, df: &DataFrame, cutoff: NaiveDateTime) -> Result<DataFrame> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(self.checkpoint_column.as_str()).gt_eq(lit(cutoff)))
            .collect()?;
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn cutoff_subtracts_lookback() {
        let window = IncrementalWindow::new("loaded_at", 30);
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let cutoff = window.cutoff(now);
        assert_eq!(
            cutoff,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
                .unwrap()
                .naive_utc()
        );
    }

    #[test]
    fn negative_lookback_clamps_to_zero() {
        let window = IncrementalWindow::new("loaded_at", -5);
        assert_eq!(window.lookback_days, 0);
    }
}
