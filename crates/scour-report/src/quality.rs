//! Per-run data-quality metrics and HTML report rendering.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use chrono::Utc;
use polars::prelude::{ChunkAgg, ChunkVar, DataFrame, DataType};
use serde::Serialize;

use scour_common::{format_numeric, is_numeric_dtype};
use scour_core::MetricsSink;

/// Statistics for one output column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnMetrics {
    pub data_type: String,
    pub null_rate: f64,
    pub unique_values: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Metrics collected for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics {
    /// Collection time, RFC 3339.
    pub timestamp: String,
    pub input_rows: usize,
    pub output_rows: usize,
    /// Fraction of input rows present in the output; 0 for failed runs.
    pub success_rate: f64,
    /// False when the run produced no output dataset.
    pub completed: bool,
    pub column_metrics: BTreeMap<String, ColumnMetrics>,
}

/// Collects run metrics and renders them as a report.
///
/// `collect` may be called from successive runs; each call replaces the
/// previous run's metrics. `export` renders whatever was collected last:
/// HTML by default, or pretty-printed JSON when the output path ends in
/// `.json`.
pub struct DataQualityReport {
    output_path: PathBuf,
    column_stats: bool,
    state: Mutex<Option<RunMetrics>>,
}

impl DataQualityReport {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            column_stats: true,
            state: Mutex::new(None),
        }
    }

    /// Disable per-column statistics in the rendered report.
    #[must_use]
    pub fn without_column_stats(mut self) -> Self {
        self.column_stats = false;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// The metrics collected by the most recent run, if any.
    pub fn last_run(&self) -> Option<RunMetrics> {
        self.state.lock().expect("metrics lock poisoned").clone()
    }

    fn build_metrics(input: &DataFrame, output: Option<&DataFrame>) -> RunMetrics {
        let input_rows = input.height();
        let output_rows = output.map_or(0, polars::prelude::DataFrame::height);
        let success_rate = match output {
            None => 0.0,
            Some(_) if input_rows == 0 => 1.0,
            Some(out) => out.height() as f64 / input_rows as f64,
        };

        // Column statistics come from the output when there is one, and
        // from the input for failed runs so the report still shows what
        // went in.
        let stats_frame = output.unwrap_or(input);
        let mut column_metrics = BTreeMap::new();
        for col in stats_frame.get_columns() {
            let height = col.len();
            let null_rate = if height == 0 {
                0.0
            } else {
                col.null_count() as f64 / height as f64
            };
            let series = col.as_materialized_series();
            let unique_values = series.n_unique().unwrap_or(0);

            let mut mean = None;
            let mut std = None;
            let mut min = None;
            let mut max = None;
            if is_numeric_dtype(col.dtype())
                && let Ok(casted) = series.cast(&DataType::Float64)
                && let Ok(ca) = casted.f64()
            {
                mean = ca.mean();
                std = ca.std(1);
                min = ca.min();
                max = ca.max();
            }

            column_metrics.insert(
                col.name().to_string(),
                ColumnMetrics {
                    data_type: col.dtype().to_string(),
                    null_rate,
                    unique_values,
                    mean,
                    std,
                    min,
                    max,
                },
            );
        }

        RunMetrics {
            timestamp: Utc::now().to_rfc3339(),
            input_rows,
            output_rows,
            success_rate,
            completed: output.is_some(),
            column_metrics,
        }
    }

    fn render_html(&self, metrics: &RunMetrics) -> String {
        let mut html = String::new();
        html.push_str("<!doctype html>\n<html>\n<head><title>Data Quality Report</title></head>\n<body>\n");
        html.push_str("<h1>Data Quality Report</h1>\n<h2>Overview</h2>\n<ul>\n");
        html.push_str(&format!(
            "<li>Collected: {}</li>\n<li>Completed: {}</li>\n<li>Input Rows: {}</li>\n<li>Output Rows: {}</li>\n<li>Success Rate: {:.2}%</li>\n",
            metrics.timestamp,
            metrics.completed,
            metrics.input_rows,
            metrics.output_rows,
            metrics.success_rate * 100.0
        ));
        html.push_str("</ul>\n");

        if self.column_stats {
            html.push_str("<h2>Column Metrics</h2>\n");
            for (name, column) in &metrics.column_metrics {
                html.push_str(&format!("<h3>{name}</h3>\n<ul>\n"));
                html.push_str(&format!(
                    "<li>Data Type: {}</li>\n<li>Null Rate: {:.2}%</li>\n<li>Unique Values: {}</li>\n",
                    column.data_type,
                    column.null_rate * 100.0,
                    column.unique_values
                ));
                if let (Some(mean), Some(min), Some(max)) = (column.mean, column.min, column.max) {
                    html.push_str(&format!(
                        "<li>Mean: {}</li>\n<li>Min: {}</li>\n<li>Max: {}</li>\n",
                        format_numeric(mean),
                        format_numeric(min),
                        format_numeric(max)
                    ));
                }
                html.push_str("</ul>\n");
            }
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

impl MetricsSink for DataQualityReport {
    fn collect(&self, input: &DataFrame, output: Option<&DataFrame>) {
        let metrics = Self::build_metrics(input, output);
        tracing::debug!(
            input_rows = metrics.input_rows,
            output_rows = metrics.output_rows,
            completed = metrics.completed,
            "collected run metrics"
        );
        *self.state.lock().expect("metrics lock poisoned") = Some(metrics);
    }

    fn export(&self) -> anyhow::Result<()> {
        let state = self.state.lock().expect("metrics lock poisoned");
        let metrics = state
            .as_ref()
            .context("no metrics collected; run the pipeline before exporting")?;
        let rendered = if self.output_path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(metrics).context("serializing run metrics")?
        } else {
            self.render_html(metrics)
        };
        if let Some(parent) = self.output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
        std::fs::write(&self.output_path, rendered)
            .with_context(|| format!("writing report to {}", self.output_path.display()))?;
        tracing::info!(path = %self.output_path.display(), "exported data quality report");
        Ok(())
    }
}
