//! Pipeline config file model.
//!
//! A config file is a JSON document describing where data comes from, the
//! ordered cleaning steps, how to execute them, and where results and
//! quality reports go.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use scour_clean::{SanitizeOptions, TargetType};
use scour_connect::{Compression, CsvOptions};
use scour_validate::{ColumnRule, ErrorHandling};

/// Top-level pipeline description.
#[derive(Debug, Deserialize)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub destination: Option<DestinationConfig>,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub incremental: Option<IncrementalConfig>,
    #[serde(default)]
    pub error_policy: ErrorPolicyConfig,
    #[serde(default)]
    pub report: Option<ReportConfig>,
}

impl PipelineConfig {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening pipeline config {}", path.display()))?;
        serde_json::from_reader(file)
            .with_context(|| format!("parsing pipeline config {}", path.display()))
    }
}

/// Where input records come from.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Csv {
        path: PathBuf,
        #[serde(flatten)]
        options: CsvOptions,
    },
    Parquet {
        path: PathBuf,
    },
}

/// Where cleaned records go.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DestinationConfig {
    Csv {
        path: PathBuf,
        #[serde(flatten)]
        options: CsvOptions,
    },
    Parquet {
        path: PathBuf,
        #[serde(default)]
        compression: Compression,
        #[serde(default)]
        partition_by: Option<String>,
    },
}

/// One cleaning step, in pipeline order.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepConfig {
    Sanitize {
        #[serde(flatten)]
        options: SanitizeOptions,
    },
    Convert {
        patterns: BTreeMap<String, TargetType>,
    },
    Geocode {
        address_columns: Vec<String>,
        #[serde(default)]
        add_timezone: bool,
    },
    Schema {
        rules: BTreeMap<String, ColumnRule>,
    },
    Pattern {
        rules: BTreeMap<String, String>,
        #[serde(default)]
        mode: ErrorHandling,
    },
}

/// Executor settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub partitions: usize,
    pub memory_limit: String,
    pub use_disk: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            partitions: 1,
            memory_limit: "4GB".to_string(),
            use_disk: false,
        }
    }
}

/// Incremental-window settings.
#[derive(Debug, Deserialize)]
pub struct IncrementalConfig {
    pub checkpoint_column: String,
    pub lookback_days: i64,
}

/// Per-run error policy.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorPolicyConfig {
    pub max_error_rate: Option<f64>,
    pub error_store: Option<PathBuf>,
}

/// Data-quality report settings.
#[derive(Debug, Deserialize)]
pub struct ReportConfig {
    pub path: PathBuf,
    #[serde(default = "default_true")]
    pub column_stats: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses() {
        let raw = r#"{ "source": { "type": "csv", "path": "in.csv" } }"#;
        let config: PipelineConfig = serde_json::from_str(raw).unwrap();
        assert!(matches!(config.source, SourceConfig::Csv { .. }));
        assert!(config.steps.is_empty());
        assert_eq!(config.executor.partitions, 1);
        assert!(config.error_policy.max_error_rate.is_none());
    }

    #[test]
    fn full_config_parses() {
        let raw = r#"{
            "source": {
                "type": "csv",
                "path": "data/raw/orders.csv",
                "null_values": ["NA", "N/A", ""],
                "datetime_formats": { "order_date": "%Y-%m-%d" }
            },
            "destination": {
                "type": "parquet",
                "path": "data/processed/orders",
                "compression": "snappy",
                "partition_by": "currency"
            },
            "steps": [
                {
                    "type": "sanitize",
                    "remove_chars": ["$", "!"],
                    "columns": ["product_name", "total_price"]
                },
                {
                    "type": "convert",
                    "patterns": { "total_price": "float", "order_date": "date" }
                },
                {
                    "type": "schema",
                    "rules": {
                        "order_id": { "type": "string", "regex": "ORD-\\d{8}" },
                        "total_price": { "type": "float", "min": 0 }
                    }
                },
                {
                    "type": "pattern",
                    "rules": { "customer_email": "[^@\\s]+@[^@\\s]+" },
                    "mode": "quarantine"
                }
            ],
            "executor": { "partitions": 4, "memory_limit": "2GB", "use_disk": true },
            "incremental": { "checkpoint_column": "order_date", "lookback_days": 30 },
            "error_policy": { "max_error_rate": 0.1 },
            "report": { "path": "reports/quality.html" }
        }"#;
        let config: PipelineConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.steps.len(), 4);
        assert_eq!(config.executor.partitions, 4);
        assert!(config.incremental.is_some());
        assert!(config.report.is_some());
        match &config.destination {
            Some(DestinationConfig::Parquet { partition_by, .. }) => {
                assert_eq!(partition_by.as_deref(), Some("currency"));
            }
            other => panic!("expected parquet destination, got {other:?}"),
        }
    }
}
