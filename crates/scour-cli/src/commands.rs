//! Command implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use scour_clean::{BulkTypeConverter, ColumnSanitizer, GeospatialEnricher};
use scour_connect::{Connector, CsvConnector, ParquetConnector};
use scour_core::{ErrorPolicy, ParallelExecutor, Pipeline, PipelineBuilder};
use scour_report::{DataQualityReport, ResourceMonitor};
use scour_validate::{PatternValidator, SchemaValidator};

use crate::cli::{RunArgs, SampleArgs};
use crate::config::{
    DestinationConfig, PipelineConfig, ReportConfig, SourceConfig, StepConfig,
};
use crate::sample::sample_frame;

/// What a completed `run` looked like, for the summary table.
#[derive(Debug)]
pub struct RunOutcome {
    pub rows_in: usize,
    pub rows_out: usize,
    pub steps: Vec<String>,
    pub duration: Duration,
    pub destination: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub dry_run: bool,
}

pub fn run_pipeline(args: &RunArgs) -> anyhow::Result<RunOutcome> {
    let config = PipelineConfig::from_path(&args.config)?;

    let source = build_source(&config.source);
    let df = source.load()?;
    info!(rows = df.height(), columns = df.width(), "loaded source");

    let executor = ParallelExecutor::new(
        config.executor.partitions,
        &config.executor.memory_limit,
        config.executor.use_disk,
    )?;

    let mut builder = Pipeline::builder().executor(executor);
    for step in &config.steps {
        builder = add_step(builder, step)?;
    }
    if let Some(incremental) = &config.incremental {
        builder = builder.incremental(&incremental.checkpoint_column, incremental.lookback_days);
    }

    let report_sink = config.report.as_ref().map(build_report);
    if let Some(sink) = &report_sink {
        builder = builder.metrics(sink.clone());
    }

    let pipeline = builder.build();
    let steps: Vec<String> = pipeline.step_names().iter().map(|s| s.to_string()).collect();

    let policy = ErrorPolicy {
        max_error_rate: args.max_error_rate.or(config.error_policy.max_error_rate),
        error_store: config.error_policy.error_store.clone(),
    };

    let mut monitor = ResourceMonitor::new();
    monitor.start();
    let result = pipeline.run(&df, &policy);
    let duration = monitor.stop();
    monitor.alert_on_anomalies();

    // The report covers failed runs too; export before surfacing the error.
    let report_path = match (&report_sink, &config.report) {
        (Some(sink), Some(report_config)) => {
            scour_core::MetricsSink::export(sink.as_ref())?;
            Some(report_config.path.clone())
        }
        _ => None,
    };

    let mut output = result?;
    let rows_out = output.height();

    let destination = match (&config.destination, args.dry_run) {
        (Some(destination), false) => {
            let connector = build_destination(destination);
            connector.save(&mut output)?;
            Some(destination_path(destination))
        }
        (Some(destination), true) => {
            info!("dry run: skipping write to destination");
            Some(destination_path(destination))
        }
        (None, _) => None,
    };

    Ok(RunOutcome {
        rows_in: df.height(),
        rows_out,
        steps,
        duration,
        destination,
        report: report_path,
        dry_run: args.dry_run,
    })
}

pub fn generate_sample(args: &SampleArgs) -> anyhow::Result<()> {
    let mut df = sample_frame(args.rows).context("building sample dataset")?;
    if let Some(parent) = args.output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    CsvConnector::new(&args.output).save(&mut df)?;
    info!(rows = args.rows, path = %args.output.display(), "wrote sample dataset");
    Ok(())
}

fn build_source(config: &SourceConfig) -> Box<dyn Connector> {
    match config {
        SourceConfig::Csv { path, options } => {
            Box::new(CsvConnector::with_options(path, options.clone()))
        }
        SourceConfig::Parquet { path } => Box::new(ParquetConnector::new(path)),
    }
}

fn build_destination(config: &DestinationConfig) -> Box<dyn Connector> {
    match config {
        DestinationConfig::Csv { path, options } => {
            Box::new(CsvConnector::with_options(path, options.clone()))
        }
        DestinationConfig::Parquet {
            path,
            compression,
            partition_by,
        } => {
            let mut connector = ParquetConnector::new(path).with_compression(*compression);
            if let Some(column) = partition_by {
                connector = connector.with_partition_by(column.clone());
            }
            Box::new(connector)
        }
    }
}

fn destination_path(config: &DestinationConfig) -> PathBuf {
    match config {
        DestinationConfig::Csv { path, .. } | DestinationConfig::Parquet { path, .. } => {
            path.clone()
        }
    }
}

fn build_report(config: &ReportConfig) -> Arc<DataQualityReport> {
    let mut report = DataQualityReport::new(&config.path);
    if !config.column_stats {
        report = report.without_column_stats();
    }
    Arc::new(report)
}

fn add_step(builder: PipelineBuilder, step: &StepConfig) -> anyhow::Result<PipelineBuilder> {
    Ok(match step {
        StepConfig::Sanitize { options } => {
            builder.transform(ColumnSanitizer::new(options.clone()))
        }
        StepConfig::Convert { patterns } => {
            builder.transform(BulkTypeConverter::new(patterns.clone()))
        }
        StepConfig::Geocode {
            address_columns,
            add_timezone,
        } => builder.transform(GeospatialEnricher::new(address_columns.clone(), *add_timezone)),
        StepConfig::Schema { rules } => builder.filter(SchemaValidator::new(rules.clone())?),
        StepConfig::Pattern { rules, mode } => {
            builder.filter(PatternValidator::new(rules.clone(), *mode)?)
        }
    })
}
