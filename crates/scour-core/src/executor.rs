//! Partitioned step execution with memory-aware fallback.
//!
//! The executor splits a dataset into contiguous row-range partitions, runs
//! the full step chain per partition on scoped worker threads, and
//! recombines results in partition order. A failed parallel run either
//! falls back to a single-threaded re-run (when disk fallback is enabled)
//! or propagates the first partition failure.

use std::thread;

use polars::prelude::DataFrame;
use sysinfo::System;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::step::PipelineStep;

/// Default per-partition memory limit (4 GiB).
pub const DEFAULT_MEMORY_LIMIT: u64 = 4 * 1024 * 1024 * 1024;

/// Executor for running pipeline steps across row partitions.
///
/// Configuration is fixed at construction. `partitions <= 1` selects the
/// single-threaded path, which is also the fallback path for failed
/// parallel runs.
#[derive(Debug, Clone)]
pub struct ParallelExecutor {
    partitions: usize,
    memory_limit: u64,
    use_disk: bool,
}

impl ParallelExecutor {
    /// Create an executor with a human-readable memory limit such as
    /// `"4GB"` or `"512MB"`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] when the limit string is
    /// malformed, or when `memory_limit * partitions` exceeds total system
    /// memory while disk fallback is disabled.
    pub fn new(partitions: usize, memory_limit: &str, use_disk: bool) -> Result<Self> {
        Self::with_limit_bytes(partitions, parse_memory_limit(memory_limit)?, use_disk)
    }

    /// Create an executor with an explicit per-partition byte limit.
    pub fn with_limit_bytes(partitions: usize, memory_limit: u64, use_disk: bool) -> Result<Self> {
        if partitions == 0 {
            return Err(PipelineError::Configuration {
                reason: "partition count must be at least 1".to_string(),
            });
        }
        if memory_limit == 0 {
            return Err(PipelineError::Configuration {
                reason: "memory limit must be greater than zero".to_string(),
            });
        }
        validate_budget(memory_limit, partitions, total_system_memory(), use_disk)?;
        Ok(Self {
            partitions,
            memory_limit,
            use_disk,
        })
    }

    /// A single-partition executor.
    ///
    /// Runs everything on the calling thread; the memory budget guard does
    /// not apply because no parallel workers are spawned. Used as the
    /// builder default.
    pub fn sequential() -> Self {
        Self {
            partitions: 1,
            memory_limit: DEFAULT_MEMORY_LIMIT,
            use_disk: false,
        }
    }

    /// Configured partition count.
    pub fn partitions(&self) -> usize {
        self.partitions
    }

    /// Configured per-partition memory limit in bytes.
    pub fn memory_limit(&self) -> u64 {
        self.memory_limit
    }

    /// Whether disk fallback is enabled.
    pub fn use_disk(&self) -> bool {
        self.use_disk
    }

    /// Run the step chain over the dataset.
    ///
    /// With more than one partition the dataset is split into contiguous
    /// slices of roughly `height / partitions` rows (the last slice absorbs
    /// the remainder), each slice runs the full chain on its own worker
    /// thread, and results are concatenated in partition order, never
    /// completion order. Any partition failure either triggers a
    /// single-threaded re-run of the whole input (disk fallback enabled) or
    /// propagates to the caller with no result.
    pub fn execute(&self, df: &DataFrame, steps: &[PipelineStep]) -> Result<DataFrame> {
        if self.partitions <= 1 {
            return run_chain(df, steps);
        }

        let parts = split_partitions(df, self.partitions);
        debug!(
            rows = df.height(),
            partitions = parts.len(),
            "dispatching partition workers"
        );

        match execute_partitions(&parts, steps) {
            Ok(frames) => combine(frames),
            Err(error) if self.use_disk => {
                warn!(%error, "parallel execution failed, falling back to single-threaded run");
                run_chain(df, steps)
            }
            Err(error) => Err(error),
        }
    }

    /// Advisory partition count for a dataset of an estimated byte size.
    ///
    /// Bounded by available memory per row, by CPU count minus one, and by
    /// the configured partition count; always at least 1. This is a
    /// planning aid for callers; `execute` never consults it.
    pub fn optimal_partitions(&self, df: &DataFrame, estimated_total_bytes: u64) -> usize {
        let rows = df.height() as u64;
        if rows == 0 {
            return 1;
        }
        let available = available_system_memory();
        let bytes_per_row = (estimated_total_bytes / rows).max(1);
        let by_memory = (available / bytes_per_row.saturating_mul(rows).max(1)) as usize;
        let cpus = thread::available_parallelism().map_or(1, std::num::NonZero::get);
        let by_cpu = cpus.saturating_sub(1);
        by_memory.min(by_cpu).min(self.partitions).max(1)
    }
}

/// Run all steps, in order, on the calling thread.
fn run_chain(df: &DataFrame, steps: &[PipelineStep]) -> Result<DataFrame> {
    let mut result = df.clone();
    for step in steps {
        result = step.execute(&result)?;
    }
    Ok(result)
}

/// Split into `partitions` contiguous slices; the last absorbs the remainder.
fn split_partitions(df: &DataFrame, partitions: usize) -> Vec<DataFrame> {
    let height = df.height();
    let base = height / partitions;
    let mut parts = Vec::with_capacity(partitions);
    for index in 0..partitions {
        let offset = index * base;
        let len = if index == partitions - 1 {
            height - offset
        } else {
            base
        };
        parts.push(df.slice(offset as i64, len));
    }
    parts
}

/// Run the chain on every partition concurrently.
///
/// One scoped thread per partition; results are collected by partition
/// index. Blocks until every worker has finished, then reports the first
/// failure (by index) if any. A panicked worker counts as a failed
/// partition.
fn execute_partitions(parts: &[DataFrame], steps: &[PipelineStep]) -> Result<Vec<DataFrame>> {
    let results: Vec<Result<DataFrame>> = thread::scope(|scope| {
        let handles: Vec<_> = parts
            .iter()
            .map(|part| scope.spawn(move || run_chain(part, steps)))
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| {
                handle
                    .join()
                    .unwrap_or(Err(PipelineError::WorkerPanic { partition: index }))
            })
            .collect()
    });

    let mut frames = Vec::with_capacity(results.len());
    for result in results {
        frames.push(result?);
    }
    Ok(frames)
}

/// Concatenate partition results in partition order.
fn combine(frames: Vec<DataFrame>) -> Result<DataFrame> {
    let mut iter = frames.into_iter();
    let Some(mut combined) = iter.next() else {
        return Ok(DataFrame::empty());
    };
    for frame in iter {
        combined.vstack_mut(&frame)?;
    }
    Ok(combined)
}

/// Parse a memory limit string such as `"4GB"`, `"512MB"`, or `"64KB"`.
pub fn parse_memory_limit(limit: &str) -> Result<u64> {
    let trimmed = limit.trim();
    if trimmed.len() < 3 {
        return Err(PipelineError::Configuration {
            reason: format!("invalid memory limit '{limit}'"),
        });
    }
    let (number, unit) = trimmed.split_at(trimmed.len() - 2);
    let factor: u64 = match unit.to_ascii_uppercase().as_str() {
        "GB" => 1024 * 1024 * 1024,
        "MB" => 1024 * 1024,
        "KB" => 1024,
        _ => {
            return Err(PipelineError::Configuration {
                reason: format!("invalid memory unit '{unit}', use GB, MB, or KB"),
            });
        }
    };
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| PipelineError::Configuration {
            reason: format!("invalid memory limit '{limit}'"),
        })?;
    if value <= 0.0 {
        return Err(PipelineError::Configuration {
            reason: format!("memory limit '{limit}' must be positive"),
        });
    }
    Ok((value * factor as f64) as u64)
}

/// Fail-fast guard: the combined worker budget must fit in system memory
/// unless disk fallback is enabled.
fn validate_budget(
    memory_limit: u64,
    partitions: usize,
    total_memory: u64,
    use_disk: bool,
) -> Result<()> {
    let required = memory_limit.saturating_mul(partitions as u64);
    if required > total_memory && !use_disk {
        return Err(PipelineError::Configuration {
            reason: format!(
                "required memory ({:.1} GiB) exceeds system memory ({:.1} GiB); \
                 enable disk fallback or reduce partitions",
                gib(required),
                gib(total_memory)
            ),
        });
    }
    Ok(())
}

fn gib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0 * 1024.0)
}

/// Total system memory in bytes.
pub(crate) fn total_system_memory() -> u64 {
    let mut system = System::new();
    system.refresh_memory();
    system.total_memory()
}

fn available_system_memory() -> u64 {
    let mut system = System::new();
    system.refresh_memory();
    system.available_memory()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{IntoColumn, NamedFrom, Series};

    fn frame(n: i64) -> DataFrame {
        let values: Vec<i64> = (0..n).collect();
        DataFrame::new(vec![Series::new("value".into(), values).into_column()]).unwrap()
    }

    #[test]
    fn parse_memory_limit_units() {
        assert_eq!(parse_memory_limit("4GB").unwrap(), 4 * 1024 * 1024 * 1024);
        assert_eq!(parse_memory_limit("512MB").unwrap(), 512 * 1024 * 1024);
        assert_eq!(parse_memory_limit("1.5kb").unwrap(), 1536);
    }

    #[test]
    fn parse_memory_limit_rejects_garbage() {
        assert!(parse_memory_limit("4TB").is_err());
        assert!(parse_memory_limit("GB").is_err());
        assert!(parse_memory_limit("-1GB").is_err());
        assert!(parse_memory_limit("").is_err());
    }

    #[test]
    fn split_covers_all_rows_with_remainder_in_last() {
        let df = frame(10);
        let parts = split_partitions(&df, 3);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].height(), 3);
        assert_eq!(parts[1].height(), 3);
        assert_eq!(parts[2].height(), 4);
    }

    #[test]
    fn split_with_fewer_rows_than_partitions() {
        let df = frame(2);
        let parts = split_partitions(&df, 4);
        assert_eq!(parts.len(), 4);
        let total: usize = parts.iter().map(polars::prelude::DataFrame::height).sum();
        assert_eq!(total, 2);
        // All rows land in the last slice when height / partitions == 0.
        assert_eq!(parts[3].height(), 2);
    }

    #[test]
    fn budget_guard_requires_disk_fallback() {
        let total = 8 * 1024 * 1024 * 1024u64;
        assert!(validate_budget(total, 2, total, false).is_err());
        assert!(validate_budget(total, 2, total, true).is_ok());
        assert!(validate_budget(total / 4, 2, total, false).is_ok());
    }

    #[test]
    fn zero_partitions_rejected() {
        assert!(ParallelExecutor::with_limit_bytes(0, 1024, false).is_err());
        assert!(ParallelExecutor::with_limit_bytes(1, 0, false).is_err());
    }
}
