//! Partitioned executor behavior: ordering, fallback, construction guard.

use polars::prelude::{DataFrame, IntoColumn, NamedFrom, Series};
use proptest::prelude::{ProptestConfig, proptest};
use scour_core::{ParallelExecutor, PipelineError, PipelineStep, Transform};

struct Identity;

impl Transform for Identity {
    fn process(&self, df: &DataFrame) -> anyhow::Result<DataFrame> {
        Ok(df.clone())
    }
}

/// Fails when every row in the frame exceeds the threshold, so a tail
/// partition of a sorted column trips it while the full dataset passes.
struct FailWhenAllAbove {
    threshold: i64,
}

impl Transform for FailWhenAllAbove {
    fn process(&self, df: &DataFrame) -> anyhow::Result<DataFrame> {
        let values = df.column("value")?.i64()?;
        let all_above = values.into_iter().flatten().all(|v| v > self.threshold);
        if df.height() > 0 && all_above {
            anyhow::bail!("every value exceeds {}", self.threshold);
        }
        Ok(df.clone())
    }
}

struct PanicOn {
    value: i64,
}

impl Transform for PanicOn {
    fn process(&self, df: &DataFrame) -> anyhow::Result<DataFrame> {
        let values = df.column("value")?.i64()?;
        if values.into_iter().flatten().any(|v| v == self.value) {
            panic!("poison value reached");
        }
        Ok(df.clone())
    }
}

fn frame(n: i64) -> DataFrame {
    let values: Vec<i64> = (0..n).collect();
    DataFrame::new(vec![Series::new("value".into(), values).into_column()]).unwrap()
}

#[test]
fn partitioned_identity_preserves_row_order() {
    let df = frame(103);
    let executor = ParallelExecutor::with_limit_bytes(4, 1024 * 1024, true).unwrap();
    let steps = vec![PipelineStep::transform(Identity)];

    let result = executor.execute(&df, &steps).unwrap();
    assert!(result.equals(&df));
}

#[test]
fn fewer_rows_than_partitions_still_covered() {
    let df = frame(3);
    let executor = ParallelExecutor::with_limit_bytes(8, 1024, true).unwrap();
    let steps = vec![PipelineStep::transform(Identity)];

    let result = executor.execute(&df, &steps).unwrap();
    assert!(result.equals(&df));
}

#[test]
fn empty_input_yields_empty_output() {
    let df = frame(0);
    let executor = ParallelExecutor::with_limit_bytes(3, 1024, true).unwrap();
    let steps = vec![PipelineStep::transform(Identity)];

    let result = executor.execute(&df, &steps).unwrap();
    assert_eq!(result.height(), 0);
}

#[test]
fn construction_guard_rejects_oversized_budget() {
    let mut system = sysinfo::System::new();
    system.refresh_memory();
    let total = system.total_memory();

    let err = ParallelExecutor::with_limit_bytes(2, total, false).unwrap_err();
    assert!(matches!(err, PipelineError::Configuration { .. }));

    // Disk fallback lifts the guard.
    assert!(ParallelExecutor::with_limit_bytes(2, total, true).is_ok());
}

#[test]
fn partial_failure_falls_back_to_sequential_run() {
    // Sorted 0..100 over 4 partitions: only the last partition (rows
    // 75..99) is entirely above 70, so exactly one worker fails while the
    // sequential fallback over the whole dataset succeeds.
    let df = frame(100);
    let executor = ParallelExecutor::with_limit_bytes(4, 1024 * 1024, true).unwrap();
    let steps = vec![PipelineStep::transform(FailWhenAllAbove { threshold: 70 })];

    let result = executor.execute(&df, &steps).unwrap();
    assert!(result.equals(&df));
}

#[test]
fn partial_failure_without_fallback_propagates() {
    let df = frame(100);
    let executor = ParallelExecutor::with_limit_bytes(4, 1024 * 1024, false).unwrap();
    let steps = vec![PipelineStep::transform(FailWhenAllAbove { threshold: 70 })];

    let err = executor.execute(&df, &steps).unwrap_err();
    match err {
        PipelineError::StepExecution { step, .. } => assert_eq!(step, "FailWhenAllAbove"),
        other => panic!("expected StepExecution, got {other}"),
    }
}

#[test]
fn panicked_worker_reports_its_partition() {
    // Value 60 lands in the third of four partitions (rows 50..74).
    let df = frame(100);
    let executor = ParallelExecutor::with_limit_bytes(4, 1024 * 1024, false).unwrap();
    let steps = vec![PipelineStep::transform(PanicOn { value: 60 })];

    let err = executor.execute(&df, &steps).unwrap_err();
    assert!(matches!(err, PipelineError::WorkerPanic { partition: 2 }));
}

#[test]
fn optimal_partitions_is_at_least_one() {
    let executor = ParallelExecutor::with_limit_bytes(4, 1024 * 1024, true).unwrap();
    let df = frame(10);
    let hint = executor.optimal_partitions(&df, u64::MAX);
    assert!(hint >= 1);
    assert!(hint <= 4);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn identity_chain_preserves_any_frame(rows in 0i64..200, partitions in 1usize..6) {
        let df = frame(rows);
        let executor = ParallelExecutor::with_limit_bytes(partitions, 1024, true).unwrap();
        let steps = vec![PipelineStep::transform(Identity)];

        let result = executor.execute(&df, &steps).unwrap();
        assert!(result.equals(&df));
    }
}
