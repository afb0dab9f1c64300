//! Validators wired into a pipeline.

use std::collections::BTreeMap;

use polars::prelude::{DataFrame, IntoColumn, NamedFrom, Series};
use scour_core::{ErrorPolicy, Pipeline, PipelineError};
use scour_validate::{ColumnRule, ErrorHandling, PatternValidator, RuleType, SchemaValidator};

fn orders() -> DataFrame {
    let ids: Vec<String> = (0..100).map(|i| format!("ORD-{i:08}")).collect();
    let mut emails: Vec<String> = (0..100).map(|i| format!("customer{i}@example.com")).collect();
    for index in (0..100).step_by(5) {
        emails[index] = "invalid_email".to_string();
    }
    DataFrame::new(vec![
        Series::new("order_id".into(), ids).into_column(),
        Series::new("customer_email".into(), emails).into_column(),
    ])
    .unwrap()
}

#[test]
fn schema_filter_narrows_the_run() {
    let rules = BTreeMap::from([(
        "customer_email".to_string(),
        ColumnRule {
            rule_type: Some(RuleType::Email),
            ..ColumnRule::default()
        },
    )]);
    let pipeline = Pipeline::builder()
        .filter(SchemaValidator::new(rules).unwrap())
        .build();

    let result = pipeline.run(&orders(), &ErrorPolicy::default()).unwrap();
    assert_eq!(result.height(), 80);
}

#[test]
fn quarantine_pattern_counts_against_the_error_budget() {
    let rules = BTreeMap::from([(
        "customer_email".to_string(),
        r"[^@\s]+@example\.com$".to_string(),
    )]);
    let pipeline = Pipeline::builder()
        .filter(PatternValidator::new(rules, ErrorHandling::Quarantine).unwrap())
        .build();

    // 20 of 100 rows are rejected: a 10% budget trips, a 25% budget holds.
    let err = pipeline
        .run(&orders(), &ErrorPolicy::with_max_error_rate(0.1))
        .unwrap_err();
    assert!(matches!(err, PipelineError::ErrorRateExceeded { .. }));

    let result = pipeline
        .run(&orders(), &ErrorPolicy::with_max_error_rate(0.25))
        .unwrap();
    assert_eq!(result.height(), 80);
}

#[test]
fn raise_mode_surfaces_as_step_failure() {
    let rules = BTreeMap::from([(
        "customer_email".to_string(),
        r"[^@\s]+@example\.com$".to_string(),
    )]);
    let pipeline = Pipeline::builder()
        .filter(PatternValidator::new(rules, ErrorHandling::Raise).unwrap())
        .build();

    let err = pipeline.run(&orders(), &ErrorPolicy::default()).unwrap_err();
    match err {
        PipelineError::StepExecution { step, .. } => assert_eq!(step, "PatternValidator"),
        other => panic!("expected StepExecution, got {other}"),
    }
}
