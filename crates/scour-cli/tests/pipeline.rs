//! End-to-end run: sample data -> config-driven pipeline -> outputs.

use scour_cli::cli::{RunArgs, SampleArgs};
use scour_cli::commands::{generate_sample, run_pipeline};

#[test]
fn sample_then_run_produces_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("raw/orders.csv");
    let output = dir.path().join("processed/orders");
    let report = dir.path().join("reports/quality.html");

    generate_sample(&SampleArgs {
        output: input.clone(),
        rows: 500,
    })
    .unwrap();

    let config = format!(
        r#"{{
            "source": {{ "type": "csv", "path": "{input}" }},
            "destination": {{
                "type": "parquet",
                "path": "{output}",
                "partition_by": "currency"
            }},
            "steps": [
                {{
                    "type": "sanitize",
                    "remove_chars": ["$", "!"],
                    "columns": ["total_price", "product_name"]
                }},
                {{
                    "type": "convert",
                    "patterns": {{ "total_price": "float", "order_date": "date" }}
                }},
                {{
                    "type": "schema",
                    "rules": {{
                        "order_id": {{ "type": "string", "regex": "ORD-\\d{{8}}" }},
                        "total_price": {{ "type": "float", "min": 0 }}
                    }}
                }},
                {{
                    "type": "pattern",
                    "rules": {{ "customer_email": "[^@\\s]+@[^@\\s]+\\.[^@\\s]+$" }},
                    "mode": "quarantine"
                }}
            ],
            "executor": {{ "partitions": 2, "memory_limit": "512MB", "use_disk": true }},
            "error_policy": {{ "max_error_rate": 0.1 }},
            "report": {{ "path": "{report}" }}
        }}"#,
        input = input.display(),
        output = output.display(),
        report = report.display(),
    );
    let config_path = dir.path().join("pipeline.json");
    std::fs::write(&config_path, config).unwrap();

    let outcome = run_pipeline(&RunArgs {
        config: config_path,
        dry_run: false,
        max_error_rate: None,
    })
    .unwrap();

    // Every 20th sample row has an invalid email: 25 of 500 rows drop,
    // which stays inside the 10% budget.
    assert_eq!(outcome.rows_in, 500);
    assert_eq!(outcome.rows_out, 475);
    assert_eq!(outcome.steps.len(), 4);

    assert!(report.is_file());
    let partitions: Vec<_> = std::fs::read_dir(&output).unwrap().collect();
    assert_eq!(partitions.len(), 3);
}

#[test]
fn tight_error_budget_fails_the_run_but_still_reports() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("orders.csv");
    let report = dir.path().join("quality.html");

    generate_sample(&SampleArgs {
        output: input.clone(),
        rows: 100,
    })
    .unwrap();

    let config = format!(
        r#"{{
            "source": {{ "type": "csv", "path": "{input}" }},
            "steps": [
                {{
                    "type": "pattern",
                    "rules": {{ "customer_email": "[^@\\s]+@[^@\\s]+\\.[^@\\s]+$" }},
                    "mode": "quarantine"
                }}
            ],
            "error_policy": {{ "max_error_rate": 0.01 }},
            "report": {{ "path": "{report}" }}
        }}"#,
        input = input.display(),
        report = report.display(),
    );
    let config_path = dir.path().join("pipeline.json");
    std::fs::write(&config_path, config).unwrap();

    let err = run_pipeline(&RunArgs {
        config: config_path,
        dry_run: false,
        max_error_rate: None,
    })
    .unwrap_err();
    assert!(err.to_string().contains("error rate"));

    // Metrics were still collected and exported for the failed run.
    assert!(report.is_file());
    let html = std::fs::read_to_string(&report).unwrap();
    assert!(html.contains("Completed: false"));
}
