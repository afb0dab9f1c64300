//! Cleaning units chained through a pipeline.

use std::collections::BTreeMap;

use polars::prelude::{DataFrame, DataType, IntoColumn, NamedFrom, Series};
use scour_clean::{
    BulkTypeConverter, ColumnSanitizer, GeospatialEnricher, SanitizeOptions, TargetType,
};
use scour_core::{ErrorPolicy, ParallelExecutor, Pipeline};

fn dirty_orders() -> DataFrame {
    DataFrame::new(vec![
        Series::new(
            "total_price".into(),
            vec!["$10.50", " 20.00 ", "$7.25", "14.00"],
        )
        .into_column(),
        Series::new(
            "customer_address".into(),
            vec!["1 Main St", "2 Side Ave", "1 Main St", "9 High Rd"],
        )
        .into_column(),
        Series::new(
            "product_name".into(),
            vec!["  Widget  ", "Gadget!", "Widget", " Gizmo "],
        )
        .into_column(),
    ])
    .unwrap()
}

#[test]
fn sanitize_then_convert_then_enrich() {
    let sanitizer = ColumnSanitizer::new(SanitizeOptions {
        remove_chars: vec!["$".to_string(), "!".to_string()],
        ..SanitizeOptions::default()
    });
    let converter = BulkTypeConverter::new(BTreeMap::from([(
        "total_price".to_string(),
        TargetType::Float,
    )]));
    let enricher = GeospatialEnricher::new(vec!["customer_address".to_string()], true);

    let pipeline = Pipeline::builder()
        .transform(sanitizer)
        .transform(converter)
        .transform(enricher)
        .executor(ParallelExecutor::with_limit_bytes(2, 1024 * 1024, true).unwrap())
        .build();

    let df = dirty_orders();
    let out = pipeline.run(&df, &ErrorPolicy::with_max_error_rate(0.0)).unwrap();

    // Transform-only chain: no rows lost, three enrichment columns added.
    assert_eq!(out.height(), 4);
    assert_eq!(out.width(), 6);

    let prices = out.column("total_price").unwrap();
    assert_eq!(prices.dtype(), &DataType::Float64);
    let prices = prices.f64().unwrap();
    assert_eq!(prices.get(0), Some(10.5));
    assert_eq!(prices.get(1), Some(20.0));

    // The same address geocodes identically even across partitions.
    let lats = out.column("customer_address_lat").unwrap();
    let lats = lats.f64().unwrap();
    assert_eq!(lats.get(0), lats.get(2));

    let names = out.column("product_name").unwrap();
    assert_eq!(names.str().unwrap().get(0), Some("Widget"));
}
