//! Pattern-driven bulk type conversion.

use std::collections::BTreeMap;

use polars::prelude::{
    BooleanChunked, Column, DataFrame, DataType, Float64Chunked, Int64Chunked, IntoSeries,
    NewChunkedArray, TimeUnit,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use scour_common::{any_to_string, is_numeric_dtype, parse_bool, parse_datetime_auto, parse_f64};
use scour_core::Transform;

/// Conversion target for matched columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Float,
    Date,
    Boolean,
    String,
}

/// Converts column types based on name patterns.
///
/// A pattern is either an exact column name or a prefix match written as
/// `prefix.*`. A column that fails to convert keeps its original values;
/// the failure is logged and the run continues.
#[derive(Debug, Clone)]
pub struct BulkTypeConverter {
    patterns: BTreeMap<String, TargetType>,
}

impl BulkTypeConverter {
    pub fn new(patterns: BTreeMap<String, TargetType>) -> Self {
        Self { patterns }
    }
}

impl Transform for BulkTypeConverter {
    fn process(&self, df: &DataFrame) -> anyhow::Result<DataFrame> {
        let mut result = df.clone();

        for (pattern, target) in &self.patterns {
            let matching: Vec<String> = df
                .get_column_names()
                .iter()
                .filter(|name| matches_pattern(name.as_str(), pattern))
                .map(|name| name.to_string())
                .collect();

            for name in matching {
                let col = result.column(&name)?;
                match convert_column(col, *target) {
                    Ok(converted) => {
                        result.replace(&name, converted.take_materialized_series())?;
                    }
                    Err(error) => {
                        warn!(column = %name, target = ?target, %error, "type conversion failed");
                    }
                }
            }
        }

        Ok(result)
    }
}

/// Exact match, or prefix match for patterns ending in `.*`.
fn matches_pattern(column: &str, pattern: &str) -> bool {
    match pattern.strip_suffix(".*") {
        Some(prefix) => column.starts_with(prefix),
        None => column == pattern,
    }
}

fn convert_column(col: &Column, target: TargetType) -> anyhow::Result<Column> {
    let name = col.name().clone();
    match target {
        TargetType::Float => {
            if is_numeric_dtype(col.dtype()) {
                return Ok(col.cast(&DataType::Float64)?);
            }
            let ca = col.str()?;
            let mut values: Vec<Option<f64>> = Vec::with_capacity(ca.len());
            for value in ca {
                match value {
                    None => values.push(None),
                    Some(raw) => match parse_f64(raw) {
                        Some(parsed) => values.push(Some(parsed)),
                        None => anyhow::bail!("'{raw}' is not a number"),
                    },
                }
            }
            Ok(Float64Chunked::from_iter_options(name, values.into_iter())
                .into_series()
                .into())
        }
        TargetType::Date => {
            if matches!(col.dtype(), DataType::Date | DataType::Datetime(_, _)) {
                return Ok(col.clone());
            }
            let ca = col.str()?;
            let mut stamps: Vec<Option<i64>> = Vec::with_capacity(ca.len());
            for value in ca {
                match value {
                    None => stamps.push(None),
                    Some(raw) => match parse_datetime_auto(raw) {
                        Some(ts) => stamps.push(Some(ts.and_utc().timestamp_millis())),
                        None => anyhow::bail!("'{raw}' is not a date"),
                    },
                }
            }
            Ok(Int64Chunked::from_iter_options(name, stamps.into_iter())
                .into_datetime(TimeUnit::Milliseconds, None)
                .into_series()
                .into())
        }
        TargetType::Boolean => {
            if col.dtype() == &DataType::Boolean {
                return Ok(col.clone());
            }
            let ca = col.str()?;
            let mut values: Vec<Option<bool>> = Vec::with_capacity(ca.len());
            for value in ca {
                match value {
                    None => values.push(None),
                    Some(raw) => match parse_bool(raw) {
                        Some(parsed) => values.push(Some(parsed)),
                        None => anyhow::bail!("'{raw}' is not a boolean"),
                    },
                }
            }
            Ok(BooleanChunked::from_iter_options(name, values.into_iter())
                .into_series()
                .into())
        }
        TargetType::String => {
            if col.dtype() == &DataType::String {
                return Ok(col.clone());
            }
            let mut values: Vec<Option<String>> = Vec::with_capacity(col.len());
            for index in 0..col.len() {
                let value = col.get(index)?;
                if matches!(value, polars::prelude::AnyValue::Null) {
                    values.push(None);
                } else {
                    values.push(Some(any_to_string(value)));
                }
            }
            Ok(Column::new(name, values))
        }
    }
}
