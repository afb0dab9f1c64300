//! Column-level schema validation rules.

use std::collections::BTreeMap;

use polars::prelude::{BooleanChunked, Column, DataFrame, DataType, NewChunkedArray};
use regex::Regex;
use serde::{Deserialize, Serialize};

use scour_common::{any_to_f64, any_to_string, parse_datetime_auto};
use scour_core::Validator;

/// Expected value shape for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    String,
    Float,
    Date,
    Category,
    Email,
}

/// Validation rule for one column (or column-name pattern).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnRule {
    /// Expected type; `string` and `category` carry no type check of their
    /// own and rely on `regex` / `options`.
    #[serde(rename = "type")]
    pub rule_type: Option<RuleType>,
    /// Minimum numeric value, checked together with `type = "float"`.
    pub min: Option<f64>,
    /// Anchored regular expression the value must match from the start.
    pub regex: Option<String>,
    /// Allowed values.
    pub options: Option<Vec<String>>,
}

struct CompiledRule {
    pattern: String,
    rule: ColumnRule,
    regex: Option<Regex>,
}

/// Validates a dataset against per-column rules, producing a keep-mask.
///
/// Rule keys are exact column names or `prefix.*` patterns matched against
/// the frame's columns at run time; rules whose key matches no column are
/// skipped. A row is kept only when every applicable rule accepts it.
pub struct SchemaValidator {
    rules: Vec<CompiledRule>,
    email_regex: Regex,
}

impl SchemaValidator {
    /// Compile the rule set.
    ///
    /// # Errors
    ///
    /// Fails when a rule carries an invalid regular expression.
    pub fn new(rules: BTreeMap<String, ColumnRule>) -> anyhow::Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for (pattern, rule) in rules {
            let regex = match &rule.regex {
                Some(raw) => Some(compile_anchored(raw)?),
                None => None,
            };
            compiled.push(CompiledRule {
                pattern,
                rule,
                regex,
            });
        }
        Ok(Self {
            rules: compiled,
            email_regex: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern"),
        })
    }

    fn rule_mask(&self, col: &Column, compiled: &CompiledRule) -> anyhow::Result<Vec<bool>> {
        let height = col.len();
        let mut keep = vec![true; height];

        for (index, flag) in keep.iter_mut().enumerate() {
            let value = col.get(index)?;
            let text = any_to_string(value.clone());

            if let Some(rule_type) = compiled.rule.rule_type {
                *flag &= match rule_type {
                    RuleType::Float => {
                        let number = any_to_f64(value.clone());
                        match (number, compiled.rule.min) {
                            (Some(n), Some(min)) => n >= min,
                            (Some(_), None) => true,
                            (None, _) => false,
                        }
                    }
                    RuleType::Date => is_date_value(col.dtype(), &value, &text),
                    RuleType::Email => self.email_regex.is_match(&text),
                    RuleType::String | RuleType::Category => true,
                };
            }

            if let Some(regex) = &compiled.regex {
                *flag &= regex.is_match(&text);
            }

            if let Some(options) = &compiled.rule.options {
                *flag &= options.iter().any(|option| option == &text);
            }
        }

        Ok(keep)
    }
}

impl Validator for SchemaValidator {
    fn validate(&self, df: &DataFrame) -> anyhow::Result<BooleanChunked> {
        let mut keep = vec![true; df.height()];

        for compiled in &self.rules {
            let matching: Vec<String> = df
                .get_column_names()
                .iter()
                .filter(|name| matches_pattern(name.as_str(), &compiled.pattern))
                .map(|name| name.to_string())
                .collect();
            if matching.is_empty() {
                tracing::debug!(rule = %compiled.pattern, "rule matches no column, skipping");
                continue;
            }

            for name in matching {
                let col = df.column(&name)?;
                let mask = self.rule_mask(col, compiled)?;
                for (flag, ok) in keep.iter_mut().zip(mask) {
                    *flag &= ok;
                }
            }
        }

        Ok(BooleanChunked::from_slice("schema".into(), &keep))
    }
}

fn is_date_value(
    dtype: &DataType,
    value: &polars::prelude::AnyValue<'_>,
    text: &str,
) -> bool {
    if matches!(dtype, DataType::Date | DataType::Datetime(_, _)) {
        return !matches!(value, polars::prelude::AnyValue::Null);
    }
    parse_datetime_auto(text).is_some()
}

/// Exact match, or prefix match for patterns ending in `.*`.
fn matches_pattern(column: &str, pattern: &str) -> bool {
    match pattern.strip_suffix(".*") {
        Some(prefix) => column.starts_with(prefix),
        None => column == pattern,
    }
}

/// Compile a pattern that must match from the start of the value.
pub(crate) fn compile_anchored(pattern: &str) -> anyhow::Result<Regex> {
    let anchored = if pattern.starts_with('^') {
        pattern.to_string()
    } else {
        format!("^(?:{pattern})")
    };
    Regex::new(&anchored).map_err(|e| anyhow::anyhow!("invalid pattern '{pattern}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{IntoColumn, NamedFrom, Series};

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new(
                "order_id".into(),
                vec!["ORD-00000001", "BAD-1", "ORD-00000003"],
            )
            .into_column(),
            Series::new("total_price".into(), vec![10.0f64, -5.0, 20.0]).into_column(),
            Series::new(
                "customer_email".into(),
                vec!["a@example.com", "b@example.com", "invalid_email"],
            )
            .into_column(),
            Series::new("product_name".into(), vec!["A", "B", "C"]).into_column(),
        ])
        .unwrap()
    }

    fn rules() -> BTreeMap<String, ColumnRule> {
        BTreeMap::from([
            (
                "order_id".to_string(),
                ColumnRule {
                    rule_type: Some(RuleType::String),
                    regex: Some(r"ORD-\d{8}".to_string()),
                    ..ColumnRule::default()
                },
            ),
            (
                "total_price".to_string(),
                ColumnRule {
                    rule_type: Some(RuleType::Float),
                    min: Some(0.0),
                    ..ColumnRule::default()
                },
            ),
            (
                "customer_email".to_string(),
                ColumnRule {
                    rule_type: Some(RuleType::Email),
                    ..ColumnRule::default()
                },
            ),
        ])
    }

    #[test]
    fn each_rule_contributes_to_the_mask() {
        let validator = SchemaValidator::new(rules()).unwrap();
        let mask = validator.validate(&frame()).unwrap();

        // Row 0 passes everything; row 1 fails the id regex and the price
        // minimum; row 2 fails the email shape.
        let flags: Vec<bool> = mask.into_iter().map(|v| v.unwrap_or(false)).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn prefix_rules_apply_to_dynamic_columns() {
        let rules = BTreeMap::from([(
            "product_.*".to_string(),
            ColumnRule {
                options: Some(vec!["A".to_string(), "B".to_string()]),
                ..ColumnRule::default()
            },
        )]);
        let validator = SchemaValidator::new(rules).unwrap();
        let mask = validator.validate(&frame()).unwrap();

        let flags: Vec<bool> = mask.into_iter().map(|v| v.unwrap_or(false)).collect();
        assert_eq!(flags, vec![true, true, false]);
    }

    #[test]
    fn rules_for_absent_columns_are_skipped() {
        let rules = BTreeMap::from([(
            "missing_column".to_string(),
            ColumnRule {
                rule_type: Some(RuleType::Float),
                ..ColumnRule::default()
            },
        )]);
        let validator = SchemaValidator::new(rules).unwrap();
        let mask = validator.validate(&frame()).unwrap();
        assert_eq!(mask.sum(), Some(3));
    }

    #[test]
    fn invalid_regex_fails_construction() {
        let rules = BTreeMap::from([(
            "order_id".to_string(),
            ColumnRule {
                regex: Some("(".to_string()),
                ..ColumnRule::default()
            },
        )]);
        assert!(SchemaValidator::new(rules).is_err());
    }
}
