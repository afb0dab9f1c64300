//! Regex pattern validation over string columns.

use std::collections::BTreeMap;

use polars::prelude::{BooleanChunked, DataFrame, NewChunkedArray};
use regex::Regex;
use serde::{Deserialize, Serialize};

use scour_core::Validator;

use crate::schema::compile_anchored;

/// What to do with rows that fail a pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorHandling {
    /// Fail the run when any row mismatches.
    #[default]
    Raise,
    /// Return the mask so the pipeline narrows to matching rows.
    Quarantine,
}

/// Validates string columns against anchored regular expressions.
///
/// Patterns are compiled once at construction. Columns named in the rule
/// set but absent from the frame are skipped; null values never match.
pub struct PatternValidator {
    patterns: Vec<(String, Regex)>,
    mode: ErrorHandling,
}

impl PatternValidator {
    /// Compile the rule set.
    ///
    /// # Errors
    ///
    /// Fails when any pattern is an invalid regular expression.
    pub fn new(rules: BTreeMap<String, String>, mode: ErrorHandling) -> anyhow::Result<Self> {
        let mut patterns = Vec::with_capacity(rules.len());
        for (column, pattern) in rules {
            patterns.push((column, compile_anchored(&pattern)?));
        }
        Ok(Self { patterns, mode })
    }
}

impl Validator for PatternValidator {
    fn validate(&self, df: &DataFrame) -> anyhow::Result<BooleanChunked> {
        let mut keep = vec![true; df.height()];

        for (column, regex) in &self.patterns {
            let Ok(col) = df.column(column) else { continue };
            let ca = col.str()?;
            for (flag, value) in keep.iter_mut().zip(ca) {
                *flag &= value.is_some_and(|raw| regex.is_match(raw));
            }
        }

        let rejected = keep.iter().filter(|flag| !**flag).count();
        if self.mode == ErrorHandling::Raise && rejected > 0 {
            anyhow::bail!("pattern validation failed for {rejected} rows");
        }

        Ok(BooleanChunked::from_slice("pattern".into(), &keep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{IntoColumn, NamedFrom, Series};

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new(
                "customer_email".into(),
                vec![Some("a@example.com"), Some("nope"), None],
            )
            .into_column(),
        ])
        .unwrap()
    }

    fn email_rules() -> BTreeMap<String, String> {
        BTreeMap::from([(
            "customer_email".to_string(),
            r"[^@\s]+@[^@\s]+\.[^@\s]+$".to_string(),
        )])
    }

    #[test]
    fn quarantine_returns_mask() {
        let validator = PatternValidator::new(email_rules(), ErrorHandling::Quarantine).unwrap();
        let mask = validator.validate(&frame()).unwrap();

        let flags: Vec<bool> = mask.into_iter().map(|v| v.unwrap_or(false)).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn raise_fails_on_any_mismatch() {
        let validator = PatternValidator::new(email_rules(), ErrorHandling::Raise).unwrap();
        let err = validator.validate(&frame()).unwrap_err();
        assert!(err.to_string().contains("2 rows"));
    }

    #[test]
    fn raise_passes_when_all_rows_match() {
        let df = DataFrame::new(vec![
            Series::new("customer_email".into(), vec!["a@example.com"]).into_column(),
        ])
        .unwrap();
        let validator = PatternValidator::new(email_rules(), ErrorHandling::Raise).unwrap();
        assert!(validator.validate(&df).is_ok());
    }
}
