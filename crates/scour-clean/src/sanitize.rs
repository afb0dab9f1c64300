//! String column sanitizing.

use polars::prelude::{DataFrame, DataType, IntoSeries, StringChunkedBuilder};
use serde::{Deserialize, Serialize};

use scour_core::Transform;

/// Case folding applied after whitespace stripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseFold {
    Lower,
    Upper,
}

/// Sanitizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeOptions {
    /// Strip leading and trailing whitespace.
    pub strip_whitespace: bool,
    /// Literal substrings removed from every value, e.g. `"$"`, `"%"`.
    pub remove_chars: Vec<String>,
    /// Columns to sanitize; all string columns when unset. Configured
    /// columns missing from the frame are skipped.
    pub columns: Option<Vec<String>>,
    /// Optional case folding.
    pub case: Option<CaseFold>,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            strip_whitespace: true,
            remove_chars: Vec::new(),
            columns: None,
            case: None,
        }
    }
}

/// Cleans string columns: whitespace, case, and unwanted characters.
#[derive(Debug, Clone, Default)]
pub struct ColumnSanitizer {
    options: SanitizeOptions,
}

impl ColumnSanitizer {
    pub fn new(options: SanitizeOptions) -> Self {
        Self { options }
    }

    fn clean_value(&self, raw: &str) -> String {
        let mut value = if self.options.strip_whitespace {
            raw.trim().to_string()
        } else {
            raw.to_string()
        };
        match self.options.case {
            Some(CaseFold::Lower) => value = value.to_lowercase(),
            Some(CaseFold::Upper) => value = value.to_uppercase(),
            None => {}
        }
        for token in &self.options.remove_chars {
            if value.contains(token.as_str()) {
                value = value.replace(token.as_str(), "");
            }
        }
        value
    }

    fn target_columns(&self, df: &DataFrame) -> Vec<String> {
        match &self.options.columns {
            Some(columns) => columns
                .iter()
                .filter(|name| df.column(name).is_ok())
                .cloned()
                .collect(),
            None => df
                .get_columns()
                .iter()
                .filter(|col| col.dtype() == &DataType::String)
                .map(|col| col.name().to_string())
                .collect(),
        }
    }
}

impl Transform for ColumnSanitizer {
    fn process(&self, df: &DataFrame) -> anyhow::Result<DataFrame> {
        let mut result = df.clone();

        for name in self.target_columns(df) {
            let col = result.column(&name)?;
            // Only string columns can be sanitized; configured non-string
            // columns pass through untouched.
            let Ok(ca) = col.str() else { continue };

            let mut builder = StringChunkedBuilder::new(name.as_str().into(), ca.len());
            for value in ca {
                match value {
                    Some(raw) => builder.append_value(self.clean_value(raw)),
                    None => builder.append_null(),
                }
            }
            let cleaned = builder.finish();
            result.replace(&name, cleaned.into_series())?;
        }

        Ok(result)
    }
}
