//! CSV source/destination connector.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use polars::prelude::{
    CsvParseOptions, CsvReadOptions, CsvWriter, DataFrame, DataType, Int64Chunked, IntoSeries,
    NewChunkedArray, NullValues, SerReader, SerWriter, TimeUnit,
};
use serde::{Deserialize, Serialize};

use scour_common::{parse_datetime_auto, parse_datetime_with};

use crate::Connector;
use crate::error::{ConnectError, Result};

/// Sentinel format selecting automatic datetime inference for a column.
pub const AUTO_DATETIME_FORMAT: &str = "auto";

/// CSV load/save options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Field separator.
    pub delimiter: char,
    /// Tokens treated as null on load, e.g. `"NA"`, `"N/A"`.
    pub null_values: Vec<String>,
    /// Columns to parse into datetimes, mapping column name to a chrono
    /// format string or [`AUTO_DATETIME_FORMAT`].
    pub datetime_formats: BTreeMap<String, String>,
    /// Load only the first N data rows when set.
    pub sample_rows: Option<usize>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            null_values: Vec::new(),
            datetime_formats: BTreeMap::new(),
            sample_rows: None,
        }
    }
}

/// Reads and writes CSV files with header rows.
#[derive(Debug, Clone)]
pub struct CsvConnector {
    path: PathBuf,
    options: CsvOptions,
}

impl CsvConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: CsvOptions::default(),
        }
    }

    pub fn with_options(path: impl Into<PathBuf>, options: CsvOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Connector for CsvConnector {
    fn load(&self) -> Result<DataFrame> {
        validate_encoding(&self.path)?;

        let mut parse_options = CsvParseOptions::default().with_separator(self.options.delimiter as u8);
        if !self.options.null_values.is_empty() {
            let tokens = self
                .options
                .null_values
                .iter()
                .map(|token| token.as_str().into())
                .collect();
            parse_options = parse_options.with_null_values(Some(NullValues::AllColumns(tokens)));
        }

        let mut read_options = CsvReadOptions::default()
            .with_has_header(true)
            .with_parse_options(parse_options);
        if let Some(rows) = self.options.sample_rows {
            read_options = read_options.with_n_rows(Some(rows));
        }

        let mut df = read_options
            .try_into_reader_with_file_path(Some(self.path.clone()))
            .map_err(|e| ConnectError::Parse {
                path: self.path.clone(),
                message: e.to_string(),
            })?
            .finish()
            .map_err(|e| ConnectError::Parse {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        for (column, format) in &self.options.datetime_formats {
            parse_datetime_column(&mut df, column, format, &self.path)?;
        }

        tracing::debug!(
            path = %self.path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded CSV"
        );
        Ok(df)
    }

    fn save(&self, df: &mut DataFrame) -> Result<()> {
        let file = File::create(&self.path).map_err(|source| ConnectError::FileWrite {
            path: self.path.clone(),
            source,
        })?;
        CsvWriter::new(file)
            .include_header(true)
            .with_separator(self.options.delimiter as u8)
            .finish(df)?;
        Ok(())
    }
}

/// Reject UTF-16 input early; Polars expects UTF-8.
fn validate_encoding(path: &Path) -> Result<()> {
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConnectError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConnectError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let mut buffer = [0u8; 2];
    let bytes_read = file.read(&mut buffer).map_err(|e| ConnectError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes_read >= 2 {
        if buffer == [0xFF, 0xFE] {
            return Err(ConnectError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 LE",
            });
        }
        if buffer == [0xFE, 0xFF] {
            return Err(ConnectError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 BE",
            });
        }
    }

    Ok(())
}

/// Replace a string column with its parsed datetime equivalent.
///
/// Columns that already carry a temporal dtype (e.g. when Polars inferred
/// them) are left alone. Any unparseable non-null value fails the load.
fn parse_datetime_column(
    df: &mut DataFrame,
    column: &str,
    format: &str,
    path: &Path,
) -> Result<()> {
    let Ok(col) = df.column(column) else {
        return Err(ConnectError::ColumnNotFound {
            column: column.to_string(),
            path: path.to_path_buf(),
        });
    };

    if matches!(col.dtype(), DataType::Date | DataType::Datetime(_, _)) {
        return Ok(());
    }

    let ca = col.str().map_err(|_| ConnectError::DataFrame {
        message: format!("column '{column}' is not a string column"),
    })?;

    let mut stamps: Vec<Option<i64>> = Vec::with_capacity(ca.len());
    for value in ca {
        match value {
            None => stamps.push(None),
            Some(raw) => {
                let parsed = if format == AUTO_DATETIME_FORMAT {
                    parse_datetime_auto(raw)
                } else {
                    parse_datetime_with(raw, format)
                };
                match parsed {
                    Some(ts) => stamps.push(Some(ts.and_utc().timestamp_millis())),
                    None => {
                        return Err(ConnectError::DatetimeParse {
                            column: column.to_string(),
                            value: raw.to_string(),
                            format: format.to_string(),
                        });
                    }
                }
            }
        }
    }

    let parsed = Int64Chunked::from_iter_options(column.into(), stamps.into_iter())
        .into_datetime(TimeUnit::Milliseconds, None);
    df.replace(column, parsed.into_series())?;
    Ok(())
}
