//! Parquet source/destination connector.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::{
    BooleanChunked, DataFrame, NewChunkedArray, ParquetCompression, ParquetReader, ParquetWriter,
    SerReader,
};
use serde::{Deserialize, Serialize};

use scour_common::any_to_string;

use crate::Connector;
use crate::error::{ConnectError, Result};

/// Parquet compression codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Snappy,
    Zstd,
    None,
}

impl Compression {
    fn to_polars(self) -> ParquetCompression {
        match self {
            Self::Snappy => ParquetCompression::Snappy,
            Self::Zstd => ParquetCompression::Zstd(None),
            Self::None => ParquetCompression::Uncompressed,
        }
    }
}

/// Reads and writes Parquet files.
///
/// With a partition column configured, `save` writes one file per distinct
/// column value under the target directory (`<column>=<value>.parquet`) and
/// `load` reads every `.parquet` file in the directory back in file-name
/// order.
#[derive(Debug, Clone)]
pub struct ParquetConnector {
    path: PathBuf,
    compression: Compression,
    partition_by: Option<String>,
}

impl ParquetConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            compression: Compression::default(),
            partition_by: None,
        }
    }

    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    #[must_use]
    pub fn with_partition_by(mut self, column: impl Into<String>) -> Self {
        self.partition_by = Some(column.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_file(path: &Path) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| {
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
        ParquetReader::new(file)
            .finish()
            .map_err(|e| ConnectError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn load_directory(&self) -> Result<DataFrame> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.path)
            .map_err(|source| ConnectError::FileRead {
                path: self.path.clone(),
                source,
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "parquet"))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(ConnectError::Parse {
                path: self.path.clone(),
                message: "directory contains no parquet files".to_string(),
            });
        }

        let mut combined: Option<DataFrame> = None;
        for file in files {
            let frame = Self::load_file(&file)?;
            match combined.as_mut() {
                Some(df) => {
                    df.vstack_mut(&frame)?;
                }
                None => combined = Some(frame),
            }
        }
        Ok(combined.expect("at least one file loaded"))
    }

    fn save_partitioned(&self, df: &DataFrame, column: &str) -> Result<()> {
        std::fs::create_dir_all(&self.path).map_err(|source| ConnectError::FileWrite {
            path: self.path.clone(),
            source,
        })?;

        let col = df
            .column(column)
            .map_err(|_| ConnectError::ColumnNotFound {
                column: column.to_string(),
                path: self.path.clone(),
            })?
            .clone();

        let mut keys = BTreeSet::new();
        for index in 0..df.height() {
            keys.insert(any_to_string(col.get(index)?));
        }

        for key in keys {
            let mask: Vec<bool> = (0..df.height())
                .map(|index| {
                    col.get(index)
                        .map(|value| any_to_string(value) == key)
                        .unwrap_or(false)
                })
                .collect();
            let mask = BooleanChunked::from_slice("partition".into(), &mask);
            let mut part = df.filter(&mask)?;

            let file_name = format!("{column}={}.parquet", sanitize_partition_key(&key));
            let target = self.path.join(file_name);
            let file = File::create(&target).map_err(|source| ConnectError::FileWrite {
                path: target.clone(),
                source,
            })?;
            ParquetWriter::new(file)
                .with_compression(self.compression.to_polars())
                .finish(&mut part)?;
        }

        tracing::debug!(path = %self.path.display(), column, "wrote partitioned parquet");
        Ok(())
    }
}

impl Connector for ParquetConnector {
    fn load(&self) -> Result<DataFrame> {
        if self.path.is_dir() {
            self.load_directory()
        } else {
            Self::load_file(&self.path)
        }
    }

    fn save(&self, df: &mut DataFrame) -> Result<()> {
        if let Some(column) = self.partition_by.clone() {
            return self.save_partitioned(df, &column);
        }

        let file = File::create(&self.path).map_err(|source| ConnectError::FileWrite {
            path: self.path.clone(),
            source,
        })?;
        ParquetWriter::new(file)
            .with_compression(self.compression.to_polars())
            .finish(df)?;
        Ok(())
    }
}

/// Keep partition file names filesystem-safe.
fn sanitize_partition_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "null".to_string()
    } else {
        cleaned
    }
}
