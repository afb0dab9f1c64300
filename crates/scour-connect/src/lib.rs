//! File connectors for tabular datasets.
//!
//! Connectors load a source into a `DataFrame` and save a `DataFrame` to a
//! destination. They are peers of the pipeline engine, not dependencies:
//! callers wire connector output into a pipeline run and sink the result
//! themselves.

pub mod csv;
pub mod error;
pub mod parquet;

use polars::prelude::DataFrame;

pub use csv::{CsvConnector, CsvOptions};
pub use error::{ConnectError, Result};
pub use parquet::{Compression, ParquetConnector};

/// A data source/destination pair.
pub trait Connector {
    /// Load the full dataset from the source.
    fn load(&self) -> Result<DataFrame>;

    /// Save a dataset to the destination, replacing existing content.
    ///
    /// Takes the frame mutably because Polars writers may re-chunk while
    /// serializing; the data itself is unchanged.
    fn save(&self, df: &mut DataFrame) -> Result<()>;
}
