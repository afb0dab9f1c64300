//! Shared utilities for scour crates.
//!
//! This crate provides common utilities used across the scour workspace,
//! including Polars value conversion and string parsing helpers.

pub mod datetime;
pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use datetime::{parse_datetime_auto, parse_datetime_with};
pub use polars::{
    any_to_f64, any_to_string, format_numeric, is_numeric_dtype, parse_bool, parse_f64,
};
