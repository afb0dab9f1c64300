//! Validation rule sets producing per-row keep-masks.
//!
//! Validators implement [`scour_core::Validator`]; the pipeline narrows the
//! dataset to rows where the mask is true.

pub mod pattern;
pub mod schema;

pub use pattern::{ErrorHandling, PatternValidator};
pub use schema::{ColumnRule, RuleType, SchemaValidator};
