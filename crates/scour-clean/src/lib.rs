//! Transform units for structured data cleaning.
//!
//! Each unit implements [`scour_core::Transform`] and is wrapped into a
//! pipeline step by the caller. Units never mutate their input frame.

pub mod convert;
pub mod geo;
pub mod sanitize;

pub use convert::{BulkTypeConverter, TargetType};
pub use geo::{GeoPoint, Geocoder, GeospatialEnricher, OfflineGeocoder};
pub use sanitize::{CaseFold, ColumnSanitizer, SanitizeOptions};
