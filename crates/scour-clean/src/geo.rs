//! Geospatial enrichment of address columns.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use polars::prelude::{DataFrame, Float64Chunked, IntoSeries, NewChunkedArray, StringChunkedBuilder};

use scour_core::Transform;

/// A geocoded location.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub timezone: String,
}

/// Address-to-coordinates resolution.
///
/// Called once per distinct address; results are cached by the enricher.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, address: &str) -> anyhow::Result<GeoPoint>;
}

/// Deterministic geocoder for offline runs and tests.
///
/// Coordinates are derived from a hash of the address, so equal addresses
/// always map to equal points. The timezone is always UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGeocoder;

impl Geocoder for OfflineGeocoder {
    fn geocode(&self, address: &str) -> anyhow::Result<GeoPoint> {
        let hash = fnv1a(address.as_bytes());
        let lat = (hash % 180_000) as f64 / 1000.0 - 90.0;
        let lon = ((hash / 180_000) % 360_000) as f64 / 1000.0 - 180.0;
        Ok(GeoPoint {
            lat,
            lon,
            timezone: "UTC".to_string(),
        })
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Adds `<column>_lat` / `<column>_lon` (and optionally
/// `<column>_timezone`) for each configured address column.
///
/// The geocoding cache is private to this unit and guarded by a mutex, so
/// the unit is safe to call from parallel partitions.
pub struct GeospatialEnricher {
    address_columns: Vec<String>,
    add_timezone: bool,
    geocoder: Arc<dyn Geocoder>,
    cache: Mutex<HashMap<String, GeoPoint>>,
}

impl GeospatialEnricher {
    pub fn new(address_columns: Vec<String>, add_timezone: bool) -> Self {
        Self::with_geocoder(address_columns, add_timezone, Arc::new(OfflineGeocoder))
    }

    pub fn with_geocoder(
        address_columns: Vec<String>,
        add_timezone: bool,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self {
            address_columns,
            add_timezone,
            geocoder,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached_geocode(&self, address: &str) -> anyhow::Result<GeoPoint> {
        if let Some(hit) = self
            .cache
            .lock()
            .expect("geocode cache lock poisoned")
            .get(address)
        {
            return Ok(hit.clone());
        }
        let point = self.geocoder.geocode(address)?;
        self.cache
            .lock()
            .expect("geocode cache lock poisoned")
            .insert(address.to_string(), point.clone());
        Ok(point)
    }
}

impl Transform for GeospatialEnricher {
    fn process(&self, df: &DataFrame) -> anyhow::Result<DataFrame> {
        let mut result = df.clone();

        for column in &self.address_columns {
            let Ok(col) = df.column(column) else { continue };
            let ca = col.str()?;

            let mut lats: Vec<Option<f64>> = Vec::with_capacity(ca.len());
            let mut lons: Vec<Option<f64>> = Vec::with_capacity(ca.len());
            let mut zones = StringChunkedBuilder::new(format!("{column}_timezone").into(), ca.len());

            for value in ca {
                match value {
                    None => {
                        lats.push(None);
                        lons.push(None);
                        zones.append_null();
                    }
                    Some(address) => {
                        let point = self.cached_geocode(address)?;
                        lats.push(Some(point.lat));
                        lons.push(Some(point.lon));
                        zones.append_value(point.timezone);
                    }
                }
            }

            result.with_column(
                Float64Chunked::from_iter_options(format!("{column}_lat").into(), lats.into_iter())
                    .into_series(),
            )?;
            result.with_column(
                Float64Chunked::from_iter_options(format!("{column}_lon").into(), lons.into_iter())
                    .into_series(),
            )?;
            if self.add_timezone {
                result.with_column(zones.finish().into_series())?;
            }
        }

        Ok(result)
    }
}
