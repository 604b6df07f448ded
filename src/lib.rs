//! # Fleet Trace
//!
//! Path analytics for tracked fleet vehicles and assets.
//!
//! This library provides:
//! - Great-circle distance between GPS fixes (haversine, R = 6371 km)
//! - Distance, duration and average speed over a location history
//! - Formatting helpers for on-screen trace statistics
//! - Fetching a location history with a "never fails, empties instead" contract
//! - A JSON export document for a trace and its statistics
//! - A map overlay that draws the path onto any [`map::MapSurface`]
//!
//! ## Features
//!
//! - **`http`** - Enable the REST client for the fleet backend's location history endpoint
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use fleet_trace::{HistoryQuery, LocationSample, Trace};
//!
//! let samples = vec![
//!     LocationSample::new(1, 40.7128, -74.0060, Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap()),
//!     LocationSample::new(2, 40.7130, -74.0062, Utc.with_ymd_and_hms(2023, 1, 1, 10, 30, 0).unwrap()),
//!     LocationSample::new(3, 40.7132, -74.0064, Utc.with_ymd_and_hms(2023, 1, 1, 11, 0, 0).unwrap()),
//! ];
//!
//! let trace = Trace::new("TRUCK-001", HistoryQuery::default(), samples);
//! let stats = trace.statistics();
//!
//! assert_eq!(stats.duration_ms, 3_600_000);
//! assert!(stats.total_distance_km > 0.0);
//! assert_eq!(stats.point_count, 3);
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub mod error;
pub use error::{ExportError, FetchError};

pub mod geo_utils;

pub mod stats;
pub use stats::TraceStatistics;

pub mod format;

pub mod fetch;
pub use fetch::{FetchOutcome, LocationHistory, LocationHistorySource, TraceFetcher};

// HTTP module for location history fetching
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpHistorySource};

pub mod export;
pub use export::{build_export, DownloadSink, ExportDocument, ExportStatistics};

pub mod map;
pub use map::{MapSurface, MarkerKind, PathOverlay};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use fleet_trace::GpsPoint;
/// let point = GpsPoint::new(40.7128, -74.0060); // New York
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// Where a location fix came from.
///
/// Unknown codes are kept verbatim in [`LocationSource::Other`] so they survive
/// a decode/encode cycle and render as themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LocationSource {
    #[default]
    Manual,
    GpsDevice,
    MobileApp,
    Telematics,
    Other(String),
}

impl LocationSource {
    /// Wire code, as stored by the backend.
    pub fn code(&self) -> &str {
        match self {
            LocationSource::Manual => "manual",
            LocationSource::GpsDevice => "gps_device",
            LocationSource::MobileApp => "mobile_app",
            LocationSource::Telematics => "telematics",
            LocationSource::Other(code) => code,
        }
    }

    /// Short human label. Unknown codes fall back to the code itself.
    pub fn label(&self) -> &str {
        match self {
            LocationSource::Manual => "Manual",
            LocationSource::GpsDevice => "GPS",
            LocationSource::MobileApp => "Mobile",
            LocationSource::Telematics => "Telematics",
            LocationSource::Other(code) => code,
        }
    }
}

impl From<&str> for LocationSource {
    fn from(code: &str) -> Self {
        match code {
            "manual" => LocationSource::Manual,
            "gps_device" => LocationSource::GpsDevice,
            "mobile_app" => LocationSource::MobileApp,
            "telematics" => LocationSource::Telematics,
            other => LocationSource::Other(other.to_string()),
        }
    }
}

impl From<String> for LocationSource {
    fn from(code: String) -> Self {
        LocationSource::from(code.as_str())
    }
}

impl From<LocationSource> for String {
    fn from(source: LocationSource) -> Self {
        match source {
            LocationSource::Other(code) => code,
            known => known.code().to_string(),
        }
    }
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Opaque sample identifier. The backend hands out UUIDs; fixtures and older
/// rows use integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleId {
    Number(i64),
    Text(String),
}

impl From<i64> for SampleId {
    fn from(id: i64) -> Self {
        SampleId::Number(id)
    }
}

impl From<i32> for SampleId {
    fn from(id: i32) -> Self {
        SampleId::Number(id.into())
    }
}

impl From<String> for SampleId {
    fn from(id: String) -> Self {
        SampleId::Text(id)
    }
}

impl From<&str> for SampleId {
    fn from(id: &str) -> Self {
        SampleId::Text(id.to_string())
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleId::Number(n) => write!(f, "{}", n),
            SampleId::Text(s) => f.write_str(s),
        }
    }
}

/// One GPS or manual location reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub id: SampleId,
    #[serde(deserialize_with = "de_coordinate")]
    pub latitude: f64,
    #[serde(deserialize_with = "de_coordinate")]
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub source: LocationSource,
    /// Speed in km/h, when the source reports one
    #[serde(default)]
    pub speed: Option<f64>,
    /// Heading in degrees [0, 360)
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl LocationSample {
    /// Create a manual sample with no speed, heading or address.
    pub fn new(id: impl Into<SampleId>, latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            timestamp,
            source: LocationSource::Manual,
            speed: None,
            heading: None,
            address: None,
        }
    }

    pub fn with_source(mut self, source: LocationSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

// Decimal columns arrive as strings ("40.71280000"), floats as numbers.
fn de_coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(v) => Ok(v),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Lookback window for a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// How many days back from now
    /// Default: 7
    pub days: u32,
    /// Maximum number of samples returned, oldest first
    /// Default: 100
    pub limit: u32,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self { days: 7, limit: 100 }
    }
}

impl HistoryQuery {
    /// Replace a zero `days` or `limit` with its default. A zero window would
    /// otherwise ask the backend for nothing.
    pub fn or_defaults(self) -> Self {
        let defaults = Self::default();
        Self {
            days: if self.days == 0 { defaults.days } else { self.days },
            limit: if self.limit == 0 { defaults.limit } else { self.limit },
        }
    }
}

/// An ordered location history for one tracked entity.
///
/// Samples are kept in the order the data source delivered them (oldest
/// first); nothing here re-sorts. A trace is replaced wholesale on refetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    pub entity_id: String,
    pub query: HistoryQuery,
    pub samples: Vec<LocationSample>,
}

impl Trace {
    pub fn new(entity_id: impl Into<String>, query: HistoryQuery, samples: Vec<LocationSample>) -> Self {
        Self {
            entity_id: entity_id.into(),
            query,
            samples,
        }
    }

    /// A trace with no samples.
    pub fn empty(entity_id: impl Into<String>, query: HistoryQuery) -> Self {
        Self::new(entity_id, query, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample coordinates in trace order.
    pub fn points(&self) -> Vec<GpsPoint> {
        self.samples.iter().map(LocationSample::point).collect()
    }

    /// Derived statistics, recomputed from the current samples on every call.
    pub fn statistics(&self) -> TraceStatistics {
        TraceStatistics::from_samples(&self.samples)
    }
}

// ============================================================================
// Tests
// ============================================================================
