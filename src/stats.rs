//! Distance, duration and average speed over a location history.
//!
//! Every value here is derived from the sample slice it is given and nothing is
//! cached, so statistics can never drift from the trace they describe.

use log::warn;
use serde::Serialize;

use crate::geo_utils::polyline_length_km;
use crate::{GpsPoint, LocationSample};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Derived statistics for a trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStatistics {
    /// Path length in km (sum over adjacent samples)
    pub total_distance_km: f64,
    /// Last timestamp minus first, in milliseconds
    pub duration_ms: i64,
    /// Distance over duration, in km/h
    pub average_speed_kmh: f64,
    pub point_count: usize,
}

impl TraceStatistics {
    pub fn from_samples(samples: &[LocationSample]) -> Self {
        let total_distance_km = total_distance_km(samples);
        let duration_ms = duration_ms(samples);

        Self {
            total_distance_km,
            duration_ms,
            average_speed_kmh: speed_kmh(total_distance_km, duration_ms),
            point_count: samples.len(),
        }
    }
}

/// Sum of great-circle distances between consecutive samples, in km.
///
/// Returns 0.0 for fewer than two samples.
pub fn total_distance_km(samples: &[LocationSample]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let points: Vec<GpsPoint> = samples.iter().map(LocationSample::point).collect();
    polyline_length_km(&points)
}

/// Elapsed time between the first and last sample, in milliseconds.
///
/// Returns 0 for fewer than two samples. Samples are not re-sorted, so an
/// out-of-order history can produce a negative value.
pub fn duration_ms(samples: &[LocationSample]) -> i64 {
    if samples.len() < 2 {
        return 0;
    }
    let first = &samples[0];
    let last = &samples[samples.len() - 1];

    let duration = (last.timestamp - first.timestamp).num_milliseconds();
    if duration < 0 {
        warn!(
            "[TraceStatistics] Negative duration {}ms: samples are not in timestamp order ({} -> {})",
            duration, first.timestamp, last.timestamp
        );
    }
    duration
}

/// Average speed in km/h over the whole trace.
///
/// Returns 0.0 when either the distance or the duration is zero.
pub fn average_speed_kmh(samples: &[LocationSample]) -> f64 {
    speed_kmh(total_distance_km(samples), duration_ms(samples))
}

fn speed_kmh(distance_km: f64, duration_ms: i64) -> f64 {
    if duration_ms == 0 || distance_km == 0.0 {
        return 0.0;
    }
    distance_km / (duration_ms as f64 / MS_PER_HOUR)
}
