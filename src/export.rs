//! Trace export.
//!
//! [`build_export`] snapshots a trace, freshly computed statistics and a
//! caller-supplied context (usually the asset record) into an
//! [`ExportDocument`]. Turning that into a file is left to a [`DownloadSink`].
//!
//! JSON shape:
//!
//! ```text
//! {
//!   "asset": { ...context... },
//!   "pathData": [ ...samples... ],
//!   "statistics": { "totalDistance": km, "duration": ms, "averageSpeed": kmh, "dataPoints": n },
//!   "exportedAt": "2023-01-01T12:00:00.000Z"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use serde::{Serialize, Serializer};

use crate::{ExportError, LocationSample, Trace, TraceStatistics};

pub const JSON_MEDIA_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStatistics {
    /// km
    pub total_distance: f64,
    /// ms
    pub duration: i64,
    /// km/h
    pub average_speed: f64,
    pub data_points: usize,
}

impl From<TraceStatistics> for ExportStatistics {
    fn from(stats: TraceStatistics) -> Self {
        Self {
            total_distance: stats.total_distance_km,
            duration: stats.duration_ms,
            average_speed: stats.average_speed_kmh,
            data_points: stats.point_count,
        }
    }
}

/// A point-in-time snapshot of a trace for download.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<C> {
    #[serde(rename = "asset")]
    pub entity_context: C,
    pub path_data: Vec<LocationSample>,
    pub statistics: ExportStatistics,
    #[serde(serialize_with = "ser_millis")]
    pub exported_at: DateTime<Utc>,
    #[serde(skip)]
    entity_id: String,
}

/// Assemble an export stamped with the current time.
pub fn build_export<C: Serialize>(entity_context: C, trace: &Trace) -> ExportDocument<C> {
    build_export_at(entity_context, trace, Utc::now())
}

/// Assemble an export with an explicit timestamp.
pub fn build_export_at<C: Serialize>(
    entity_context: C,
    trace: &Trace,
    exported_at: DateTime<Utc>,
) -> ExportDocument<C> {
    ExportDocument {
        entity_context,
        path_data: trace.samples.clone(),
        statistics: trace.statistics().into(),
        exported_at,
        entity_id: trace.entity_id.clone(),
    }
}

impl<C: Serialize> ExportDocument<C> {
    pub fn to_json_pretty(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `location-path-{entity}-{YYYY-MM-DD}.json`
    pub fn file_name(&self) -> String {
        let entity = if self.entity_id.is_empty() { "unknown" } else { &self.entity_id };
        format!(
            "location-path-{}-{}.json",
            sanitize(entity),
            self.exported_at.format("%Y-%m-%d")
        )
    }
}

// Always three fractional digits and a `Z`, e.g. `2023-01-02T08:00:00.000Z`.
fn ser_millis<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Download/save collaborator: offers a payload to the user as a file.
pub trait DownloadSink {
    fn offer(&self, file_name: &str, media_type: &str, payload: &[u8]) -> std::io::Result<()>;
}

/// Build an export, serialize it as pretty JSON and hand it to `sink`.
pub fn export_trace<C: Serialize, D: DownloadSink + ?Sized>(
    sink: &D,
    entity_context: C,
    trace: &Trace,
) -> Result<ExportDocument<C>, ExportError> {
    let document = build_export(entity_context, trace);
    let json = document.to_json_pretty()?;
    sink.offer(&document.file_name(), JSON_MEDIA_TYPE, json.as_bytes())?;
    Ok(document)
}

/// Saves offered payloads as files in a directory.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn offer(&self, file_name: &str, media_type: &str, payload: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        fs::write(&path, payload)?;
        info!(
            "[DirectorySink] Saved {} ({}, {} bytes)",
            path.display(),
            media_type,
            payload.len()
        );
        Ok(())
    }
}
