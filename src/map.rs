//! Drawing a trace onto an interactive map.
//!
//! The map library itself sits behind [`MapSurface`]; [`PathOverlay`] decides
//! what to draw and remembers the layers it created so a re-render replaces
//! them instead of stacking new ones on top.

use log::debug;

use crate::format::{format_date_time, format_speed};
use crate::geo_utils::compute_bounds;
use crate::{Bounds, GpsPoint, LocationSample, Trace};

/// Handle for a layer created on a [`MapSurface`].
pub type LayerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Start,
    End,
    Waypoint,
}

impl MarkerKind {
    pub fn title(&self) -> &'static str {
        match self {
            MarkerKind::Start => "Start",
            MarkerKind::End => "End",
            MarkerKind::Waypoint => "Waypoint",
        }
    }
}

/// Capabilities the overlay needs from a mapping library.
pub trait MapSurface {
    fn add_polyline(&mut self, points: &[GpsPoint]) -> LayerId;
    fn add_marker(&mut self, at: GpsPoint, kind: MarkerKind, popup: Option<String>) -> LayerId;
    fn remove_layer(&mut self, id: LayerId);
    fn fit_bounds(&mut self, bounds: Bounds);
}

/// The path, start/end markers and waypoint markers for one trace.
#[derive(Debug, Default)]
pub struct PathOverlay {
    layers: Vec<LayerId>,
}

impl PathOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layers currently drawn by this overlay.
    pub fn layers(&self) -> &[LayerId] {
        &self.layers
    }

    /// Replace whatever was drawn before with `trace`.
    ///
    /// Zero samples draws nothing; one sample draws a single start marker. The
    /// polyline and viewport fit need at least two samples.
    pub fn render<M: MapSurface + ?Sized>(&mut self, surface: &mut M, trace: &Trace) {
        self.clear(surface);

        let samples = &trace.samples;
        match samples.len() {
            0 => return,
            1 => {
                let id = surface.add_marker(
                    samples[0].point(),
                    MarkerKind::Start,
                    Some(popup(MarkerKind::Start, &samples[0])),
                );
                self.layers.push(id);
                return;
            }
            _ => {}
        }

        let points = trace.points();
        self.layers.push(surface.add_polyline(&points));

        let last = samples.len() - 1;
        for (i, sample) in samples.iter().enumerate() {
            let kind = match i {
                0 => MarkerKind::Start,
                i if i == last => MarkerKind::End,
                _ => MarkerKind::Waypoint,
            };
            let id = surface.add_marker(sample.point(), kind, Some(popup(kind, sample)));
            self.layers.push(id);
        }

        if let Some(bounds) = compute_bounds(&points) {
            surface.fit_bounds(bounds);
        }

        debug!(
            "[PathOverlay] Drew {} samples for {} ({} layers)",
            samples.len(),
            trace.entity_id,
            self.layers.len()
        );
    }

    /// Remove every layer this overlay drew.
    pub fn clear<M: MapSurface + ?Sized>(&mut self, surface: &mut M) {
        for id in self.layers.drain(..) {
            surface.remove_layer(id);
        }
    }
}

fn popup(kind: MarkerKind, sample: &LocationSample) -> String {
    let mut lines = vec![
        kind.title().to_string(),
        format_date_time(&sample.timestamp.to_rfc3339()),
        format!("Source: {}", sample.source.label()),
    ];
    if let Some(speed) = sample.speed {
        lines.push(format!("Speed: {}", format_speed(speed)));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HistoryQuery, LocationSource};
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq)]
    enum Layer {
        Polyline(Vec<GpsPoint>),
        Marker(GpsPoint, MarkerKind, Option<String>),
    }

    #[derive(Default)]
    struct RecordingSurface {
        next_id: LayerId,
        layers: BTreeMap<LayerId, Layer>,
        fitted: Vec<Bounds>,
    }

    impl RecordingSurface {
        fn insert(&mut self, layer: Layer) -> LayerId {
            self.next_id += 1;
            self.layers.insert(self.next_id, layer);
            self.next_id
        }

        fn markers(&self, kind: MarkerKind) -> usize {
            self.layers
                .values()
                .filter(|l| matches!(l, Layer::Marker(_, k, _) if *k == kind))
                .count()
        }

        fn polylines(&self) -> usize {
            self.layers.values().filter(|l| matches!(l, Layer::Polyline(_))).count()
        }
    }

    impl MapSurface for RecordingSurface {
        fn add_polyline(&mut self, points: &[GpsPoint]) -> LayerId {
            self.insert(Layer::Polyline(points.to_vec()))
        }

        fn add_marker(&mut self, at: GpsPoint, kind: MarkerKind, popup: Option<String>) -> LayerId {
            self.insert(Layer::Marker(at, kind, popup))
        }

        fn remove_layer(&mut self, id: LayerId) {
            self.layers.remove(&id);
        }

        fn fit_bounds(&mut self, bounds: Bounds) {
            self.fitted.push(bounds);
        }
    }

    fn trace(n: usize) -> Trace {
        let t0 = Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap();
        let samples = (0..n)
            .map(|i| {
                LocationSample::new(
                    i as i64,
                    40.7128 + i as f64 * 0.0002,
                    -74.0060 - i as f64 * 0.0002,
                    t0 + Duration::minutes(30 * i as i64),
                )
                .with_source(LocationSource::GpsDevice)
                .with_speed(30.0)
            })
            .collect();
        Trace::new("TEST001", HistoryQuery::default(), samples)
    }

    #[test]
    fn test_render_full_path() {
        let mut surface = RecordingSurface::default();
        let mut overlay = PathOverlay::new();

        overlay.render(&mut surface, &trace(4));

        assert_eq!(surface.polylines(), 1);
        assert_eq!(surface.markers(MarkerKind::Start), 1);
        assert_eq!(surface.markers(MarkerKind::End), 1);
        assert_eq!(surface.markers(MarkerKind::Waypoint), 2);
        assert_eq!(overlay.layers().len(), 5);

        let bounds = surface.fitted.last().unwrap();
        assert_eq!(bounds.min_lat, 40.7128);
        assert_eq!(bounds.max_lng, -74.0060);

        let start_popup = surface.layers.values().find_map(|l| match l {
            Layer::Marker(_, MarkerKind::Start, popup) => popup.clone(),
            _ => None,
        });
        let start_popup = start_popup.unwrap();
        assert!(start_popup.starts_with("Start"));
        assert!(start_popup.contains("Source: GPS"));
        assert!(start_popup.contains("Speed: 30.0 km/h"));
    }

    #[test]
    fn test_polyline_follows_sample_order() {
        let mut surface = RecordingSurface::default();
        let trace = trace(3);
        PathOverlay::new().render(&mut surface, &trace);

        let polyline = surface.layers.values().find_map(|l| match l {
            Layer::Polyline(points) => Some(points.clone()),
            _ => None,
        });
        assert_eq!(polyline.unwrap(), trace.points());
    }

    #[test]
    fn test_render_empty_and_single() {
        let mut surface = RecordingSurface::default();
        let mut overlay = PathOverlay::new();

        overlay.render(&mut surface, &trace(0));
        assert!(surface.layers.is_empty());
        assert!(surface.fitted.is_empty());

        overlay.render(&mut surface, &trace(1));
        assert_eq!(surface.polylines(), 0);
        assert_eq!(surface.markers(MarkerKind::Start), 1);
        assert!(surface.fitted.is_empty());
    }

    #[test]
    fn test_rerender_replaces_layers() {
        let mut surface = RecordingSurface::default();
        let mut overlay = PathOverlay::new();

        overlay.render(&mut surface, &trace(5));
        overlay.render(&mut surface, &trace(2));

        assert_eq!(surface.layers.len(), 3);
        assert_eq!(surface.polylines(), 1);
        assert_eq!(surface.markers(MarkerKind::Waypoint), 0);

        overlay.render(&mut surface, &trace(0));
        assert!(surface.layers.is_empty());
        assert!(overlay.layers().is_empty());
    }
}
