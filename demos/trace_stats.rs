//! Fetch a trace from an in-memory source, print its statistics and export it.
//!
//! Run with: cargo run --example trace_stats

use chrono::{Duration, TimeZone, Utc};
use fleet_trace::export::{export_trace, DirectorySink};
use fleet_trace::format::{format_distance, format_duration, format_speed};
use fleet_trace::{
    FetchError, HistoryQuery, LocationHistory, LocationHistorySource, LocationSample,
    LocationSource, TraceFetcher,
};
use serde_json::json;

struct FixtureSource;

impl LocationHistorySource for FixtureSource {
    async fn fetch_history(
        &self,
        entity_id: &str,
        query: HistoryQuery,
    ) -> Result<LocationHistory, FetchError> {
        if entity_id != "TRUCK-001" {
            return Err(FetchError::Status { status: 404, url: format!("fixture://{}", entity_id) });
        }
        let t0 = Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap();
        let samples = (0..query.limit.min(12))
            .map(|i| {
                LocationSample::new(
                    i as i64,
                    40.7128 + i as f64 * 0.002,
                    -74.0060 + i as f64 * 0.001,
                    t0 + Duration::minutes(5 * i as i64),
                )
                .with_source(LocationSource::Telematics)
            })
            .collect::<Vec<_>>();
        Ok(samples.into())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = TraceFetcher::new(FixtureSource);

    println!("Trace Statistics Example\n");

    for id in [Some("TRUCK-001"), Some("VAN-404"), None] {
        let outcome = fetcher.fetch_trace(id, HistoryQuery::default()).await;
        let stats = fetcher.statistics();
        println!("{:?}: {:?}", id, outcome);
        println!("   Points:   {}", stats.point_count);
        println!("   Distance: {}", format_distance(stats.total_distance_km));
        println!("   Duration: {}", format_duration(stats.duration_ms));
        println!("   Speed:    {}\n", format_speed(stats.average_speed_kmh));
    }

    fetcher.fetch_trace(Some("TRUCK-001"), HistoryQuery::default()).await;
    let sink = DirectorySink::new(std::env::temp_dir());
    let asset = json!({ "asset_id": "TRUCK-001", "make": "Ford", "model": "F-150" });
    let doc = export_trace(&sink, asset, &fetcher.trace())?;
    println!("Exported to {}", sink.dir().join(doc.file_name()).display());

    Ok(())
}
