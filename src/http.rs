//! HTTP client for the fleet backend's location history endpoint.
//!
//! `GET {base_url}/locations/updates/asset/{entity_id}/?days=N&limit=M`
//!
//! The backend answers with `{ "asset": {...}, "locations": [...] }`, oldest
//! sample first. There is no retry here: a failed request surfaces as a
//! [`FetchError`] and the [`TraceFetcher`] turns it into an empty trace. The
//! user retries by refreshing.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::Client;

use crate::fetch::{FetchOutcome, LocationHistory, LocationHistorySource, TraceFetcher};
use crate::{FetchError, HistoryQuery, Trace};

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the fleet backend.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    /// API root, without a trailing slash.
    /// Default: http://localhost:8000/api
    pub base_url: String,
    /// Token sent as `Authorization: Token <token>`
    pub token: Option<String>,
    /// Whole-request timeout.
    /// Default: 30 seconds
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HttpConfig {
    /// Defaults, overridden by `FLEET_API_URL` and `FLEET_API_TOKEN` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("FLEET_API_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(token) = std::env::var("FLEET_API_TOKEN") {
            if !token.is_empty() {
                config.token = Some(token);
            }
        }
        config
    }
}

/// [`LocationHistorySource`] backed by the REST API.
pub struct HttpHistorySource {
    client: Client,
    base_url: String,
    auth_header: Option<String>,
}

impl HttpHistorySource {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_header: config.token.as_ref().map(|t| format!("Token {}", t)),
        })
    }

    fn history_url(&self, entity_id: &str) -> String {
        format!("{}/locations/updates/asset/{}/", self.base_url, entity_id)
    }

    /// Zero `days`/`limit` fall back to the defaults before hitting the wire.
    fn history_request(&self, entity_id: &str, query: HistoryQuery) -> reqwest::RequestBuilder {
        let query = query.or_defaults();
        let request = self
            .client
            .get(self.history_url(entity_id))
            .query(&[("days", query.days), ("limit", query.limit)]);
        match &self.auth_header {
            Some(auth) => request.header("Authorization", auth),
            None => request,
        }
    }
}

impl LocationHistorySource for HttpHistorySource {
    async fn fetch_history(
        &self,
        entity_id: &str,
        query: HistoryQuery,
    ) -> Result<LocationHistory, FetchError> {
        let url = self.history_url(entity_id);
        let req_start = Instant::now();

        let resp = self.history_request(entity_id, query).send().await?;
        let headers_elapsed = req_start.elapsed();
        let status = resp.status();

        if !status.is_success() {
            warn!("[HttpHistorySource] HTTP {} for {} after {:?}", status, url, headers_elapsed);
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let bytes = resp.bytes().await?;
        let body_elapsed = req_start.elapsed();

        let history = LocationHistory::from_json(&bytes)?;

        debug!(
            "[HttpHistorySource] {} headers={:?} body={:?}({:.1}KB)",
            url,
            headers_elapsed,
            body_elapsed,
            bytes.len() as f64 / 1024.0
        );
        info!(
            "[HttpHistorySource] {} samples for {} in {:?}",
            history.locations.len(),
            entity_id,
            req_start.elapsed()
        );

        Ok(history)
    }
}

/// Blocking wrapper: fetch one trace on a private tokio runtime.
///
/// Follows the same never-fails contract as [`TraceFetcher::fetch_trace`]; a
/// client or runtime that cannot be built is reported as `Failed`.
pub fn fetch_trace_sync(
    config: &HttpConfig,
    entity_id: Option<&str>,
    query: HistoryQuery,
) -> (Trace, FetchOutcome) {
    use tokio::runtime::Builder;

    let empty = || Trace::empty(entity_id.unwrap_or_default(), query);

    let rt = match Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            warn!("Failed to create tokio runtime: {}", e);
            return (empty(), FetchOutcome::Failed(FetchError::Request(e.to_string())));
        }
    };

    let source = match HttpHistorySource::new(config) {
        Ok(s) => s,
        Err(e) => {
            warn!("Failed to create history client: {}", e);
            return (empty(), FetchOutcome::Failed(e));
        }
    };

    let fetcher = TraceFetcher::new(source);
    let outcome = rt.block_on(fetcher.fetch_trace(entity_id, query));
    (fetcher.trace(), outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_url_and_auth() {
        let config = HttpConfig {
            base_url: "https://fleet.example.org/api/".to_string(),
            token: Some("abc123".to_string()),
            ..Default::default()
        };
        let source = HttpHistorySource::new(&config).unwrap();

        assert_eq!(
            source.history_url("TRUCK-7"),
            "https://fleet.example.org/api/locations/updates/asset/TRUCK-7/"
        );
        assert_eq!(source.auth_header.as_deref(), Some("Token abc123"));
    }

    #[test]
    fn test_history_request_applies_query_defaults() {
        let source = HttpHistorySource::new(&HttpConfig::default()).unwrap();

        let request = source
            .history_request("TEST001", HistoryQuery { days: 0, limit: 0 })
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("days=7&limit=100"));
        assert!(request.headers().get("Authorization").is_none());

        let request = source
            .history_request("TEST001", HistoryQuery { days: 3, limit: 50 })
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("days=3&limit=50"));
    }

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000/api");
        assert!(config.token.is_none());
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_sync_fetch_unreachable_backend_yields_empty_trace() {
        let config = HttpConfig {
            // Reserved port, nothing listens there
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };

        let (trace, outcome) = fetch_trace_sync(&config, Some("TEST001"), HistoryQuery::default());

        assert!(outcome.is_failed());
        assert!(trace.is_empty());
        assert_eq!(trace.entity_id, "TEST001");
    }

    #[test]
    fn test_sync_fetch_without_entity_is_skipped() {
        let (trace, outcome) = fetch_trace_sync(&HttpConfig::default(), None, HistoryQuery::default());
        assert!(matches!(outcome, FetchOutcome::Skipped));
        assert!(trace.is_empty());
    }
}
