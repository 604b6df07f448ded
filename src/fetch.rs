//! Location history fetching.
//!
//! [`TraceFetcher`] owns the current [`Trace`] for a view and replaces it
//! wholesale on every fetch. A fetch never fails from the caller's point of
//! view: a missing entity id skips the request, and a failed request logs the
//! error and leaves an empty trace behind. The [`FetchOutcome`] says which of
//! these happened.
//!
//! Overlapping fetches are not coordinated; whichever response lands last
//! owns the trace slot.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use log::{debug, error, info};
use serde::Deserialize;

use crate::{FetchError, HistoryQuery, LocationSample, Trace, TraceStatistics};

/// Data-access collaborator: returns the location history for one entity,
/// oldest sample first, windowed and capped by `query` on the server side.
pub trait LocationHistorySource {
    fn fetch_history(
        &self,
        entity_id: &str,
        query: HistoryQuery,
    ) -> impl Future<Output = Result<LocationHistory, FetchError>> + Send;
}

/// Samples returned by a history request.
///
/// Decodes either a bare JSON array of samples or an object with a
/// `locations` array (other keys are ignored).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "HistoryPayload")]
pub struct LocationHistory {
    pub locations: Vec<LocationSample>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryPayload {
    Bare(Vec<LocationSample>),
    Wrapped { locations: Vec<LocationSample> },
}

impl From<HistoryPayload> for LocationHistory {
    fn from(payload: HistoryPayload) -> Self {
        match payload {
            HistoryPayload::Bare(locations) | HistoryPayload::Wrapped { locations } => {
                Self { locations }
            }
        }
    }
}

impl LocationHistory {
    pub fn from_json(bytes: &[u8]) -> Result<Self, FetchError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl From<Vec<LocationSample>> for LocationHistory {
    fn from(locations: Vec<LocationSample>) -> Self {
        Self { locations }
    }
}

/// What a call to [`TraceFetcher::fetch_trace`] did.
#[derive(Debug)]
pub enum FetchOutcome {
    /// No entity id was given; the source was not called.
    Skipped,
    /// The trace now holds this many samples.
    Loaded(usize),
    /// The source failed; the trace was emptied and the error logged.
    Failed(FetchError),
}

impl FetchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    pub fn sample_count(&self) -> usize {
        match self {
            FetchOutcome::Loaded(n) => *n,
            _ => 0,
        }
    }
}

/// Resets the loading flag when dropped, including on cancellation.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Holds the trace for one view and refreshes it from a [`LocationHistorySource`].
pub struct TraceFetcher<S> {
    source: S,
    trace: RwLock<Trace>,
    loading: AtomicBool,
}

impl<S: LocationHistorySource> TraceFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            trace: RwLock::new(Trace::default()),
            loading: AtomicBool::new(false),
        }
    }

    /// Fetch the history for `entity_id` and replace the current trace with it.
    ///
    /// Never returns an error: a missing or empty id yields an empty trace
    /// without touching the source, and a source failure yields an empty trace
    /// plus an `error!` log line. The loading flag is true for the duration of
    /// the call and always ends false.
    pub async fn fetch_trace(&self, entity_id: Option<&str>, query: HistoryQuery) -> FetchOutcome {
        let _loading = LoadingGuard::start(&self.loading);

        let entity_id = match entity_id {
            Some(id) if !id.is_empty() => id,
            _ => {
                debug!("[TraceFetcher] No entity id, skipping history request");
                self.replace(Trace::empty("", query));
                return FetchOutcome::Skipped;
            }
        };

        debug!(
            "[TraceFetcher] Fetching history for {} (days={}, limit={})",
            entity_id, query.days, query.limit
        );

        match self.source.fetch_history(entity_id, query).await {
            Ok(history) => {
                let count = history.locations.len();
                info!("[TraceFetcher] Loaded {} samples for {}", count, entity_id);
                self.replace(Trace::new(entity_id, query, history.locations));
                FetchOutcome::Loaded(count)
            }
            Err(e) => {
                error!("[TraceFetcher] Failed to fetch location history for {}: {}", entity_id, e);
                self.replace(Trace::empty(entity_id, query));
                FetchOutcome::Failed(e)
            }
        }
    }
}

impl<S> TraceFetcher<S> {
    /// Snapshot of the current trace.
    pub fn trace(&self) -> Trace {
        self.trace.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Statistics of the current trace, recomputed on each call.
    pub fn statistics(&self) -> TraceStatistics {
        self.trace
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .statistics()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn replace(&self, trace: Trace) {
        *self.trace.write().unwrap_or_else(PoisonError::into_inner) = trace;
    }
}
