//! TTL classification and single-flight fetch coordination.
//!
//! A `FlightBoard` guarantees at most one in-progress fetch per key:
//! the first caller to need a key leads the fetch, later callers join
//! its watch channel and share the published result. Fetches run as
//! detached tasks, so a caller cancelled mid-wait abandons only its own
//! wait; the fetch still completes and updates the shared table.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use metrics::{counter, histogram};
use time::{Duration, OffsetDateTime};
use tokio::sync::watch;
use tracing::debug;

use crate::application::source::SourceError;
use crate::cache::entry::EntryState;

const METRIC_FLIGHT_JOIN: &str = "galleria_flight_join_total";
const METRIC_REFRESH_FAIL: &str = "galleria_refresh_fail_total";
const METRIC_REFRESH_MS: &str = "galleria_refresh_ms";

type FlightResult<V> = Option<Result<V, SourceError>>;
pub(crate) type FlightReceiver<V> = watch::Receiver<FlightResult<V>>;

/// Time-based freshness policy.
pub(crate) struct Revalidator {
    ttl: Duration,
}

impl Revalidator {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Classify an entry by wall-clock age: younger than the TTL is
    /// fresh, everything at or past it is stale.
    pub(crate) fn classify(&self, fetched_at: OffsetDateTime, now: OffsetDateTime) -> EntryState {
        if now - fetched_at < self.ttl {
            EntryState::Fresh
        } else {
            EntryState::Stale
        }
    }
}

/// Removes the flight slot when the fetch task finishes, however it
/// finishes. A panicking fetch drops the sender without publishing,
/// which waiters observe as [`SourceError::Aborted`].
struct FlightGuard<K: Eq + Hash, V> {
    key: K,
    flights: Arc<DashMap<K, FlightReceiver<V>>>,
}

impl<K: Eq + Hash, V> Drop for FlightGuard<K, V> {
    fn drop(&mut self) {
        self.flights.remove(&self.key);
    }
}

/// Per-key single-flight coordination table.
///
/// Clones share the same table, so every handle to the cache observes
/// the same in-flight fetches.
#[derive(Clone)]
pub(crate) struct FlightBoard<K, V> {
    flights: Arc<DashMap<K, FlightReceiver<V>>>,
    label: &'static str,
}

impl<K, V> FlightBoard<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            flights: Arc::new(DashMap::new()),
            label,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_inflight(&self, key: &K) -> bool {
        self.flights.contains_key(key)
    }

    /// Join the in-flight fetch for `key`, or lead a new one running
    /// `fetch` as a detached task. The returned receiver yields the
    /// shared result via [`await_flight`].
    pub(crate) fn join_or_lead<F>(&self, key: K, fetch: F) -> FlightReceiver<V>
    where
        F: Future<Output = Result<V, SourceError>> + Send + 'static,
    {
        let mut lead = None;
        let rx = match self.flights.entry(key.clone()) {
            Entry::Occupied(slot) => {
                counter!(METRIC_FLIGHT_JOIN, "cache" => self.label).increment(1);
                debug!(cache = self.label, "Joined in-flight fetch");
                slot.get().clone()
            }
            Entry::Vacant(slot) => {
                let (tx, rx) = watch::channel(None);
                slot.insert(rx.clone());
                lead = Some(tx);
                rx
            }
        };
        if let Some(tx) = lead {
            self.spawn_flight(key, tx, fetch);
        }
        rx
    }

    /// Start a detached refresh for `key` unless one is already
    /// running. Returns whether this call started the flight.
    pub(crate) fn lead_detached<F>(&self, key: K, fetch: F) -> bool
    where
        F: Future<Output = Result<V, SourceError>> + Send + 'static,
    {
        let mut lead = None;
        match self.flights.entry(key.clone()) {
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                let (tx, rx) = watch::channel(None);
                slot.insert(rx);
                lead = Some(tx);
            }
        }
        match lead {
            Some(tx) => {
                self.spawn_flight(key, tx, fetch);
                true
            }
            None => false,
        }
    }

    fn spawn_flight<F>(&self, key: K, tx: watch::Sender<FlightResult<V>>, fetch: F)
    where
        F: Future<Output = Result<V, SourceError>> + Send + 'static,
    {
        let guard = FlightGuard {
            key,
            flights: Arc::clone(&self.flights),
        };
        let label = self.label;
        tokio::spawn(async move {
            // Slot removal must outlive the send, so late joiners either
            // find the slot with its published value or no slot at all.
            let _slot = guard;
            let started = Instant::now();
            let result = fetch.await;
            histogram!(METRIC_REFRESH_MS, "cache" => label)
                .record(started.elapsed().as_secs_f64() * 1000.0);
            if result.is_err() {
                counter!(METRIC_REFRESH_FAIL, "cache" => label).increment(1);
            }
            let _ = tx.send(Some(result));
        });
    }
}

/// Wait for the flight behind `rx` to publish, sharing its exact
/// result. A flight that dies without publishing yields
/// [`SourceError::Aborted`].
pub(crate) async fn await_flight<V: Clone>(mut rx: FlightReceiver<V>) -> Result<V, SourceError> {
    loop {
        {
            let value = rx.borrow_and_update();
            if let Some(result) = value.as_ref() {
                return result.clone();
            }
        }
        if rx.changed().await.is_err() {
            let value = rx.borrow();
            return match value.as_ref() {
                Some(result) => result.clone(),
                None => Err(SourceError::Aborted),
            };
        }
    }
}
