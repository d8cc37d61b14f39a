use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};

use super::reconcile::reconcile;
use super::store::StateStore;
use crate::feed::FeedSource;

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Committed { vehicles: usize },
    FetchFailed(String),
    CommitFailed(String),
    /// Another cycle was still running
    Skipped,
}

/// Counters exposed on the status endpoint
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStats {
    pub ticks: u64,
    pub failures: u64,
    pub skipped: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Default)]
struct Counters {
    ticks: AtomicU64,
    failures: AtomicU64,
    skipped: AtomicU64,
    last: StdMutex<(Option<DateTime<Utc>>, Option<String>)>,
}

/// Drives fetch, reconcile and commit, one cycle at a time
pub struct Scheduler<F> {
    feed: F,
    store: Arc<StateStore>,
    period: Duration,
    max_points: usize,
    in_flight: Mutex<()>,
    counters: Counters,
}

impl<F: FeedSource> Scheduler<F> {
    pub fn new(feed: F, store: Arc<StateStore>, period: Duration, max_points: usize) -> Self {
        Scheduler {
            feed,
            store,
            period,
            max_points,
            in_flight: Mutex::new(()),
            counters: Counters::default(),
        }
    }

    /// Runs forever, reconciling once per period. The first cycle runs immediately.
    pub async fn run(&self) {
        log::info!("Reconciling every {} seconds", self.period.as_secs());

        let mut ticker = interval(self.period);
        // a slow cycle swallows the ticks it overran instead of bunching them up
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// One fetch, reconcile, commit cycle, or nothing if a cycle is already running
    pub async fn tick(&self) -> TickOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            log::warn!("Previous reconciliation still running, skipping tick");
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            return TickOutcome::Skipped;
        };
        self.counters.ticks.fetch_add(1, Ordering::Relaxed);

        let snapshot = match self.feed.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::error!("Error fetching feed: {}", e);
                let message = e.to_string();
                self.record_failure(&message);
                return TickOutcome::FetchFailed(message);
            }
        };

        log::debug!("Start reconciling {} vehicles", snapshot.len());

        let current = self.store.read();
        let next = reconcile(&current, &snapshot, self.max_points);
        let count = next.len();

        if let Err(e) = self.store.commit(next).await {
            log::error!("Error committing state: {}", e);
            let message = e.to_string();
            self.record_failure(&message);
            return TickOutcome::CommitFailed(message);
        }

        log::debug!("End reconciling - {} vehicles tracked", count);
        if let Ok(mut last) = self.counters.last.lock() {
            last.0 = Some(Utc::now());
        }

        TickOutcome::Committed { vehicles: count }
    }

    pub fn stats(&self) -> SchedulerStats {
        let (last_success, last_error) = self
            .counters
            .last
            .lock()
            .map(|last| last.clone())
            .unwrap_or_default();

        SchedulerStats {
            ticks: self.counters.ticks.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            last_success,
            last_error,
        }
    }

    fn record_failure(&self, message: &str) {
        self.counters.failures.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.counters.last.lock() {
            last.1 = Some(message.to_string());
        }
    }
}
