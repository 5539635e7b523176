//! Engine counters and logging setup.
//!
//! Counters are shared between the engine components through an `Arc` and can
//! be dumped as a single structured log line.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Running totals for everything the engine decides.
pub struct ArenaMetrics {
    breedings: AtomicU64,
    mutations: AtomicU64,
    human_pairings: AtomicU64,
    synthetic_pairings: AtomicU64,
    battles_resolved: AtomicU64,
    battles_fled: AtomicU64,
    snapshot_skips: AtomicU64,
    start_time: Instant,
}

impl Default for ArenaMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`ArenaMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub breedings: u64,
    pub mutations: u64,
    pub human_pairings: u64,
    pub synthetic_pairings: u64,
    pub battles_resolved: u64,
    pub battles_fled: u64,
    pub snapshot_skips: u64,
}

impl ArenaMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            breedings: AtomicU64::new(0),
            mutations: AtomicU64::new(0),
            human_pairings: AtomicU64::new(0),
            synthetic_pairings: AtomicU64::new(0),
            battles_resolved: AtomicU64::new(0),
            battles_fled: AtomicU64::new(0),
            snapshot_skips: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_breeding(&self, mutated: bool) {
        self.breedings.fetch_add(1, Ordering::Relaxed);
        if mutated {
            self.mutations.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_pairing(&self, synthetic: bool) {
        let counter = if synthetic {
            &self.synthetic_pairings
        } else {
            &self.human_pairings
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_battle_end(&self, fled: bool) {
        let counter = if fled {
            &self.battles_fled
        } else {
            &self.battles_resolved
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_skip(&self) {
        self.snapshot_skips.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            breedings: self.breedings.load(Ordering::Relaxed),
            mutations: self.mutations.load(Ordering::Relaxed),
            human_pairings: self.human_pairings.load(Ordering::Relaxed),
            synthetic_pairings: self.synthetic_pairings.load(Ordering::Relaxed),
            battles_resolved: self.battles_resolved.load(Ordering::Relaxed),
            battles_fled: self.battles_fled.load(Ordering::Relaxed),
            snapshot_skips: self.snapshot_skips.load(Ordering::Relaxed),
        }
    }

    /// Gets elapsed time since metrics creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs every counter as one structured event.
    pub fn log_summary(&self) {
        let s = self.snapshot();
        tracing::info!(
            breedings = s.breedings,
            mutations = s.mutations,
            human_pairings = s.human_pairings,
            synthetic_pairings = s.synthetic_pairings,
            battles_resolved = s.battles_resolved,
            battles_fled = s.battles_fled,
            snapshot_skips = s.snapshot_skips,
            uptime_ms = self.elapsed().as_millis() as u64,
            "Arena summary"
        );
    }
}

/// Initialize tracing subscriber for logging. Honours `RUST_LOG`, defaults to `info`.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}
