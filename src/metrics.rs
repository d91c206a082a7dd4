use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::scanner::{CacheStats, ContentCache};

/// Process counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub clean_passes: Arc<AtomicU64>,
    pub clean_failures: Arc<AtomicU64>,
    pub files_served: Arc<AtomicU64>,
    pub files_deleted: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            clean_passes: Arc::new(AtomicU64::new(0)),
            clean_failures: Arc::new(AtomicU64::new(0)),
            files_served: Arc::new(AtomicU64::new(0)),
            files_deleted: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_clean_passes(&self) {
        self.clean_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_clean_failures(&self) {
        self.clean_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_files_served(&self) {
        self.files_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_files_deleted(&self) {
        self.files_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self, cache: &ContentCache) -> MetricsSnapshot {
        MetricsSnapshot {
            clean_passes: self.clean_passes.load(Ordering::Relaxed),
            clean_failures: self.clean_failures.load(Ordering::Relaxed),
            files_served: self.files_served.load(Ordering::Relaxed),
            files_deleted: self.files_deleted.load(Ordering::Relaxed),
            cache: cache.stats(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub clean_passes: u64,
    pub clean_failures: u64,
    pub files_served: u64,
    pub files_deleted: u64,
    pub cache: CacheStats,
    pub uptime_seconds: u64,
}
