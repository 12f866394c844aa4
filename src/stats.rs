use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct RunStats {
    start_ms: AtomicU64,

    listings_seen: AtomicU64,
    duplicates_skipped: AtomicU64,
    duplicates_replaced: AtomicU64,

    cache_hits: AtomicU64,
    remote_fetches: AtomicU64,

    rows_written: AtomicU64,
}

impl RunStats {
    pub fn new(now_ms: u64) -> Arc<Self> {
        let s = Arc::new(Self::default());
        s.start_ms.store(now_ms, Ordering::Relaxed);
        s
    }

    pub fn inc_listing_seen(&self) {
        self.listings_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_duplicate_skipped(&self) {
        self.duplicates_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_duplicate_replaced(&self) {
        self.duplicates_replaced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_remote_fetch(&self) {
        self.remote_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_rows_written(&self, n: u64) {
        self.rows_written.store(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self, now_ms: u64) -> StatsSnapshot {
        let start = self.start_ms.load(Ordering::Relaxed);
        StatsSnapshot {
            now_ms,
            elapsed_ms: now_ms.saturating_sub(start),
            listings_seen: self.listings_seen.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            duplicates_replaced: self.duplicates_replaced.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            remote_fetches: self.remote_fetches.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub now_ms: u64,
    pub elapsed_ms: u64,
    pub listings_seen: u64,
    pub duplicates_skipped: u64,
    pub duplicates_replaced: u64,
    pub cache_hits: u64,
    pub remote_fetches: u64,
    pub rows_written: u64,
}
