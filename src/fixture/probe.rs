//! Call instrumentation shared by every node of a synthetic tree

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ProbeState {
    lists: AtomicU64,
    stats: AtomicU64,
    active: AtomicUsize,
    peak: AtomicUsize,
}

/// Records list/stat calls and the peak number of concurrent listings
#[derive(Debug, Clone, Default)]
pub struct ListingProbe {
    state: Arc<ProbeState>,
}

impl ListingProbe {
    /// Create a probe with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a listing as in flight until the returned guard is dropped
    pub fn enter_list(&self) -> ActiveListing {
        self.state.lists.fetch_add(1, Ordering::Relaxed);
        let active = self.state.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak.fetch_max(active, Ordering::SeqCst);
        ActiveListing {
            state: Arc::clone(&self.state),
        }
    }

    /// Count one stat call
    pub fn record_stat(&self) {
        self.state.stats.fetch_add(1, Ordering::Relaxed);
    }

    /// Total list calls
    pub fn lists(&self) -> u64 {
        self.state.lists.load(Ordering::Relaxed)
    }

    /// Total stat calls
    pub fn stats(&self) -> u64 {
        self.state.stats.load(Ordering::Relaxed)
    }

    /// Listings currently in flight
    pub fn active_listings(&self) -> usize {
        self.state.active.load(Ordering::SeqCst)
    }

    /// Highest number of listings ever in flight at once
    pub fn peak_listings(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }
}

/// RAII guard for an in-flight listing
#[derive(Debug)]
pub struct ActiveListing {
    state: Arc<ProbeState>,
}

impl Drop for ActiveListing {
    fn drop(&mut self) {
        self.state.active.fetch_sub(1, Ordering::SeqCst);
    }
}
