//! Admission control for directory listings
//!
//! A fixed pool of tokens bounds how many listings are in flight at once.
//! A token is taken before a directory task is launched and released when
//! that task's own listing (and the stats of its leaves) completes, not when
//! its whole subtree completes. Waiting for a token is cancellable.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio_util::sync::CancellationToken;

/// Statistics for the admission pool
#[derive(Debug, Default)]
pub struct AdmissionStats {
    acquired: AtomicU64,
    waits: AtomicU64,
    aborted: AtomicU64,
    in_use: AtomicUsize,
    peak_in_use: AtomicUsize,
}

impl AdmissionStats {
    /// Total tokens handed out
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }

    /// Number of acquisitions that blocked
    pub fn waits(&self) -> u64 {
        self.waits.load(Ordering::Relaxed)
    }

    /// Number of acquisitions abandoned on cancellation
    pub fn aborted(&self) -> u64 {
        self.aborted.load(Ordering::Relaxed)
    }

    /// Tokens currently held
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::SeqCst)
    }

    /// Highest number of tokens held at once
    pub fn peak_in_use(&self) -> usize {
        self.peak_in_use.load(Ordering::SeqCst)
    }
}

/// Pool of admission tokens shared by every task of a run
#[derive(Debug, Clone)]
pub struct AdmissionPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    stats: Arc<AdmissionStats>,
}

impl AdmissionPool {
    /// Create a pool holding `capacity` tokens
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            stats: Arc::new(AdmissionStats::default()),
        }
    }

    /// Number of tokens in the pool
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens not currently held
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Pool statistics
    pub fn stats(&self) -> Arc<AdmissionStats> {
        Arc::clone(&self.stats)
    }

    /// Acquire a token, waiting while all are held.
    ///
    /// Returns `None` if `cancel` fires first (or has already fired).
    pub async fn acquire(&self, cancel: &CancellationToken) -> Option<AdmissionPermit> {
        if cancel.is_cancelled() {
            self.stats.aborted.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let permit = match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::Closed) => return None,
            Err(TryAcquireError::NoPermits) => {
                self.stats.waits.fetch_add(1, Ordering::Relaxed);

                let acquired = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = Arc::clone(&self.semaphore).acquire_owned() => permit.ok(),
                };

                match acquired {
                    Some(permit) => permit,
                    None => {
                        self.stats.aborted.fetch_add(1, Ordering::Relaxed);
                        return None;
                    }
                }
            }
        };

        Some(self.admit(permit))
    }

    fn admit(&self, permit: OwnedSemaphorePermit) -> AdmissionPermit {
        self.stats.acquired.fetch_add(1, Ordering::Relaxed);
        let held = self.stats.in_use.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak_in_use.fetch_max(held, Ordering::SeqCst);

        AdmissionPermit {
            _permit: permit,
            stats: Arc::clone(&self.stats),
        }
    }
}

/// RAII guard for a held admission token
///
/// The token goes back to the pool when this is dropped, on every exit path.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    stats: Arc<AdmissionStats>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.stats.in_use.fetch_sub(1, Ordering::SeqCst);
    }
}
