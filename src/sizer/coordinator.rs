//! Size coordinator - orchestrates one sizing run
//!
//! The coordinator is responsible for:
//! - Setting up the admission pool, report channel and task tracker
//! - Launching the root task
//! - Running the aggregator, under the configured deadline if any
//! - Stopping every outstanding task once the aggregator is done
//! - Waiting for all tasks to exit before returning

use crate::config::SizerConfig;
use crate::error::{Result, SizeError};
use crate::sizer::admission::AdmissionPool;
use crate::sizer::aggregator::Aggregator;
use crate::sizer::dispatcher::Dispatcher;
use crate::sizer::report::SizeResult;
use crate::tree::DirRef;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

/// Computes the total size and leaf count of a tree
#[derive(Debug, Clone, Default)]
pub struct DirSizer {
    config: SizerConfig,
}

impl DirSizer {
    /// Create a sizer from a validated configuration
    pub fn new(config: SizerConfig) -> Result<Self> {
        Ok(Self {
            config: config.validate()?,
        })
    }

    /// Create a sizer with the given worker bound
    pub fn with_workers(max_workers: usize) -> Result<Self> {
        Self::new(SizerConfig::with_workers(max_workers))
    }

    /// The configuration this sizer runs with
    pub fn config(&self) -> &SizerConfig {
        &self.config
    }

    /// Compute the aggregate size of everything under `root`.
    ///
    /// Returns the complete result, or the first error observed. Dropping
    /// the returned future stops every task it launched.
    pub async fn size(&self, cancel: &CancellationToken, root: DirRef) -> Result<SizeResult> {
        if cancel.is_cancelled() {
            return Err(SizeError::Cancelled);
        }

        let start = Instant::now();
        let workers = self.config.effective_workers();

        info!(
            root = %root.path(),
            workers = workers,
            deadline_ms = self.config.deadline.map(|d| d.as_millis() as u64),
            "Starting size computation"
        );

        let run = cancel.child_token();
        let _stop_on_drop = run.clone().drop_guard();

        let pool = AdmissionPool::new(workers);
        let tracker = TaskTracker::new();
        let (tx, rx) = mpsc::channel(self.config.report_buffer);

        let Some(root_permit) = pool.acquire(&run).await else {
            return Err(SizeError::Cancelled);
        };

        let dispatcher = Dispatcher::new(pool.clone(), tx, run.clone(), tracker.clone());
        dispatcher.launch(root, root_permit);
        drop(dispatcher);

        let aggregation = Aggregator::new().run(rx, &run);
        let result = match self.config.deadline {
            Some(deadline) => tokio::time::timeout(deadline, aggregation)
                .await
                .unwrap_or(Err(SizeError::DeadlineExceeded(deadline))),
            None => aggregation.await,
        };

        // Tasks drop out at their next await, slow node calls included.
        run.cancel();
        tracker.close();
        tracker.wait().await;

        let stats = pool.stats();
        debug!(
            capacity = pool.capacity(),
            acquired = stats.acquired(),
            waits = stats.waits(),
            aborted = stats.aborted(),
            peak_in_use = stats.peak_in_use(),
            "Admission statistics"
        );

        let duration = start.elapsed();
        match &result {
            Ok(totals) => info!(
                size = totals.size,
                count = totals.count,
                dirs = totals.dirs,
                duration_ms = duration.as_millis() as u64,
                "Size computation completed"
            ),
            Err(e) => info!(
                error = %e,
                duration_ms = duration.as_millis() as u64,
                "Size computation failed"
            ),
        }

        result
    }

    /// Blocking variant of [`DirSizer::size`] for synchronous callers.
    ///
    /// Builds a multi-thread runtime for the duration of the call, so it must
    /// not be called from inside an async context.
    pub fn size_blocking(&self, root: DirRef) -> Result<SizeResult> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let cancel = CancellationToken::new();
        runtime.block_on(self.size(&cancel, root))
    }
}

/// Compute the aggregate size under `root` with at most `worker_bound`
/// concurrent listings, clamped to `MIN_WORKERS..=MAX_WORKERS`.
pub async fn compute(
    cancel: &CancellationToken,
    root: DirRef,
    worker_bound: usize,
) -> Result<SizeResult> {
    DirSizer::with_workers(worker_bound)?.size(cancel, root).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::fixture::{Fault, ListingProbe, MemDir};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_new_validates() {
        assert!(DirSizer::with_workers(8).is_ok());
        assert_eq!(
            DirSizer::with_workers(100_000).unwrap().config().effective_workers(),
            crate::config::MAX_WORKERS
        );
        assert!(matches!(
            DirSizer::new(SizerConfig::default().report_buffer(0)),
            Err(SizeError::Config(ConfigError::InvalidReportBuffer { .. }))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_size_small_tree() {
        let root = MemDir::new("/")
            .with_dir("a", |d| d.with_file("f1", 10))
            .with_dir("b", |d| d.with_file("f1", 5).with_file("f2", 7));

        let cancel = CancellationToken::new();
        let result = compute(&cancel, Arc::new(root), 4).await.unwrap();
        assert_eq!(result, SizeResult::new(22, 3, 3));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_deadline_exceeded() {
        let probe = ListingProbe::new();
        let root = MemDir::new("/")
            .with_dir("stuck", |d| d.with_fault(Fault::Hang))
            .instrument(&probe);

        let sizer = DirSizer::new(SizerConfig::default().deadline(Duration::from_millis(50))).unwrap();
        let cancel = CancellationToken::new();
        let err = sizer.size(&cancel, Arc::new(root)).await.unwrap_err();

        assert!(matches!(err, SizeError::DeadlineExceeded(d) if d == Duration::from_millis(50)));
        assert!(!cancel.is_cancelled());
        assert_eq!(probe.active_listings(), 0);
    }

    #[test]
    fn test_size_blocking() {
        let root = MemDir::new("/").with_file("only", 99);
        let result = DirSizer::default().size_blocking(Arc::new(root)).unwrap();
        assert_eq!(result, SizeResult::new(99, 1, 1));
    }
}
