//! Work dispatcher - one task per directory
//!
//! Each task runs with an admission token already held:
//!
//! ```text
//! list ─► stat leaves (sequential) ─► release token ─► send report
//!                                                         │
//!                         for each sub-directory: acquire token ─► launch task
//! ```
//!
//! The report is enqueued before any sub-task it announces is launched, so
//! a child's report can never reach the aggregator ahead of the report that
//! accounts for it. A task never holds a token while it waits for another
//! one, which keeps the pool deadlock-free for any bound.
//!
//! Once the run token fires, every task is dropped where it stands, along
//! with any node call it is awaiting and the token it holds.

use crate::error::{NodeOp, Result, SizeError, WorkerError};
use crate::sizer::admission::{AdmissionPermit, AdmissionPool};
use crate::sizer::report::{PartialReport, TaskMessage};
use crate::tree::{Dir, DirRef};
use futures::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

/// Outcome of exploring one directory
struct Explored {
    report: PartialReport,
    subdirs: Vec<DirRef>,
}

/// Spawns and drives directory tasks for one run
#[derive(Clone)]
pub struct Dispatcher {
    pool: AdmissionPool,
    reports: mpsc::Sender<TaskMessage>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Dispatcher {
    /// Create a dispatcher sharing the run's pool, channel, token and tracker
    pub fn new(
        pool: AdmissionPool,
        reports: mpsc::Sender<TaskMessage>,
        cancel: CancellationToken,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            pool,
            reports,
            cancel,
            tracker,
        }
    }

    /// Launch a task for `dir`, handing it an already acquired token.
    ///
    /// The task is dropped at its next await once the run token fires, so an
    /// in-flight list or stat that ignores cancellation cannot hold the run open.
    pub fn launch(&self, dir: DirRef, permit: AdmissionPermit) {
        let cancel = self.cancel.clone();
        let task = self.clone().run_task(dir, permit);
        self.tracker.spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                _ = task => {}
            }
        });
    }

    // Boxed so the task future can spawn copies of itself.
    fn run_task(self, dir: DirRef, permit: AdmissionPermit) -> BoxFuture<'static, ()> {
        async move {
            let explored = AssertUnwindSafe(self.explore(dir.as_ref(), permit))
                .catch_unwind()
                .await;

            let subdirs = match explored {
                Ok(Ok(explored)) => {
                    if !self.send(TaskMessage::Report(explored.report)).await {
                        return;
                    }
                    explored.subdirs
                }
                Ok(Err(error)) => {
                    self.send(TaskMessage::Failed(error)).await;
                    return;
                }
                Err(panic) => {
                    let error = WorkerError::Panicked {
                        path: dir.path().to_string(),
                        message: panic_message(panic.as_ref()),
                    };
                    self.send(TaskMessage::Failed(error.into())).await;
                    return;
                }
            };

            for (launched, subdir) in subdirs.into_iter().enumerate() {
                let Some(permit) = self.pool.acquire(&self.cancel).await else {
                    debug!(path = %dir.path(), launched, "Admission cancelled, abandoning sub-directories");
                    return;
                };
                self.launch(subdir, permit);
            }
        }
        .boxed()
    }

    /// List `dir` and measure its leaves while holding the admission token
    async fn explore(&self, dir: &dyn Dir, permit: AdmissionPermit) -> Result<Explored> {
        let _permit = permit;

        if self.cancel.is_cancelled() {
            return Err(SizeError::Cancelled);
        }

        let listing = dir
            .list(&self.cancel)
            .await
            .map_err(|e| SizeError::traversal(NodeOp::List, dir.path(), e, &self.cancel))?;

        let mut report = PartialReport::default();
        for file in &listing.files {
            let size = file
                .stat(&self.cancel)
                .await
                .map_err(|e| SizeError::traversal(NodeOp::Stat, file.path(), e, &self.cancel))?;
            report.add_file(size);
        }
        report.spawned = listing.dirs.len() as u64;

        debug!(
            path = %dir.path(),
            files = report.count,
            bytes = report.size,
            subdirs = report.spawned,
            "Listed directory"
        );

        Ok(Explored {
            report,
            subdirs: listing.dirs,
        })
    }

    /// Deliver a message unless the run is already over
    async fn send(&self, message: TaskMessage) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.reports.send(message) => sent.is_ok(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
