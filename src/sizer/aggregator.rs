//! Aggregator - reduces task messages into one result
//!
//! The aggregator is the only owner of the running totals and of the
//! outstanding-report counter. The counter starts at 1 (the root task); each
//! report retires itself and adds the sub-tasks it announces. The run
//! succeeds when the counter reaches zero.
//!
//! The first error *received* wins. When several branches fail at once,
//! which of their errors is received first is a race on the channel and is
//! not specified.

use crate::error::{Result, SizeError, WorkerError};
use crate::sizer::report::{PartialReport, SizeResult, TaskMessage};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Running state of one sizing run
#[derive(Debug)]
pub struct Aggregator {
    totals: SizeResult,
    outstanding: u64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Create an aggregator expecting the root report
    pub fn new() -> Self {
        Self {
            totals: SizeResult::default(),
            outstanding: 1,
        }
    }

    /// Reports still owed
    pub fn outstanding(&self) -> u64 {
        self.outstanding
    }

    /// Totals accumulated so far
    pub fn totals(&self) -> SizeResult {
        self.totals
    }

    /// Fold one report in. Returns true once every owed report has arrived.
    pub fn absorb(&mut self, report: PartialReport) -> bool {
        debug_assert!(self.outstanding > 0, "report received after completion");
        self.totals += report;
        self.outstanding = self.outstanding - 1 + report.spawned;
        self.outstanding == 0
    }

    /// Consume task messages until the run completes, fails or is cancelled
    pub async fn run(
        mut self,
        mut reports: mpsc::Receiver<TaskMessage>,
        cancel: &CancellationToken,
    ) -> Result<SizeResult> {
        loop {
            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(outstanding = self.outstanding, "Aggregation cancelled");
                    return Err(SizeError::Cancelled);
                }
                message = reports.recv() => message,
            };

            match message {
                Some(TaskMessage::Report(report)) => {
                    if self.absorb(report) {
                        return Ok(self.totals);
                    }
                }
                Some(TaskMessage::Failed(error)) => {
                    warn!(error = %error, outstanding = self.outstanding, "Aborting run on first error");
                    return Err(error);
                }
                None => {
                    return Err(WorkerError::ReportChannelClosed {
                        outstanding: self.outstanding,
                    }
                    .into());
                }
            }
        }
    }
}
