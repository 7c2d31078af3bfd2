//! Messages exchanged between directory tasks and the aggregator

use crate::error::SizeError;
use std::ops::AddAssign;

/// Aggregate result of a completed sizing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SizeResult {
    /// Total bytes of every leaf under the root
    pub size: u64,

    /// Number of leaves under the root
    pub count: u64,

    /// Number of directories listed, root included
    pub dirs: u64,
}

impl SizeResult {
    /// Create a result from its parts
    pub fn new(size: u64, count: u64, dirs: u64) -> Self {
        Self { size, count, dirs }
    }

    /// Check if no leaves were found
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Average leaf size in bytes (0 for an empty tree)
    pub fn average_size(&self) -> f64 {
        if self.count > 0 {
            self.size as f64 / self.count as f64
        } else {
            0.0
        }
    }
}

/// Contribution of one directory task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialReport {
    /// Bytes of the leaves listed directly in this directory
    pub size: u64,

    /// Number of leaves listed directly in this directory
    pub count: u64,

    /// Sub-directory tasks announced by this report
    pub spawned: u64,
}

impl PartialReport {
    /// Account for one measured leaf
    pub fn add_file(&mut self, size: u64) {
        self.size = self.size.saturating_add(size);
        self.count += 1;
    }
}

impl AddAssign<PartialReport> for SizeResult {
    fn add_assign(&mut self, report: PartialReport) {
        self.size = self.size.saturating_add(report.size);
        self.count += report.count;
        self.dirs += 1;
    }
}

/// Message sent by a task to the aggregator; each task sends exactly one
#[derive(Debug)]
pub enum TaskMessage {
    /// The task finished its listing
    Report(PartialReport),

    /// The task failed; the run is over
    Failed(SizeError),
}
