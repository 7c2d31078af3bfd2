//! Error types for dir-sizer
//!
//! This module defines the error hierarchy for a sizing run:
//! - Node errors returned by tree implementations (list/stat failures)
//! - Traversal errors that pin a node error to the node that produced it
//! - Cancellation and deadline errors
//! - Configuration and worker errors
//!
//! Every error is fatal to the run that produced it. A run returns either a
//! complete [`SizeResult`](crate::SizeResult) or exactly one of these errors.

use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Top-level error type for a sizing run
#[derive(Error, Debug)]
pub enum SizeError {
    /// A list or stat call on a specific node failed
    #[error("Failed to {op} '{path}': {source}")]
    Traversal {
        op: NodeOp,
        path: String,
        #[source]
        source: NodeError,
    },

    /// The caller's cancellation token fired before the run completed
    #[error("Operation cancelled")]
    Cancelled,

    /// The configured deadline elapsed before the run completed
    #[error("Deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (runtime construction, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SizeError {
    /// Build a traversal error.
    ///
    /// A node reporting cancellation becomes [`SizeError::Cancelled`] only if
    /// `cancel` has actually fired. Otherwise it is a node failure like any other.
    pub fn traversal(
        op: NodeOp,
        path: impl Into<String>,
        source: NodeError,
        cancel: &CancellationToken,
    ) -> Self {
        if source.is_cancelled() && cancel.is_cancelled() {
            return SizeError::Cancelled;
        }
        SizeError::Traversal {
            op,
            path: path.into(),
            source,
        }
    }

    /// Returns true for cancellation and deadline errors
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SizeError::Cancelled | SizeError::DeadlineExceeded(_))
    }

    /// Path of the node that failed, if the error is tied to one
    pub fn path(&self) -> Option<&str> {
        match self {
            SizeError::Traversal { path, .. } => Some(path),
            SizeError::Worker(WorkerError::Panicked { path, .. }) => Some(path),
            _ => None,
        }
    }
}

/// Node operation that produced a traversal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOp {
    /// Listing a directory's children
    List,
    /// Measuring a leaf
    Stat,
}

impl fmt::Display for NodeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeOp::List => f.write_str("list"),
            NodeOp::Stat => f.write_str("stat"),
        }
    }
}

/// Errors returned by tree node implementations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// Permission denied
    #[error("Permission denied: '{path}'")]
    PermissionDenied { path: String },

    /// Path not found
    #[error("Path not found: '{path}'")]
    NotFound { path: String },

    /// I/O failure while talking to the backing store
    #[error("I/O failure on '{path}': {reason}")]
    Io { path: String, reason: String },

    /// The call observed cancellation and returned early
    #[error("Call cancelled")]
    Cancelled,

    /// Any other implementation-specific failure
    #[error("{0}")]
    Other(String),
}

impl NodeError {
    /// Map a std I/O error onto the node error taxonomy
    pub fn from_io(path: impl Into<String>, err: &io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::PermissionDenied => NodeError::PermissionDenied { path },
            io::ErrorKind::NotFound => NodeError::NotFound { path },
            _ => NodeError::Io {
                path,
                reason: err.to_string(),
            },
        }
    }

    /// Check if this error reports cancellation rather than a node failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, NodeError::Cancelled)
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be at most {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid report channel capacity
    #[error("Invalid report buffer {size}: must be at least {min}")]
    InvalidReportBuffer { size: usize, min: usize },

    /// A zero deadline can never be met
    #[error("Invalid deadline: must be greater than zero")]
    InvalidDeadline,

    /// Synthetic tree would be too large to build in memory
    #[error("Synthetic tree too large: {dirs} directories exceeds limit of {max}")]
    TreeTooLarge { dirs: u64, max: u64 },
}

/// Worker task errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// A node implementation panicked inside a worker task
    #[error("Worker for '{path}' panicked: {message}")]
    Panicked { path: String, message: String },

    /// Every report sender went away while reports were still owed
    #[error("Report channel closed with {outstanding} reports outstanding")]
    ReportChannelClosed { outstanding: u64 },
}

/// Result type alias for SizeError
pub type Result<T> = std::result::Result<T, SizeError>;

/// Result type alias for NodeError
pub type NodeResult<T> = std::result::Result<T, NodeError>;
