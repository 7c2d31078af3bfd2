//! Node traits and the listing type
//!
//! Directories and leaves are shared as `Arc<dyn ...>` so a listing can be
//! handed to freshly spawned tasks without copying the tree.

use crate::error::NodeResult;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared handle to a directory node
pub type DirRef = Arc<dyn Dir>;

/// Shared handle to a leaf node
pub type FileRef = Arc<dyn File>;

/// A directory-like container node
#[async_trait]
pub trait Dir: Send + Sync {
    /// Path used to identify this node in errors and logs
    fn path(&self) -> &str;

    /// List the immediate children of this node.
    ///
    /// Must return promptly with `NodeError::Cancelled` once `cancel` fires.
    async fn list(&self, cancel: &CancellationToken) -> NodeResult<Listing>;
}

/// A leaf object that only has a size
#[async_trait]
pub trait File: Send + Sync {
    /// Path used to identify this node in errors and logs
    fn path(&self) -> &str;

    /// Size of this leaf in bytes
    async fn stat(&self, cancel: &CancellationToken) -> NodeResult<u64>;
}

/// Children returned by a single [`Dir::list`] call
#[derive(Clone, Default)]
pub struct Listing {
    /// Sub-directories, each explored by its own task
    pub dirs: Vec<DirRef>,

    /// Leaves, measured sequentially by the listing task
    pub files: Vec<FileRef>,
}

impl Listing {
    /// Create a listing from its parts
    pub fn new(dirs: Vec<DirRef>, files: Vec<FileRef>) -> Self {
        Self { dirs, files }
    }

    /// Check if the listing has no children at all
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }

    /// Total number of children
    pub fn len(&self) -> usize {
        self.dirs.len() + self.files.len()
    }
}

impl fmt::Debug for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listing")
            .field("dirs", &self.dirs.iter().map(|d| d.path()).collect::<Vec<_>>())
            .field("files", &self.files.iter().map(|l| l.path()).collect::<Vec<_>>())
            .finish()
    }
}
