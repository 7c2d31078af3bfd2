//! In-memory directory and file nodes

use crate::error::{NodeError, NodeResult};
use crate::fixture::join_path;
use crate::fixture::probe::ListingProbe;
use crate::sizer::SizeResult;
use crate::tree::{Dir, DirRef, File, FileRef, Listing};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Failure injected into a node's list (directories) or stat (files) call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Return this error
    Fail(NodeError),

    /// Panic inside the call
    Panic,

    /// Never return until cancelled
    Hang,
}

/// Per-node behaviour shared by directories and files
#[derive(Debug, Clone, Default)]
struct Behavior {
    fault: Option<Fault>,
    latency: Duration,
    probe: Option<ListingProbe>,
}

impl Behavior {
    /// Simulate the cost and failure mode of one call
    async fn simulate(&self, path: &str, cancel: &CancellationToken) -> NodeResult<()> {
        if cancel.is_cancelled() {
            return Err(NodeError::Cancelled);
        }

        if !self.latency.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(NodeError::Cancelled),
                _ = tokio::time::sleep(self.latency) => {}
            }
        }

        match &self.fault {
            None => Ok(()),
            Some(Fault::Fail(error)) => Err(error.clone()),
            Some(Fault::Panic) => panic!("injected panic at '{}'", path),
            Some(Fault::Hang) => {
                cancel.cancelled().await;
                Err(NodeError::Cancelled)
            }
        }
    }
}

/// A leaf with a fixed size
#[derive(Debug, Clone)]
pub struct MemFile {
    path: String,
    size: u64,
    behavior: Behavior,
}

impl MemFile {
    /// Create a file at `path` with `size` bytes
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            behavior: Behavior::default(),
        }
    }

    /// Size this file reports from `stat`
    pub fn size(&self) -> u64 {
        self.size
    }
}

#[async_trait]
impl File for MemFile {
    fn path(&self) -> &str {
        &self.path
    }

    async fn stat(&self, cancel: &CancellationToken) -> NodeResult<u64> {
        if let Some(probe) = &self.behavior.probe {
            probe.record_stat();
        }
        self.behavior.simulate(&self.path, cancel).await?;
        Ok(self.size)
    }
}

/// A directory holding sub-directories and files
#[derive(Debug, Clone)]
pub struct MemDir {
    path: String,
    dirs: Vec<Arc<MemDir>>,
    files: Vec<Arc<MemFile>>,
    behavior: Behavior,
}

impl MemDir {
    /// Create an empty directory at `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            dirs: Vec::new(),
            files: Vec::new(),
            behavior: Behavior::default(),
        }
    }

    /// Add a file named `name` below this directory
    pub fn with_file(mut self, name: &str, size: u64) -> Self {
        self.files
            .push(Arc::new(MemFile::new(join_path(&self.path, name), size)));
        self
    }

    /// Add a file whose `stat` fails with `fault`
    pub fn with_faulty_file(mut self, name: &str, fault: Fault) -> Self {
        let mut file = MemFile::new(join_path(&self.path, name), 0);
        file.behavior.fault = Some(fault);
        self.files.push(Arc::new(file));
        self
    }

    /// Add a sub-directory named `name`, populated by `build`
    pub fn with_dir(mut self, name: &str, build: impl FnOnce(MemDir) -> MemDir) -> Self {
        let child = build(MemDir::new(join_path(&self.path, name)));
        self.dirs.push(Arc::new(child));
        self
    }

    /// Make this directory's `list` fail with `fault`
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.behavior.fault = Some(fault);
        self
    }

    /// Apply `latency` to every list and stat call in this subtree
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.for_each_behavior(&mut |b: &mut Behavior| b.latency = latency);
        self
    }

    /// Report every list and stat call in this subtree to `probe`
    pub fn instrument(mut self, probe: &ListingProbe) -> Self {
        self.for_each_behavior(&mut |b: &mut Behavior| b.probe = Some(probe.clone()));
        self
    }

    /// Inject `fault` into the node at `path`. Returns false if there is none.
    pub fn inject_fault(&mut self, path: &str, fault: Fault) -> bool {
        if self.path == path {
            self.behavior.fault = Some(fault);
            return true;
        }

        if let Some(file) = self.files.iter_mut().find(|f| f.path == path) {
            Arc::make_mut(file).behavior.fault = Some(fault);
            return true;
        }

        self.dirs
            .iter_mut()
            .filter(|d| is_within(path, &d.path))
            .any(|d| Arc::make_mut(d).inject_fault(path, fault.clone()))
    }

    /// Totals a fault-free run over this subtree must produce
    pub fn expected_totals(&self) -> SizeResult {
        let own = SizeResult::new(
            self.files.iter().map(|f| f.size()).sum(),
            self.files.len() as u64,
            1,
        );
        self.dirs.iter().fold(own, |acc, d| {
            let sub = d.expected_totals();
            SizeResult::new(acc.size + sub.size, acc.count + sub.count, acc.dirs + sub.dirs)
        })
    }

    fn for_each_behavior(&mut self, f: &mut dyn FnMut(&mut Behavior)) {
        f(&mut self.behavior);
        for file in &mut self.files {
            f(&mut Arc::make_mut(file).behavior);
        }
        for dir in &mut self.dirs {
            Arc::make_mut(dir).for_each_behavior(f);
        }
    }
}

#[async_trait]
impl Dir for MemDir {
    fn path(&self) -> &str {
        &self.path
    }

    async fn list(&self, cancel: &CancellationToken) -> NodeResult<Listing> {
        let _active = self.behavior.probe.as_ref().map(ListingProbe::enter_list);
        self.behavior.simulate(&self.path, cancel).await?;

        let dirs = self.dirs.iter().map(|d| Arc::clone(d) as DirRef).collect();
        let files = self.files.iter().map(|f| Arc::clone(f) as FileRef).collect();
        Ok(Listing::new(dirs, files))
    }
}

fn is_within(path: &str, dir: &str) -> bool {
    path == dir
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| dir.ends_with('/') || rest.starts_with('/'))
}
