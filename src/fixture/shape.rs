//! Generated trees of a regular shape

use crate::fixture::memory::MemDir;
use crate::sizer::SizeResult;

/// Shape of a regular synthetic tree
///
/// Every directory holds `files_per_dir` files and, above the last level,
/// `breadth` sub-directories. File `fN` of each directory is
/// `file_size + N` bytes, so sizes differ within a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeShape {
    /// Levels of sub-directories below the root (0 = root only)
    pub depth: u32,

    /// Sub-directories per directory
    pub breadth: usize,

    /// Files per directory
    pub files_per_dir: usize,

    /// Size of the first file in each directory
    pub file_size: u64,
}

impl TreeShape {
    /// Number of directories in the tree, root included (None on overflow)
    pub fn dir_count(&self) -> Option<u64> {
        (0..=self.depth).try_fold(0u64, |acc, level| {
            (self.breadth as u64)
                .checked_pow(level)
                .and_then(|n| acc.checked_add(n))
        })
    }

    /// Totals a fault-free run over the generated tree must produce
    pub fn expected(&self) -> SizeResult {
        let dirs = self.dir_count().unwrap_or(u64::MAX);
        let files = self.files_per_dir as u64;
        let per_dir = files * self.file_size + files * files.saturating_sub(1) / 2;

        SizeResult::new(
            per_dir.saturating_mul(dirs),
            files.saturating_mul(dirs),
            dirs,
        )
    }

    /// Build the tree, rooted at "/"
    pub fn build(&self) -> MemDir {
        self.fill(MemDir::new("/"), 0)
    }

    fn fill(&self, mut dir: MemDir, level: u32) -> MemDir {
        for i in 0..self.files_per_dir {
            dir = dir.with_file(&format!("f{}", i), self.file_size + i as u64);
        }
        if level < self.depth {
            for i in 0..self.breadth {
                dir = dir.with_dir(&format!("d{}", i), |d| self.fill(d, level + 1));
            }
        }
        dir
    }
}
