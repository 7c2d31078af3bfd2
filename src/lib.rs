//! dir-sizer - Bounded-Concurrency Tree Sizing
//!
//! Computes the total byte size and file count of a directory tree whose
//! nodes sit behind slow, fallible calls (remote storage, object stores,
//! synthetic trees), with at most a fixed number of directory listings in
//! flight at once.
//!
//! # Features
//!
//! - **Bounded Concurrency**: An admission pool hands out one token per
//!   in-flight listing. The bound holds no matter how wide or deep the tree is.
//!
//! - **Fail Fast**: The first list or stat error aborts the run, stops every
//!   outstanding task and is returned to the caller.
//!
//! - **Cancellation**: A caller-supplied token (and an optional deadline)
//!   stops the run promptly. No task outlives the call.
//!
//! - **Pluggable Trees**: The sizer consumes the [`Dir`] and [`File`] traits.
//!   [`fixture`] provides in-memory trees with fault injection.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Tree backend (Dir / File)                       │
//! │              list(cancel)          stat(cancel)                  │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Directory Tasks                           │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐     │
//! │  │ Task /  │  │ Task /a │  │ Task /b │  ...    │ Task /x │     │
//! │  └────┬────┘  └────┬────┘  └────┬────┘         └────┬────┘     │
//! │       │            │            │                    │          │
//! │       └────────────┼────────────┼────────────────────┘          │
//! │                    ▼            ▼                               │
//! │            ┌──────────────────────────┐                         │
//! │            │     Admission Pool       │                         │
//! │            │  - W tokens              │                         │
//! │            │  - cancel-aware acquire  │                         │
//! │            └──────────────────────────┘                         │
//! │                         │ partial reports                       │
//! │                         ▼                                       │
//! │            ┌──────────────────────────┐                         │
//! │            │       Aggregator         │                         │
//! │            │  - outstanding counter   │                         │
//! │            │  - first error wins      │                         │
//! │            └──────────────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//!                    ┌──────────────────┐
//!                    │   SizeResult     │
//!                    │  size / count    │
//!                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use dir_sizer::fixture::MemDir;
//! use dir_sizer::DirSizer;
//! use std::sync::Arc;
//!
//! let root = MemDir::new("/")
//!     .with_dir("a", |d| d.with_file("f1", 10))
//!     .with_dir("b", |d| d.with_file("f1", 5).with_file("f2", 7));
//!
//! let result = DirSizer::with_workers(4)?.size_blocking(Arc::new(root))?;
//! assert_eq!((result.size, result.count), (22, 3));
//! # Ok::<(), dir_sizer::SizeError>(())
//! ```

pub mod config;
pub mod error;
pub mod fixture;
pub mod sizer;
pub mod summary;
pub mod tree;

pub use config::{CliArgs, SizerConfig, MIN_WORKERS};
pub use error::{ConfigError, NodeError, NodeOp, NodeResult, Result, SizeError, WorkerError};
pub use sizer::{compute, DirSizer, SizeResult};
pub use tree::{Dir, DirRef, File, FileRef, Listing};
