//! Tree node abstraction
//!
//! The sizer never touches a filesystem directly. It consumes two traits:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                        Dir                           │
//! │  - list(cancel) -> Listing { dirs, files }           │
//! │  - fallible, cancellation-aware                      │
//! └─────────────────────────────────────────────────────┘
//!                          │ files
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                        File                          │
//! │  - stat(cancel) -> byte size                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations are expected to return [`NodeError::Cancelled`]
//! promptly when the token passed to `list`/`stat` fires.
//!
//! [`NodeError::Cancelled`]: crate::error::NodeError::Cancelled

pub mod types;

pub use types::{Dir, DirRef, File, FileRef, Listing};
