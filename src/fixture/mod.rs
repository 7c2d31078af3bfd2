//! Synthetic in-memory trees
//!
//! Deterministic [`Dir`](crate::tree::Dir)/[`File`](crate::tree::File)
//! implementations for tests, benchmarks and the stress binary. They are not
//! meant as a production tree backend.
//!
//! - [`MemDir`] / [`MemFile`]: nodes built explicitly or from a [`TreeShape`]
//! - [`Fault`]: per-node failure injection (error, panic, hang)
//! - [`ListingProbe`]: counts calls and records peak concurrent listings
//!
//! # Example
//!
//! ```
//! use dir_sizer::fixture::{ListingProbe, MemDir};
//!
//! let probe = ListingProbe::new();
//! let root = MemDir::new("/")
//!     .with_dir("a", |d| d.with_file("f1", 10))
//!     .with_dir("b", |d| d.with_file("f1", 5).with_file("f2", 7))
//!     .instrument(&probe);
//!
//! assert_eq!(root.expected_totals().size, 22);
//! ```

pub mod memory;
pub mod probe;
pub mod shape;

pub use memory::{Fault, MemDir, MemFile};
pub use probe::{ActiveListing, ListingProbe};
pub use shape::TreeShape;

/// Join a child name onto a parent path
pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}
