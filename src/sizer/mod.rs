//! Bounded-concurrency size aggregation
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │        DirSizer         │
//!                     │  - run token + deadline │
//!                     │  - task tracker         │
//!                     └───────────┬─────────────┘
//!                                 │ root task
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Task /   │             │  Task /a  │             │  Task /b  │
//! │ list+stat │             │ list+stat │             │ list+stat │
//! └─────┬─────┘             └─────┬─────┘             └─────┬─────┘
//!       │   AdmissionPool (W tokens, one per active listing) │
//!       └─────────────────────────┼─────────────────────────┘
//!                                 │ PartialReport / error
//!                     ┌───────────▼─────────────┐
//!                     │       Aggregator        │
//!                     │  - outstanding counter  │
//!                     │  - running totals       │
//!                     └─────────────────────────┘
//! ```

pub mod admission;
pub mod aggregator;
pub mod coordinator;
pub mod dispatcher;
pub mod report;

pub use admission::{AdmissionPermit, AdmissionPool, AdmissionStats};
pub use aggregator::Aggregator;
pub use coordinator::{compute, DirSizer};
pub use report::{PartialReport, SizeResult, TaskMessage};
