//! watchmux core - subscriber aggregation for file system watches
//!
//! This crate provides the backend-agnostic engine:
//! - Event bitmask algebra (canonical, native and control bits)
//! - Aggregate diffs telling callers when the OS watch must change
//! - Per-path watchpoints with non-blocking, drop-on-full fan-out

pub mod diff;
pub mod error;
pub mod event;
pub mod handle;
pub mod watchpoint;

// Re-export main types for convenience
pub use diff::EventDiff;
pub use error::EventError;
pub use event::{Event, CANONICAL, CONTROL};
pub use handle::{EventInfo, Handle, HandleId};
pub use watchpoint::Watchpoint;
