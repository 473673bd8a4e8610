//! Error types for event name handling

use thiserror::Error;

/// Errors produced when resolving event names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// No event carries this name
    #[error("unknown event name: {0:?}")]
    UnknownName(String),

    /// An event list resolved to no bits at all
    #[error("event list is empty")]
    Empty,
}
