//! Error types for the watcher

use std::path::PathBuf;
use thiserror::Error;
use watchmux_core::EventError;

/// Errors returned by [`Watcher`](crate::Watcher) and its configuration
#[derive(Debug, Error)]
pub enum WatchError {
    /// The OS watch backend failed
    #[error("watch backend error: {0}")]
    Backend(#[from] notify::Error),

    /// I/O failure (e.g. reading a config file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for [`WatcherConfig`](crate::WatcherConfig)
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// An event name could not be resolved
    #[error(transparent)]
    Event(#[from] EventError),

    /// Unsubscribe from a path that has no watchpoint
    #[error("path is not watched: {}", .0.display())]
    NotWatched(PathBuf),
}

/// Result type for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;
