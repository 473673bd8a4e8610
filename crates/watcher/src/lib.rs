//! File system watching for watchmux
//!
//! This crate connects the core watchpoints to a real OS backend:
//! - Platform event vocabularies and raw event translation
//! - A `notify`-backed watcher that starts, stops and re-registers OS
//!   watches as subscriptions change
//! - TOML configuration

pub mod config;
pub mod error;
pub mod platform;
pub mod watcher;

// Re-exports
pub use config::WatcherConfig;
pub use error::{Result, WatchError};
pub use platform::{RawEvent, Sys, Vocabulary};
pub use watcher::Watcher;
pub use watchmux_core::{Event, EventDiff, EventInfo, Handle, Watchpoint};
