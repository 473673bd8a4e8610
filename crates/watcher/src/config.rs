//! Watcher configuration
//!
//! Loaded from TOML, every field optional:
//! ```toml
//! queue_capacity = 256
//! omit = ["access"]
//! ```

use crate::error::Result;
use crate::platform::Vocabulary;
use serde::{Deserialize, Serialize};
use std::path::Path;
use watchmux_core::Event;

/// Watcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Capacity of subscriber queues created by `Watcher::channel` (default: 128)
    ///
    /// Events that arrive while a queue is full are dropped for that
    /// subscriber.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Event names kept out of every watchpoint aggregate, on top of the
    /// backend's own exclusions
    #[serde(default)]
    pub omit: Vec<String>,
}

impl WatcherConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Exclusion mask for watchpoints on the given backend
    pub fn omit_mask(&self, vocabulary: &Vocabulary) -> Result<Event> {
        let mut mask = vocabulary.omit;
        for name in &self.omit {
            mask |= vocabulary.parse(name)?;
        }
        Ok(mask)
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            omit: vec![],
        }
    }
}

fn default_queue_capacity() -> usize {
    128
}
