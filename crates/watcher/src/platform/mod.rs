//! Platform event adapters
//!
//! Each backend declares a [`Vocabulary`] of native event bits and maps raw
//! kernel records onto [`RawEvent`]s:
//! - `kqueue` - BSD/macOS vnode notes (translation only)
//! - `recommended` - events from the `notify` crate's recommended backend

pub mod kqueue;
pub mod recommended;

use std::io;
use std::path::{Path, PathBuf};
use watchmux_core::{Event, EventError, EventInfo};

/// Vocabulary of the backend `Watcher` runs on
pub fn vocabulary() -> &'static Vocabulary {
    &recommended::VOCABULARY
}

/// Immutable event table of one backend
#[derive(Debug)]
pub struct Vocabulary {
    /// Backend name, for diagnostics
    pub name: &'static str,
    /// Native events and their names
    pub native: &'static [(Event, &'static str)],
    /// Canonical event implied by each native event
    pub kinds: &'static [(Event, Event)],
    /// Bits that never enter a watchpoint aggregate on this backend
    pub omit: Event,
}

impl Vocabulary {
    /// Union of every native bit
    pub fn native_mask(&self) -> Event {
        self.native
            .iter()
            .fold(Event::empty(), |acc, (bit, _)| acc | *bit)
    }

    /// Native bits plus the canonical events they imply
    pub fn kind(&self, native: Event) -> Event {
        self.kinds
            .iter()
            .filter(|(bit, _)| native.intersects(*bit))
            .fold(native, |acc, (_, canonical)| acc | *canonical)
    }

    /// Human-readable form using this backend's names
    pub fn describe(&self, event: Event) -> String {
        event.describe_with(self.native)
    }

    /// Resolve a native, canonical or control event name
    pub fn parse(&self, name: &str) -> Result<Event, EventError> {
        let trimmed = name.trim();
        self.native
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(trimmed))
            .map(|(bit, _)| Ok(*bit))
            .unwrap_or_else(|| Event::parse_name(trimmed))
    }

    /// Resolve a comma separated list of names into one event set
    pub fn parse_list(&self, list: &str) -> Result<Event, EventError> {
        let mut event = Event::empty();
        for name in list.split(',').filter(|n| !n.trim().is_empty()) {
            event |= self.parse(name)?;
        }
        if event.is_empty() {
            return Err(EventError::Empty);
        }
        Ok(event)
    }
}

/// Backend specific context of a raw event
#[derive(Debug, Clone)]
pub enum Sys {
    /// kqueue vnode record with cached metadata
    Kevent(kqueue::Kevent),
    /// Event kind as reported by the `notify` crate
    Notify(::notify::EventKind),
}

/// Platform independent event record handed to watchpoints
#[derive(Debug, Clone)]
pub struct RawEvent {
    event: Event,
    path: PathBuf,
    sys: Sys,
}

impl RawEvent {
    /// Create a new raw event
    pub fn new(event: Event, path: PathBuf, sys: Sys) -> Self {
        Self { event, path, sys }
    }

    /// Backend specific context
    pub fn sys(&self) -> &Sys {
        &self.sys
    }
}

impl EventInfo for RawEvent {
    fn event(&self) -> Event {
        self.event
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn is_dir(&self) -> io::Result<bool> {
        match &self.sys {
            Sys::Kevent(kevent) => Ok(kevent.metadata.is_dir()),
            Sys::Notify(kind) => match recommended::folder_hint(kind) {
                Some(is_dir) => Ok(is_dir),
                None => std::fs::metadata(&self.path).map(|m| m.is_dir()),
            },
        }
    }
}
