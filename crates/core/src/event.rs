//! Event bitmask algebra
//!
//! An [`Event`] is a set of bits. The bit space is partitioned:
//! - Backend native bits (each backend owns a disjoint range)
//! - Four canonical bits every backend can produce (create/remove/write/rename)
//! - Control bits (`RECURSIVE`, `INTERNAL`) used only for bookkeeping

use crate::error::EventError;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Set of file system event kinds
    ///
    /// Unknown bits are retained, so backends can declare their own native
    /// constants with [`Event::from_bits_retain`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Event: u32 {
        /// File or directory was created
        const CREATE = 0x0100;
        /// File or directory was removed
        const REMOVE = 0x0200;
        /// File was written to
        const WRITE = 0x0400;
        /// File or directory was renamed
        const RENAME = 0x0800;

        /// Marks an event set that includes a recursive subscription
        const RECURSIVE = 0x1000;
        /// Marks bookkeeping events used to emulate recursive watches
        const INTERNAL = 0x2000;

        const _ = !0;
    }
}

/// Canonical (cross-platform) events
pub const CANONICAL: Event = Event::CREATE
    .union(Event::REMOVE)
    .union(Event::WRITE)
    .union(Event::RENAME);

/// Control bits, never delivered as a user-visible event
pub const CONTROL: Event = Event::RECURSIVE.union(Event::INTERNAL);

/// Names of canonical and control bits
pub const NAMES: &[(Event, &str)] = &[
    (Event::CREATE, "create"),
    (Event::REMOVE, "remove"),
    (Event::WRITE, "write"),
    (Event::RENAME, "rename"),
    (Event::RECURSIVE, "recursive"),
    (Event::INTERNAL, "internal"),
];

impl Event {
    /// Returns true if any requested bit was observed
    #[inline]
    pub const fn matches(self, observed: Event) -> bool {
        self.bits() & observed.bits() != 0
    }

    /// Remove control bits
    #[inline]
    pub const fn strip_control(self) -> Event {
        self.difference(CONTROL)
    }

    /// True when the set is non-empty and holds nothing but control bits
    pub const fn is_control_only(self) -> bool {
        !self.is_empty() && self.strip_control().is_empty()
    }

    /// Look up a canonical or control event by name
    ///
    /// Names are case-insensitive. `all` resolves to every canonical event.
    pub fn parse_name(name: &str) -> Result<Event, EventError> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("all") {
            return Ok(CANONICAL);
        }
        NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(e, _)| *e)
            .ok_or_else(|| EventError::UnknownName(name.to_string()))
    }

    /// Render using the given name table, falling back to hex for unknown bits
    pub fn describe_with(self, names: &[(Event, &str)]) -> String {
        if self.is_empty() {
            return "none".to_string();
        }

        let mut parts = Vec::new();
        let mut rest = self;
        for (bit, name) in names.iter().chain(NAMES.iter()) {
            if !bit.is_empty() && rest.contains(*bit) {
                parts.push((*name).to_string());
                rest.remove(*bit);
            }
        }
        if !rest.is_empty() {
            parts.push(format!("{:#x}", rest.bits()));
        }
        parts.join("|")
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe_with(&[]))
    }
}
