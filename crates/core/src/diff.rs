//! Aggregate event set changes

use crate::event::Event;
use std::fmt;

/// Change to a watchpoint's aggregate event set
///
/// `before` is the old aggregate and `after` the new one, both with control
/// bits stripped. [`EventDiff::NONE`] means nothing observable changed; it
/// does not mean the events were cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventDiff {
    /// Aggregate before the change
    pub before: Event,
    /// Aggregate after the change
    pub after: Event,
}

impl EventDiff {
    /// No observable change
    pub const NONE: EventDiff = EventDiff {
        before: Event::empty(),
        after: Event::empty(),
    };

    /// Build a diff, collapsing to [`EventDiff::NONE`] when nothing changed
    pub fn new(before: Event, after: Event) -> Self {
        if before == after {
            Self::NONE
        } else {
            Self { before, after }
        }
    }

    /// Events present after the change but not before
    ///
    /// Removed events are not reported here; compare `before` and `after`.
    pub fn event(&self) -> Event {
        self.after.difference(self.before)
    }

    /// True for the no-op diff
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for EventDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.before, self.after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_reports_added_bits_only() {
        let diff = EventDiff::new(Event::WRITE | Event::REMOVE, Event::WRITE | Event::CREATE);
        assert_eq!(diff.event(), Event::CREATE);
    }

    #[test]
    fn test_unchanged_collapses_to_none() {
        let diff = EventDiff::new(Event::WRITE, Event::WRITE);
        assert!(diff.is_none());
        assert_eq!(diff, EventDiff::NONE);
        assert_eq!(diff.event(), Event::empty());
    }

    #[test]
    fn test_removal_is_not_none() {
        let diff = EventDiff::new(Event::WRITE, Event::empty());
        assert!(!diff.is_none());
        assert_eq!(diff.event(), Event::empty());
        assert_eq!(diff.before, Event::WRITE);
    }

    #[test]
    fn test_display() {
        let diff = EventDiff::new(Event::empty(), Event::CREATE);
        assert_eq!(diff.to_string(), "none -> create");
    }
}
