//! Per-path subscriber registry
//!
//! A [`Watchpoint`] maps subscriber handles to the events they asked for and
//! keeps the aggregate of all of them. Callers use the returned [`EventDiff`]
//! to decide whether the OS-level watch needs reconfiguring.
//!
//! A watchpoint is not synchronized. Whoever owns it (one thread per watched
//! path, or a mutex held for each call) serializes `add`, `del` and
//! `dispatch`.

use crate::diff::EventDiff;
use crate::event::Event;
use crate::handle::{EventInfo, Handle, HandleId};
use ahash::AHashMap;
use crossbeam_channel::{Sender, TrySendError};
use tracing::trace;

/// One subscriber's delivery queue and requested events
struct Subscriber<T> {
    tx: Sender<T>,
    events: Event,
}

/// Subscriber registry for a single watched path
pub struct Watchpoint<T> {
    /// Requested events per subscriber (never empty)
    subscribers: AHashMap<HandleId, Subscriber<T>>,

    /// OR of every subscriber's events, `omit` removed
    aggregate: Event,

    /// Bits that never enter the aggregate
    omit: Event,
}

impl<T> Watchpoint<T> {
    /// Create an empty watchpoint
    ///
    /// `omit` bits never enter the aggregate. They are invisible to `total`,
    /// never produce a diff, and are ignored by the dispatch fast path.
    pub fn new(omit: Event) -> Self {
        Self {
            subscribers: AHashMap::new(),
            aggregate: Event::empty(),
            omit,
        }
    }

    /// Subscribe `handle` to `event`, merging with what it already requested
    ///
    /// Returns the change to the aggregate, or [`EventDiff::NONE`] when other
    /// subscribers already covered `event`.
    ///
    /// # Panics
    /// If `event` is empty.
    pub fn add(&mut self, handle: &Handle<T>, event: Event) -> EventDiff {
        assert!(!event.is_empty(), "watchpoint: cannot add an empty event set");

        self.subscribers
            .entry(handle.id())
            .and_modify(|sub| sub.events |= event)
            .or_insert_with(|| Subscriber {
                tx: handle.sender().clone(),
                events: event,
            });

        self.recompute()
    }

    /// Report what [`add`](Self::add) would change for this handle, without
    /// touching any state
    ///
    /// `INTERNAL` is ignored. The diff is relative to the handle's own
    /// events, not the aggregate.
    pub fn dry_add(&self, handle: &Handle<T>, event: Event) -> EventDiff {
        let event = event.difference(Event::INTERNAL);
        let current = self.events(handle).difference(Event::INTERNAL);
        if current.contains(event) {
            return EventDiff::NONE;
        }
        EventDiff::new(current, current | event)
    }

    /// Unsubscribe `handle` from `event`
    ///
    /// The handle's entry is removed once it requests nothing. Clearing bits
    /// the handle does not hold, or an unknown handle, leaves it untouched.
    pub fn del(&mut self, handle: &Handle<T>, event: Event) -> EventDiff {
        let id = handle.id();
        if let Some(sub) = self.subscribers.get_mut(&id) {
            sub.events.remove(event);
            if sub.events.is_empty() {
                self.subscribers.remove(&id);
            }
        }

        self.recompute()
    }

    /// Rebuild the aggregate from scratch and diff it against the old one
    fn recompute(&mut self) -> EventDiff {
        let before = self.aggregate;
        self.aggregate = self
            .subscribers
            .values()
            .fold(Event::empty(), |acc, sub| acc | sub.events)
            .difference(self.omit);

        EventDiff::new(before.strip_control(), self.aggregate.strip_control())
    }

    /// Events requested by any subscriber, control bits excluded
    pub fn total(&self) -> Event {
        self.aggregate.strip_control()
    }

    /// True if any subscriber asked for a recursive watch
    pub fn is_recursive(&self) -> bool {
        self.aggregate.contains(Event::RECURSIVE)
    }

    /// Events `handle` currently requests (empty when not subscribed)
    pub fn events(&self, handle: &Handle<T>) -> Event {
        self.subscribers
            .get(&handle.id())
            .map(|sub| sub.events)
            .unwrap_or_else(Event::empty)
    }

    /// Excluded bits this watchpoint was built with
    pub fn omit(&self) -> Event {
        self.omit
    }

    /// Number of subscribers
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// True when nobody is subscribed
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<T: EventInfo> Watchpoint<T> {
    /// Offer `info` to every subscriber whose events overlap it
    ///
    /// `overlay` is OR-ed into the event before matching (e.g. `INTERNAL`
    /// for recursive-watch bookkeeping). Delivery never blocks: a full or
    /// closed queue silently loses the event for that subscriber only.
    pub fn dispatch(&self, info: &T, overlay: Event) {
        let observed = info.event() | overlay;
        if !self.aggregate.matches(observed) {
            return;
        }

        for (id, sub) in &self.subscribers {
            if !sub.events.matches(observed) {
                continue;
            }
            match sub.tx.try_send(info.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    trace!(subscriber = %id, event = %observed, path = ?info.path(), "queue full, event dropped");
                }
                Err(TrySendError::Disconnected(_)) => {
                    trace!(subscriber = %id, event = %observed, path = ?info.path(), "receiver gone, event dropped");
                }
            }
        }
    }
}

impl<T> Default for Watchpoint<T> {
    fn default() -> Self {
        Self::new(Event::empty())
    }
}
