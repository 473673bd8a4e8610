//! Subscriber handles and the raw event contract

use crate::event::Event;
use crossbeam_channel::{Receiver, Sender};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Raw event record handed to [`Watchpoint::dispatch`](crate::Watchpoint::dispatch)
pub trait EventInfo: Clone {
    /// Kind of the reported event
    fn event(&self) -> Event;

    /// Path the event concerns
    fn path(&self) -> &Path;

    /// Whether the event target is a directory
    fn is_dir(&self) -> io::Result<bool>;
}

/// Unique identity of a subscriber handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Delivery endpoint of one subscriber
///
/// Clones share the same identity, so a clone can be used to unsubscribe.
/// Watchpoints keep their own clone of the sender; the channel closes only
/// when the caller drops every handle clone as well.
pub struct Handle<T> {
    id: HandleId,
    tx: Sender<T>,
}

impl<T> Handle<T> {
    /// Wrap a sender in a new handle with a fresh identity
    pub fn new(tx: Sender<T>) -> Self {
        Self {
            id: HandleId(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed)),
            tx,
        }
    }

    /// Create a handle backed by a bounded queue
    pub fn bounded(capacity: usize) -> (Self, Receiver<T>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self::new(tx), rx)
    }

    /// Handle identity
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Underlying sender
    pub fn sender(&self) -> &Sender<T> {
        &self.tx
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            tx: self.tx.clone(),
        }
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id)
            .field("queued", &self.tx.len())
            .finish()
    }
}
