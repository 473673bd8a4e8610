//! OS-backed watch coordinator
//!
//! [`Watcher`] owns the native watch (via `notify`) and one [`Watchpoint`]
//! per watched path. Subscriptions go through the watchpoint first; the
//! resulting change decides whether the OS watch has to be started, stopped
//! or re-registered with a different recursion mode.
//!
//! Locking: the backend mutex is always taken before the registry mutex. The
//! notify callback only ever takes the registry mutex and never blocks while
//! holding it, so calls into the backend (which round-trip through notify's
//! event loop thread) happen with the registry unlocked.

use crate::config::WatcherConfig;
use crate::error::{Result, WatchError};
use crate::platform::{self, recommended, RawEvent};
use ahash::AHashMap;
use crossbeam_channel::{Receiver, Sender};
use notify::{RecommendedWatcher, RecursiveMode};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};
use watchmux_core::{Event, EventDiff, EventError, EventInfo, Handle, Watchpoint};

/// Watchpoints shared with the notify callback
struct Registry {
    points: Mutex<AHashMap<PathBuf, Watchpoint<RawEvent>>>,
    omit: Event,
    errors: Sender<WatchError>,
}

impl Registry {
    fn new(omit: Event, errors: Sender<WatchError>) -> Self {
        Self {
            points: Mutex::new(AHashMap::new()),
            omit,
            errors,
        }
    }

    /// Entry point for everything the backend reports
    fn handle(&self, result: notify::Result<notify::Event>) {
        match result {
            Ok(event) => {
                for raw in recommended::translate(event) {
                    self.dispatch(&raw);
                }
            }
            Err(err) => {
                warn!(error = %err, paths = ?err.paths, "watch backend error");
                if self.errors.try_send(WatchError::Backend(err)).is_err() {
                    trace!("error queue full, backend error dropped");
                }
            }
        }
    }

    /// Route a raw event to the watchpoints covering its path
    ///
    /// The path itself and its parent directory always match; further
    /// ancestors only when their watchpoint is recursive.
    fn dispatch(&self, raw: &RawEvent) {
        trace!(
            event = %platform::vocabulary().describe(raw.event()),
            path = ?raw.path(),
            "raw event"
        );

        // New directories are also bookkeeping for recursive watches
        let overlay = if raw.event().contains(Event::CREATE) && raw.is_dir().unwrap_or(false) {
            Event::INTERNAL
        } else {
            Event::empty()
        };

        let points = self.points.lock();
        for (depth, dir) in raw.path().ancestors().enumerate() {
            let Some(wp) = points.get(dir) else {
                continue;
            };
            if depth <= 1 || wp.is_recursive() {
                wp.dispatch(raw, overlay);
            }
        }
    }

    /// Add `events` for `handle` on `path` and bring the OS watch in line
    ///
    /// The caller holds the backend lock for the whole call.
    fn subscribe<W: notify::Watcher>(
        &self,
        backend: &mut W,
        path: &Path,
        handle: &Handle<RawEvent>,
        events: Event,
    ) -> Result<EventDiff> {
        let (diff, previous, was_recursive, change) = {
            let mut points = self.points.lock();
            let wp = points
                .entry(path.to_path_buf())
                .or_insert_with(|| Watchpoint::new(self.omit));

            let was_empty = wp.is_empty();
            let was_recursive = wp.is_recursive();
            let previous = wp.events(handle);
            let diff = wp.add(handle, events);

            let change = if was_empty {
                Reconfigure::Watch(mode(wp.is_recursive()))
            } else if was_recursive != wp.is_recursive() {
                Reconfigure::Rewatch(mode(wp.is_recursive()))
            } else {
                Reconfigure::Nothing
            };
            (diff, previous, was_recursive, change)
        };

        if let Err(err) = apply(backend, path, change) {
            warn!(path = ?path, error = %err, "watch failed, rolling back subscription");

            let now_empty = {
                let mut points = self.points.lock();
                match points.get_mut(path) {
                    Some(wp) => {
                        wp.del(handle, events.difference(previous));
                        let now_empty = wp.is_empty();
                        if now_empty {
                            points.remove(path);
                        }
                        now_empty
                    }
                    None => true,
                }
            };

            if matches!(change, Reconfigure::Rewatch(_)) && !now_empty {
                restore(backend, path, was_recursive);
            }
            return Err(err);
        }

        if !diff.is_none() {
            debug!(path = ?path, diff = %diff, "aggregate changed");
        }
        Ok(diff)
    }

    /// Remove `events` for `handle` on `path` and bring the OS watch in line
    ///
    /// The watchpoint leaves the registry only once the OS watch is gone. On
    /// backend failure the handle gets its events back.
    fn unsubscribe<W: notify::Watcher>(
        &self,
        backend: &mut W,
        path: &Path,
        handle: &Handle<RawEvent>,
        events: Event,
    ) -> Result<EventDiff> {
        let (diff, removed, was_recursive, change) = {
            let mut points = self.points.lock();
            let wp = points
                .get_mut(path)
                .ok_or_else(|| WatchError::NotWatched(path.to_path_buf()))?;

            let was_recursive = wp.is_recursive();
            let removed = wp.events(handle).intersection(events);
            let diff = wp.del(handle, events);

            let change = if wp.is_empty() {
                Reconfigure::Unwatch
            } else if was_recursive != wp.is_recursive() {
                Reconfigure::Rewatch(mode(wp.is_recursive()))
            } else {
                Reconfigure::Nothing
            };
            (diff, removed, was_recursive, change)
        };

        if let Err(err) = apply(backend, path, change) {
            warn!(path = ?path, error = %err, "unwatch failed, rolling back unsubscription");

            if !removed.is_empty() {
                if let Some(wp) = self.points.lock().get_mut(path) {
                    wp.add(handle, removed);
                }
            }
            if matches!(change, Reconfigure::Rewatch(_)) {
                restore(backend, path, was_recursive);
            }
            return Err(err);
        }

        if change == Reconfigure::Unwatch {
            let mut points = self.points.lock();
            if points.get(path).is_some_and(Watchpoint::is_empty) {
                points.remove(path);
            }
        }

        if !diff.is_none() {
            debug!(path = ?path, diff = %diff, "aggregate changed");
        }
        Ok(diff)
    }
}

/// What the OS watch needs after a subscription change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reconfigure {
    Nothing,
    Watch(RecursiveMode),
    Rewatch(RecursiveMode),
    Unwatch,
}

fn mode(recursive: bool) -> RecursiveMode {
    if recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    }
}

/// File system watcher with per-path subscriber aggregation
pub struct Watcher {
    backend: Mutex<RecommendedWatcher>,
    registry: Arc<Registry>,
    errors: Receiver<WatchError>,
    config: WatcherConfig,
}

impl Watcher {
    /// Create a watcher on the platform's recommended backend
    pub fn new(config: WatcherConfig) -> Result<Self> {
        let vocabulary = platform::vocabulary();
        let omit = config.omit_mask(vocabulary)?;

        let (errors_tx, errors) = crossbeam_channel::bounded(config.queue_capacity);
        let registry = Arc::new(Registry::new(omit, errors_tx));

        let sink = Arc::clone(&registry);
        let backend = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
            sink.handle(result)
        })?;

        debug!(backend = vocabulary.name, omit = %vocabulary.describe(omit), "watcher created");

        Ok(Self {
            backend: Mutex::new(backend),
            registry,
            errors,
            config,
        })
    }

    /// Create a subscriber handle with the configured queue capacity
    pub fn channel(&self) -> (Handle<RawEvent>, Receiver<RawEvent>) {
        Handle::bounded(self.config.queue_capacity)
    }

    /// Errors the backend reported outside of any call (queue overflow,
    /// lost watches, ...)
    ///
    /// A received error means events may have been missed. Errors that
    /// arrive while the queue is full are dropped.
    pub fn errors(&self) -> Receiver<WatchError> {
        self.errors.clone()
    }

    /// Subscribe `handle` to `events` on `path`
    ///
    /// Starts the OS watch for the first subscriber of a path and
    /// re-registers it when the recursion mode changes. If the backend
    /// refuses, the subscription is rolled back and the error returned.
    pub fn subscribe(
        &self,
        path: impl AsRef<Path>,
        handle: &Handle<RawEvent>,
        events: Event,
    ) -> Result<EventDiff> {
        if events.is_empty() {
            return Err(EventError::Empty.into());
        }
        let path = resolve(path.as_ref());
        let mut backend = self.backend.lock();
        self.registry.subscribe(&mut *backend, &path, handle, events)
    }

    /// Unsubscribe `handle` from `events` on `path`
    ///
    /// Stops the OS watch once nobody is subscribed to the path. If the
    /// backend refuses, the handle keeps its events and the error is
    /// returned.
    pub fn unsubscribe(
        &self,
        path: impl AsRef<Path>,
        handle: &Handle<RawEvent>,
        events: Event,
    ) -> Result<EventDiff> {
        let path = resolve(path.as_ref());
        let mut backend = self.backend.lock();
        self.registry.unsubscribe(&mut *backend, &path, handle, events)
    }

    /// Remove `handle` from every watched path
    pub fn unsubscribe_all(&self, handle: &Handle<RawEvent>) -> Result<()> {
        let subscribed: Vec<(PathBuf, Event)> = {
            let points = self.registry.points.lock();
            points
                .iter()
                .map(|(path, wp)| (path.clone(), wp.events(handle)))
                .filter(|(_, events)| !events.is_empty())
                .collect()
        };

        for (path, events) in subscribed {
            match self.unsubscribe(&path, handle, events) {
                // Raced with another unsubscribe of the same path
                Ok(_) | Err(WatchError::NotWatched(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Events requested on `path`, control bits excluded
    pub fn total(&self, path: impl AsRef<Path>) -> Event {
        let path = resolve(path.as_ref());
        self.registry
            .points
            .lock()
            .get(&path)
            .map(Watchpoint::total)
            .unwrap_or_else(Event::empty)
    }

    /// True if any subscriber of `path` asked for a recursive watch
    pub fn is_recursive(&self, path: impl AsRef<Path>) -> bool {
        let path = resolve(path.as_ref());
        self.registry
            .points
            .lock()
            .get(&path)
            .is_some_and(Watchpoint::is_recursive)
    }

    /// Paths with at least one subscriber, sorted
    pub fn watched(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.registry.points.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Active configuration
    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }
}

/// Bring the OS watch for `path` in line with its watchpoint
fn apply<W: notify::Watcher>(backend: &mut W, path: &Path, change: Reconfigure) -> Result<()> {
    match change {
        Reconfigure::Nothing => {}
        Reconfigure::Watch(mode) => {
            debug!(path = ?path, ?mode, "starting watch");
            backend.watch(path, mode)?;
        }
        Reconfigure::Rewatch(mode) => {
            debug!(path = ?path, ?mode, "re-registering watch");
            unwatch(backend, path)?;
            backend.watch(path, mode)?;
        }
        Reconfigure::Unwatch => {
            debug!(path = ?path, "stopping watch");
            unwatch(backend, path)?;
        }
    }
    Ok(())
}

/// Put back the registration a failed re-register may have removed
fn restore<W: notify::Watcher>(backend: &mut W, path: &Path, recursive: bool) {
    if let Err(err) = backend.watch(path, mode(recursive)) {
        warn!(path = ?path, error = %err, "could not restore previous watch");
    }
}

/// Stop watching `path`, tolerating a watch the kernel already dropped
fn unwatch<W: notify::Watcher>(backend: &mut W, path: &Path) -> Result<()> {
    match backend.unwatch(path) {
        Ok(()) => Ok(()),
        Err(err) if matches!(err.kind, notify::ErrorKind::WatchNotFound) => {
            debug!(path = ?path, "watch already gone");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Canonical form of `path` when it exists, the path unchanged otherwise
fn resolve(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
