//! Vocabulary of the `notify` crate's recommended backend
//!
//! `notify` already normalizes kernel records (inotify, FSEvents, kqueue,
//! ReadDirectoryChangesW) into its own `EventKind`. Kinds with a canonical
//! counterpart map onto it; the rest get a native bit in `0x00ff_0000`.

use super::{RawEvent, Sys, Vocabulary};
use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::EventKind;
use watchmux_core::Event;

/// File was opened, read or closed
pub const ACCESS: Event = Event::from_bits_retain(0x0001_0000);
/// Metadata (permissions, timestamps, ownership, ...) changed
pub const ATTRIB: Event = Event::from_bits_retain(0x0002_0000);
/// Backend reported an event it could not classify
pub const OTHER: Event = Event::from_bits_retain(0x0004_0000);

/// notify event table
pub static VOCABULARY: Vocabulary = Vocabulary {
    name: "notify",
    native: &[(ACCESS, "access"), (ATTRIB, "attrib"), (OTHER, "other")],
    kinds: &[],
    omit: Event::empty(),
};

/// Map a notify event kind onto the event vocabulary
///
/// Never returns an empty set.
pub fn classify(kind: &EventKind) -> Event {
    match kind {
        EventKind::Create(_) => Event::CREATE,
        EventKind::Remove(_) => Event::REMOVE,
        EventKind::Modify(ModifyKind::Name(_)) => Event::RENAME,
        EventKind::Modify(ModifyKind::Metadata(_)) => ATTRIB,
        EventKind::Modify(_) => Event::WRITE,
        EventKind::Access(_) => ACCESS,
        _ => OTHER,
    }
}

/// Whether the kind itself says the target is a directory
pub(crate) fn folder_hint(kind: &EventKind) -> Option<bool> {
    match kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => Some(true),
        EventKind::Create(CreateKind::File) | EventKind::Remove(RemoveKind::File) => Some(false),
        _ => None,
    }
}

/// Split a notify event into one raw event per affected path
pub fn translate(event: notify::Event) -> Vec<RawEvent> {
    let notify::Event { kind, paths, .. } = event;
    let classified = classify(&kind);

    paths
        .into_iter()
        .map(|path| RawEvent::new(classified, path, Sys::Notify(kind.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, DataChange, MetadataKind, RenameMode};
    use std::path::PathBuf;
    use watchmux_core::EventInfo;

    #[test]
    fn test_classify_canonical() {
        assert_eq!(classify(&EventKind::Create(CreateKind::File)), Event::CREATE);
        assert_eq!(classify(&EventKind::Remove(RemoveKind::Any)), Event::REMOVE);
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::Both))),
            Event::RENAME
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Event::WRITE
        );
        assert_eq!(classify(&EventKind::Modify(ModifyKind::Any)), Event::WRITE);
    }

    #[test]
    fn test_classify_native() {
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions))),
            ATTRIB
        );
        assert_eq!(classify(&EventKind::Access(AccessKind::Any)), ACCESS);
        assert_eq!(classify(&EventKind::Any), OTHER);
        assert_eq!(classify(&EventKind::Other), OTHER);
    }

    #[test]
    fn test_translate_one_event_per_path() {
        let event = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/tmp/a"))
            .add_path(PathBuf::from("/tmp/b"));

        let raw = translate(event);
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].path(), PathBuf::from("/tmp/a").as_path());
        assert_eq!(raw[1].path(), PathBuf::from("/tmp/b").as_path());
        assert!(raw.iter().all(|r| r.event() == Event::RENAME));
    }

    #[test]
    fn test_folder_hint() {
        let event = notify::Event::new(EventKind::Create(CreateKind::Folder))
            .add_path(PathBuf::from("/does/not/exist"));
        let raw = translate(event);
        assert!(raw[0].is_dir().unwrap());

        let event = notify::Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(PathBuf::from("/does/not/exist"));
        assert!(!translate(event)[0].is_dir().unwrap());

        // No hint and no file to stat
        let event = notify::Event::new(EventKind::Create(CreateKind::Any))
            .add_path(PathBuf::from("/does/not/exist"));
        assert!(translate(event)[0].is_dir().is_err());
    }
}
