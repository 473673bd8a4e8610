//! kqueue vnode vocabulary
//!
//! Native `NOTE_*` flags occupy the low byte of [`Event`]. Delete, write and
//! rename additionally imply their canonical counterparts; everything else is
//! only delivered to subscribers that ask for the native flag by name. Flags
//! above the low byte (`NOTE_CLOSE`, `NOTE_FUNLOCK`, ...) collapse into
//! [`NOTE_OTHER`].

use super::{RawEvent, Sys, Vocabulary};
use std::fs::Metadata;
use std::path::PathBuf;
use watchmux_core::Event;

/// unlink() was called on the file referenced by the descriptor
pub const NOTE_DELETE: Event = Event::from_bits_retain(0x0001);
/// A write occurred on the file referenced by the descriptor
pub const NOTE_WRITE: Event = Event::from_bits_retain(0x0002);
/// The file referenced by the descriptor was extended
pub const NOTE_EXTEND: Event = Event::from_bits_retain(0x0004);
/// The file referenced by the descriptor had its attributes changed
pub const NOTE_ATTRIB: Event = Event::from_bits_retain(0x0008);
/// The link count on the file changed
pub const NOTE_LINK: Event = Event::from_bits_retain(0x0010);
/// The file referenced by the descriptor was renamed
pub const NOTE_RENAME: Event = Event::from_bits_retain(0x0020);
/// Access to the file was revoked via revoke(2) or the file system was unmounted
pub const NOTE_REVOKE: Event = Event::from_bits_retain(0x0040);

/// Vnode note outside the low byte
pub const NOTE_OTHER: Event = Event::from_bits_retain(0x0100_0000);

/// Bits reserved for kqueue flags
const NATIVE_RANGE: u32 = 0x00ff;

/// kqueue event table
pub static VOCABULARY: Vocabulary = Vocabulary {
    name: "kqueue",
    native: &[
        (NOTE_DELETE, "note_delete"),
        (NOTE_WRITE, "note_write"),
        (NOTE_EXTEND, "note_extend"),
        (NOTE_ATTRIB, "note_attrib"),
        (NOTE_LINK, "note_link"),
        (NOTE_RENAME, "note_rename"),
        (NOTE_REVOKE, "note_revoke"),
        (NOTE_OTHER, "note_other"),
    ],
    kinds: &[
        (NOTE_DELETE, Event::REMOVE),
        (NOTE_WRITE, Event::WRITE),
        (NOTE_RENAME, Event::RENAME),
    ],
    omit: Event::empty(),
};

/// A single vnode record as read from the kernel
#[derive(Debug, Clone)]
pub struct Kevent {
    /// `fflags` field of the kevent
    pub fflags: u32,
    /// Metadata of the watched file, captured when the watch was added
    pub metadata: Metadata,
}

/// Translate a vnode record for `path` into a raw event
///
/// Flags within the low byte pass through verbatim, including ones without
/// a name; any higher flag sets [`NOTE_OTHER`]. Returns `None` only for a
/// record with no flags at all.
pub fn translate(path: impl Into<PathBuf>, kevent: Kevent) -> Option<RawEvent> {
    if kevent.fflags == 0 {
        return None;
    }

    let mut native = Event::from_bits_retain(kevent.fflags & NATIVE_RANGE);
    if kevent.fflags & !NATIVE_RANGE != 0 {
        native |= NOTE_OTHER;
    }

    let event = VOCABULARY.kind(native);
    Some(RawEvent::new(event, path.into(), Sys::Kevent(kevent)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;
    use watchmux_core::{EventInfo, CANONICAL};

    fn kevent(fflags: u32, metadata: &Metadata) -> Kevent {
        Kevent {
            fflags,
            metadata: metadata.clone(),
        }
    }

    #[test]
    fn test_canonical_kinds() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let meta = std::fs::metadata(temp_dir.path())?;

        let delete = translate(temp_dir.path(), kevent(0x0001, &meta)).unwrap();
        assert_eq!(delete.event(), NOTE_DELETE | Event::REMOVE);

        let write = translate(temp_dir.path(), kevent(0x0002, &meta)).unwrap();
        assert_eq!(write.event(), NOTE_WRITE | Event::WRITE);

        let rename = translate(temp_dir.path(), kevent(0x0020, &meta)).unwrap();
        assert_eq!(rename.event(), NOTE_RENAME | Event::RENAME);
        Ok(())
    }

    #[test]
    fn test_native_only_flags_pass_through() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let meta = std::fs::metadata(temp_dir.path())?;

        let attrib = translate(temp_dir.path(), kevent(0x0008 | 0x0004, &meta)).unwrap();
        assert_eq!(attrib.event(), NOTE_ATTRIB | NOTE_EXTEND);
        assert!(!attrib.event().intersects(CANONICAL));

        // Unnamed flag within range is kept as-is
        let unnamed = translate(temp_dir.path(), kevent(0x0080, &meta)).unwrap();
        assert_eq!(unnamed.event().bits(), 0x0080);
        Ok(())
    }

    #[test]
    fn test_high_flags_map_to_other() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let meta = std::fs::metadata(temp_dir.path())?;

        assert!(translate(temp_dir.path(), kevent(0, &meta)).is_none());

        // NOTE_CLOSE on FreeBSD, NOTE_FUNLOCK on macOS
        let high = translate(temp_dir.path(), kevent(0x0100, &meta)).unwrap();
        assert_eq!(high.event(), NOTE_OTHER);

        let mixed = translate(temp_dir.path(), kevent(0x0102, &meta)).unwrap();
        assert_eq!(mixed.event(), NOTE_WRITE | Event::WRITE | NOTE_OTHER);
        Ok(())
    }

    #[test]
    fn test_every_nonzero_record_is_an_event() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let meta = std::fs::metadata(temp_dir.path())?;

        for shift in 0..32 {
            let fflags = 1u32 << shift;
            let raw = translate(temp_dir.path(), kevent(fflags, &meta));
            assert!(
                raw.is_some_and(|r| !r.event().is_empty()),
                "fflags {fflags:#x} yielded no event"
            );
        }
        Ok(())
    }

    #[test]
    fn test_context_answers_is_dir() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let file = temp_dir.path().join("file.txt");
        std::fs::write(&file, b"content")?;

        let dir_meta = std::fs::metadata(temp_dir.path())?;
        let file_meta = std::fs::metadata(&file)?;

        let dir_event = translate(temp_dir.path(), kevent(0x0002, &dir_meta)).unwrap();
        let file_event = translate(&file, kevent(0x0002, &file_meta)).unwrap();

        assert!(dir_event.is_dir()?);
        assert!(!file_event.is_dir()?);
        assert_eq!(file_event.path(), file.as_path());
        assert!(matches!(file_event.sys(), Sys::Kevent(k) if k.fflags == 0x0002));
        Ok(())
    }
}
