//! Directory reader: flattens the red-black sibling trees into a path map.
//!
//! Directory entries form, per storage, a binary tree of siblings hanging off
//! the storage's `child` link. We never trust those links: traversal is an
//! explicit stack with a visited set, every sid is range-checked before it is
//! dereferenced, and an entry is decoded only when it is actually reached.

use super::consts::*;
use crate::common::binary::decode_utf16le;
use crate::common::{Error, Result};
use fixedbitset::FixedBitSet;
use std::collections::HashMap;
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw directory entry structure (128 bytes)
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
#[allow(dead_code)] // fields mirror the on-disk layout
struct RawDirectoryEntry {
    /// Entry name in UTF-16LE, null-terminated
    name: [u8; 64],
    /// Length of name in bytes including the terminator
    name_len: U16<LE>,
    entry_type: u8,
    node_color: u8,
    sid_left: U32<LE>,
    sid_right: U32<LE>,
    sid_child: U32<LE>,
    clsid: [u8; 16],
    state_bits: U32<LE>,
    creation_time: U64<LE>,
    modified_time: U64<LE>,
    start_sector: U32<LE>,
    stream_size: U64<LE>,
}

/// Object type of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum EntryKind {
    Empty,
    Storage,
    Stream,
    Root,
    Unknown(u8),
}

impl From<u8> for EntryKind {
    fn from(value: u8) -> Self {
        match value {
            STGTY_EMPTY => EntryKind::Empty,
            STGTY_STORAGE => EntryKind::Storage,
            STGTY_STREAM => EntryKind::Stream,
            STGTY_ROOT => EntryKind::Root,
            other => EntryKind::Unknown(other),
        }
    }
}

/// A reachable directory entry.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DirEntry {
    /// Index of the entry in the directory stream
    pub sid: u32,
    /// Decoded entry name
    pub name: String,
    /// Slash-joined path from the root, e.g. `"Workbook"` or `"_VBA_PROJECT_CUR/VBA"`
    pub path: String,
    pub kind: EntryKind,
    pub left: u32,
    pub right: u32,
    pub child: u32,
    /// First sector of the entry's data (regular or mini, depending on size)
    pub start_sector: u32,
    /// Declared size in bytes
    pub size: u64,
}

impl DirEntry {
    pub fn is_stream(&self) -> bool {
        self.kind == EntryKind::Stream
    }
}

/// Flattened view of every entry reachable from the root.
#[derive(Debug, Clone)]
pub struct Directory {
    entries: Vec<DirEntry>,
    by_path: HashMap<String, usize>,
}

impl Directory {
    /// Decode the directory stream.
    ///
    /// `major_version` selects how the 64-bit size field is read: version 3
    /// writers leave garbage in the high half, so only the low 32 bits count.
    pub fn parse(bytes: &[u8], major_version: u16) -> Result<Self> {
        let entry_count = bytes.len() / DIRENTRY_SIZE;
        if entry_count == 0 {
            return Err(Error::corrupt_container("directory stream is empty"));
        }
        let reader = EntryReader {
            bytes,
            entry_count,
            major_version,
        };

        let root_sid = reader.find_root()?;
        let root = reader.read(root_sid, String::new())?;
        let mut visited = FixedBitSet::with_capacity(entry_count);
        visited.insert(root_sid as usize);

        let mut directory = Directory {
            entries: vec![root],
            by_path: HashMap::new(),
        };

        // (sid, path of the storage that owns it)
        let mut stack: Vec<(u32, String)> = vec![(directory.entries[0].child, String::new())];
        while let Some((sid, parent)) = stack.pop() {
            if sid > MAXREGSID {
                continue;
            }
            if sid as usize >= entry_count {
                return Err(Error::corrupt_container(format!(
                    "directory link to entry {} beyond {} entries",
                    sid, entry_count
                )));
            }
            if visited.put(sid as usize) {
                return Err(Error::corrupt_container(format!(
                    "directory entry {} is reachable twice",
                    sid
                )));
            }

            let entry = reader.read(sid, parent.clone())?;
            if entry.kind == EntryKind::Empty {
                log::warn!("directory link reaches empty entry {}", sid);
                continue;
            }

            stack.push((entry.left, parent.clone()));
            stack.push((entry.right, parent));
            match entry.kind {
                EntryKind::Storage => stack.push((entry.child, entry.path.clone())),
                _ if entry.child <= MAXREGSID => {
                    log::debug!("ignoring child link of non-storage entry {}", sid);
                },
                _ => {},
            }

            let key = entry.path.to_lowercase();
            if directory.by_path.contains_key(&key) {
                return Err(Error::corrupt_container(format!(
                    "duplicate directory entry '{}'",
                    entry.path
                )));
            }
            directory.by_path.insert(key, directory.entries.len());
            log::trace!("directory entry {} '{}' ({:?})", sid, entry.path, entry.kind);
            directory.entries.push(entry);
        }

        Ok(directory)
    }

    /// The root storage entry (owner of the mini stream).
    pub fn root(&self) -> &DirEntry {
        &self.entries[0]
    }

    /// Look up an entry by slash-separated path, ignoring ASCII and Unicode case.
    pub fn find(&self, path: &str) -> Option<&DirEntry> {
        let key = path.trim_start_matches('/').to_lowercase();
        self.by_path.get(&key).map(|&index| &self.entries[index])
    }

    /// All reachable stream entries, in traversal order.
    pub fn streams(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter().filter(|e| e.is_stream())
    }

    /// All reachable entries, root first.
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }
}

struct EntryReader<'a> {
    bytes: &'a [u8],
    entry_count: usize,
    major_version: u16,
}

impl EntryReader<'_> {
    fn raw(&self, sid: u32) -> Result<RawDirectoryEntry> {
        let start = sid as usize * DIRENTRY_SIZE;
        let chunk = self
            .bytes
            .get(start..start + DIRENTRY_SIZE)
            .ok_or_else(|| Error::corrupt_container(format!("directory entry {} is cut short", sid)))?;
        RawDirectoryEntry::read_from_bytes(chunk)
            .map_err(|_| Error::corrupt_container(format!("unreadable directory entry {}", sid)))
    }

    /// Entry 0 when it is the root, otherwise the first root-typed entry.
    fn find_root(&self) -> Result<u32> {
        let entry_type = |sid: usize| self.bytes[sid * DIRENTRY_SIZE + 0x42];
        if entry_type(0) == STGTY_ROOT {
            return Ok(0);
        }
        let found = (1..self.entry_count)
            .find(|&sid| entry_type(sid) == STGTY_ROOT)
            .ok_or_else(|| Error::corrupt_container("directory has no root entry"))?;
        log::warn!("root entry found at index {} instead of 0", found);
        Ok(found as u32)
    }

    fn read(&self, sid: u32, parent: String) -> Result<DirEntry> {
        let raw = self.raw(sid)?;

        let name_len = raw.name_len.get() as usize;
        if name_len > DIRENTRY_NAME_CAPACITY || name_len % 2 != 0 {
            return Err(Error::corrupt_container(format!(
                "directory entry {} has invalid name length {}",
                sid, name_len
            )));
        }
        let name = decode_utf16le(&raw.name[..name_len.saturating_sub(2)]);

        let mut size = raw.stream_size.get();
        if self.major_version == 3 {
            size &= 0xFFFF_FFFF;
        }

        let kind = EntryKind::from(raw.entry_type);
        let path = match kind {
            EntryKind::Root => String::new(),
            _ if parent.is_empty() => name.clone(),
            _ => format!("{}/{}", parent, name),
        };

        Ok(DirEntry {
            sid,
            name,
            path,
            kind,
            left: raw.sid_left.get(),
            right: raw.sid_right.get(),
            child: raw.sid_child.get(),
            start_sector: raw.start_sector.get(),
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::test_support::{RawContainer, RawEntry};

    /// Directory sector of a built raw container.
    fn directory_bytes(raw: &RawContainer) -> Vec<u8> {
        raw.build()[1024..1536].to_vec()
    }

    #[test]
    fn test_flattens_siblings() {
        let mut raw = RawContainer::new(4);
        raw.entry(0, RawEntry::root(1))
            .entry(1, RawEntry::stream("Workbook", 2, 100).siblings(2, 3))
            .entry(2, RawEntry::stream("\u{5}SummaryInformation", ENDOFCHAIN, 0))
            .entry(3, RawEntry::stream("Ctls", ENDOFCHAIN, 0));
        let dir = Directory::parse(&directory_bytes(&raw), 3).unwrap();

        assert_eq!(dir.streams().count(), 3);
        let workbook = dir.find("workbook").unwrap();
        assert_eq!(workbook.sid, 1);
        assert_eq!(workbook.size, 100);
        assert!(dir.find("/WORKBOOK").is_some());
        assert!(dir.find("Book").is_none());
        assert_eq!(dir.root().kind, EntryKind::Root);
    }

    #[test]
    fn test_self_referential_sibling_is_corrupt() {
        let mut raw = RawContainer::new(4);
        raw.entry(0, RawEntry::root(1))
            .entry(1, RawEntry::stream("Workbook", 2, 100).siblings(1, NOSTREAM));
        assert!(matches!(
            Directory::parse(&directory_bytes(&raw), 3),
            Err(Error::CorruptContainer(_))
        ));
    }

    #[test]
    fn test_link_back_to_root_is_corrupt() {
        let mut raw = RawContainer::new(4);
        raw.entry(0, RawEntry::root(1))
            .entry(1, RawEntry::stream("Workbook", 2, 100).siblings(NOSTREAM, 0));
        assert!(matches!(
            Directory::parse(&directory_bytes(&raw), 3),
            Err(Error::CorruptContainer(_))
        ));
    }

    #[test]
    fn test_out_of_range_sibling_is_corrupt() {
        let mut raw = RawContainer::new(4);
        raw.entry(0, RawEntry::root(1))
            .entry(1, RawEntry::stream("Workbook", 2, 100).siblings(NOSTREAM, 4000));
        let err = Directory::parse(&directory_bytes(&raw), 3).unwrap_err();
        assert!(err.to_string().contains("4000"));
    }

    #[test]
    fn test_duplicate_names_are_corrupt() {
        let mut raw = RawContainer::new(4);
        raw.entry(0, RawEntry::root(1))
            .entry(1, RawEntry::stream("Workbook", 2, 100).siblings(NOSTREAM, 2))
            .entry(2, RawEntry::stream("WORKBOOK", 3, 100));
        assert!(matches!(
            Directory::parse(&directory_bytes(&raw), 3),
            Err(Error::CorruptContainer(_))
        ));
    }

    #[test]
    fn test_missing_root_is_corrupt() {
        let mut raw = RawContainer::new(4);
        raw.entry(0, RawEntry::stream("Workbook", 2, 100));
        assert!(matches!(
            Directory::parse(&directory_bytes(&raw), 3),
            Err(Error::CorruptContainer(_))
        ));
    }

    #[test]
    fn test_invalid_name_length_is_corrupt() {
        let mut raw = RawContainer::new(4);
        raw.entry(0, RawEntry::root(1))
            .entry(1, RawEntry::stream("Workbook", 2, 100))
            .patch_entry(1, 0x40, &200u16.to_le_bytes());
        assert!(matches!(
            Directory::parse(&directory_bytes(&raw), 3),
            Err(Error::CorruptContainer(_))
        ));
    }

    #[test]
    fn test_unreachable_garbage_is_ignored() {
        let mut raw = RawContainer::new(4);
        raw.entry(0, RawEntry::root(1))
            .entry(1, RawEntry::stream("Workbook", 2, 100))
            .entry(2, RawEntry::stream("Orphan", 2, 100))
            // Invalid name length on an entry nothing links to.
            .patch_entry(2, 0x40, &201u16.to_le_bytes());
        let dir = Directory::parse(&directory_bytes(&raw), 3).unwrap();
        assert_eq!(dir.streams().count(), 1);
    }

    #[test]
    fn test_v3_ignores_high_size_bits() {
        let mut raw = RawContainer::new(4);
        raw.entry(0, RawEntry::root(1))
            .entry(1, RawEntry::stream("Workbook", 2, 0xDEAD_0000_0000_0200));
        let bytes = directory_bytes(&raw);
        assert_eq!(Directory::parse(&bytes, 3).unwrap().find("Workbook").unwrap().size, 0x200);
        assert_eq!(
            Directory::parse(&bytes, 4).unwrap().find("Workbook").unwrap().size,
            0xDEAD_0000_0000_0200
        );
    }

    #[test]
    fn test_nested_storage_paths() {
        let mut raw = RawContainer::new(4);
        raw.entry(0, RawEntry::root(1))
            .entry(
                1,
                RawEntry {
                    name: "_VBA_PROJECT_CUR",
                    kind: STGTY_STORAGE,
                    left: NOSTREAM,
                    right: 3,
                    child: 2,
                    start: 0,
                    size: 0,
                },
            )
            .entry(2, RawEntry::stream("VBA", ENDOFCHAIN, 0))
            .entry(3, RawEntry::stream("Workbook", ENDOFCHAIN, 0));
        let dir = Directory::parse(&directory_bytes(&raw), 3).unwrap();
        assert!(dir.find("_VBA_PROJECT_CUR/VBA").is_some());
        assert!(dir.find("VBA").is_none());
        assert!(dir.find("Workbook").is_some());
    }
}
