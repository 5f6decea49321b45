//! Hand-assembled compound files for hostile-input tests.
//!
//! `cfb` only writes well-formed containers; these builders poke the FAT and
//! directory directly so tests can describe cycles, dangling links and
//! oversized declarations.

use super::consts::*;

const SECTOR: usize = 512;
const FAT_SECTOR: u32 = 0;
const DIR_SECTOR: u32 = 1;

/// A version 3 container: sector 0 holds the FAT, sector 1 the directory
/// (four entries), every later sector is free for data.
pub(crate) struct RawContainer {
    header: Vec<u8>,
    fat: Vec<u32>,
    sectors: Vec<Vec<u8>>,
    truncate_to: Option<usize>,
}

/// Fields of one 128-byte directory entry.
pub(crate) struct RawEntry<'n> {
    pub name: &'n str,
    pub kind: u8,
    pub left: u32,
    pub right: u32,
    pub child: u32,
    pub start: u32,
    pub size: u64,
}

impl<'n> RawEntry<'n> {
    pub fn root(child: u32) -> Self {
        RawEntry {
            name: ROOT_ENTRY_NAME,
            kind: STGTY_ROOT,
            left: NOSTREAM,
            right: NOSTREAM,
            child,
            start: ENDOFCHAIN,
            size: 0,
        }
    }

    pub fn stream(name: &'n str, start: u32, size: u64) -> Self {
        RawEntry {
            name,
            kind: STGTY_STREAM,
            left: NOSTREAM,
            right: NOSTREAM,
            child: NOSTREAM,
            start,
            size,
        }
    }

    pub fn siblings(mut self, left: u32, right: u32) -> Self {
        self.left = left;
        self.right = right;
        self
    }
}

impl RawContainer {
    /// Container with `sector_count` sectors (at most 128), all data sectors free.
    pub fn new(sector_count: usize) -> Self {
        assert!((2..=SECTOR / 4).contains(&sector_count));

        let mut header = vec![0u8; HEADER_SIZE];
        header[..8].copy_from_slice(MAGIC);
        header[0x18..0x1A].copy_from_slice(&0x3Eu16.to_le_bytes());
        header[0x1A..0x1C].copy_from_slice(&3u16.to_le_bytes());
        header[0x1C..0x1E].copy_from_slice(&BYTE_ORDER_LE.to_le_bytes());
        header[0x1E..0x20].copy_from_slice(&SECTOR_SHIFT_V3.to_le_bytes());
        header[0x20..0x22].copy_from_slice(&MINI_SECTOR_SHIFT.to_le_bytes());
        header[0x2C..0x30].copy_from_slice(&1u32.to_le_bytes());
        header[0x30..0x34].copy_from_slice(&DIR_SECTOR.to_le_bytes());
        header[0x38..0x3C].copy_from_slice(&MINI_STREAM_CUTOFF.to_le_bytes());
        header[0x3C..0x40].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
        header[0x44..0x48].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
        for slot in 0..HEADER_DIFAT_SLOTS {
            let offset = 0x4C + slot * 4;
            header[offset..offset + 4].copy_from_slice(&FREESECT.to_le_bytes());
        }
        header[0x4C..0x50].copy_from_slice(&FAT_SECTOR.to_le_bytes());

        let mut fat = vec![FREESECT; SECTOR / 4];
        fat[FAT_SECTOR as usize] = FATSECT;
        fat[DIR_SECTOR as usize] = ENDOFCHAIN;

        let mut sectors = vec![vec![0u8; SECTOR]; sector_count];
        // Unused directory slots are empty entries with NOSTREAM links.
        for slot in 0..SECTOR / DIRENTRY_SIZE {
            let entry = &mut sectors[DIR_SECTOR as usize][slot * DIRENTRY_SIZE..][..DIRENTRY_SIZE];
            for link in [0x44, 0x48, 0x4C] {
                entry[link..link + 4].copy_from_slice(&NOSTREAM.to_le_bytes());
            }
        }

        RawContainer {
            header,
            fat,
            sectors,
            truncate_to: None,
        }
    }

    /// Set one FAT entry.
    pub fn set_fat(&mut self, sector: u32, next: u32) -> &mut Self {
        self.fat[sector as usize] = next;
        self
    }

    /// Chain `sectors` together in order, ending with ENDOFCHAIN.
    pub fn link(&mut self, sectors: &[u32]) -> &mut Self {
        for pair in sectors.windows(2) {
            self.fat[pair[0] as usize] = pair[1];
        }
        if let Some(&last) = sectors.last() {
            self.fat[last as usize] = ENDOFCHAIN;
        }
        self
    }

    /// List the FAT sector twice in the header DIFAT.
    pub fn duplicate_fat_slot(&mut self) -> &mut Self {
        self.header[0x2C..0x30].copy_from_slice(&2u32.to_le_bytes());
        self.header[0x50..0x54].copy_from_slice(&FAT_SECTOR.to_le_bytes());
        self
    }

    /// Point the header at a DIFAT chain of `count` sectors starting at
    /// `first` and declare `fat_sectors` FAT sectors in total.
    pub fn difat_header(&mut self, first: u32, count: u32, fat_sectors: u32) -> &mut Self {
        self.header[0x2C..0x30].copy_from_slice(&fat_sectors.to_le_bytes());
        self.header[0x44..0x48].copy_from_slice(&first.to_le_bytes());
        self.header[0x48..0x4C].copy_from_slice(&count.to_le_bytes());
        self
    }

    /// Make `sector` a DIFAT sector listing `fat_sectors`, chained to `next`.
    pub fn difat_sector(&mut self, sector: u32, fat_sectors: &[u32], next: u32) -> &mut Self {
        let slots = SECTOR / 4 - 1;
        assert!(fat_sectors.len() <= slots);
        let mut bytes = Vec::with_capacity(SECTOR);
        for slot in 0..slots {
            let id = fat_sectors.get(slot).copied().unwrap_or(FREESECT);
            bytes.extend_from_slice(&id.to_le_bytes());
        }
        bytes.extend_from_slice(&next.to_le_bytes());
        self.fat[sector as usize] = DIFSECT;
        self.write_sector(sector, &bytes)
    }

    /// Write directory entry `sid` (0..4).
    pub fn entry(&mut self, sid: usize, entry: RawEntry<'_>) -> &mut Self {
        let slot = &mut self.sectors[DIR_SECTOR as usize][sid * DIRENTRY_SIZE..][..DIRENTRY_SIZE];
        slot.fill(0);
        let units: Vec<u16> = entry.name.encode_utf16().collect();
        for (i, unit) in units.iter().take(31).enumerate() {
            slot[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        let name_len = ((units.len().min(31) + 1) * 2) as u16;
        slot[0x40..0x42].copy_from_slice(&name_len.to_le_bytes());
        slot[0x42] = entry.kind;
        slot[0x43] = 1;
        slot[0x44..0x48].copy_from_slice(&entry.left.to_le_bytes());
        slot[0x48..0x4C].copy_from_slice(&entry.right.to_le_bytes());
        slot[0x4C..0x50].copy_from_slice(&entry.child.to_le_bytes());
        slot[0x74..0x78].copy_from_slice(&entry.start.to_le_bytes());
        slot[0x78..0x80].copy_from_slice(&entry.size.to_le_bytes());
        self
    }

    /// Overwrite raw bytes of directory entry `sid` at `offset`.
    pub fn patch_entry(&mut self, sid: usize, offset: usize, bytes: &[u8]) -> &mut Self {
        let start = sid * DIRENTRY_SIZE + offset;
        self.sectors[DIR_SECTOR as usize][start..start + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Fill a data sector with `bytes` (zero-padded).
    pub fn write_sector(&mut self, sector: u32, bytes: &[u8]) -> &mut Self {
        let target = &mut self.sectors[sector as usize];
        target.fill(0);
        target[..bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Cut the built file to `len` bytes.
    pub fn truncate(&mut self, len: usize) -> &mut Self {
        self.truncate_to = Some(len);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = self.header.clone();
        for (index, sector) in self.sectors.iter().enumerate() {
            if index == FAT_SECTOR as usize {
                for entry in &self.fat {
                    out.extend_from_slice(&entry.to_le_bytes());
                }
            } else {
                out.extend_from_slice(sector);
            }
        }
        if let Some(len) = self.truncate_to {
            out.truncate(len);
        }
        out
    }
}

/// Write a well-formed container holding `streams` at the given paths.
pub(crate) fn cfb_container(streams: &[(&str, &[u8])]) -> Vec<u8> {
    cfb_container_with_version(cfb::Version::V4, streams)
}

/// Write a well-formed container with the given sector size version.
pub(crate) fn cfb_container_with_version(version: cfb::Version, streams: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::{Cursor, Write};

    let mut compound = cfb::CompoundFile::create_with_version(version, Cursor::new(Vec::new())).unwrap();
    for (path, bytes) in streams {
        let mut stream = compound.create_stream(path).unwrap();
        stream.write_all(bytes).unwrap();
    }
    compound.flush().unwrap();
    compound.into_inner().into_inner()
}
