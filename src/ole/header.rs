//! Compound-file header (the first 512 bytes).

use super::consts::*;
use crate::common::{Error, Result};
use zerocopy::{FromBytes, LE, U16, U32};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw on-disk header layout (512 bytes, little-endian)
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
#[allow(dead_code)] // fields mirror the on-disk layout
struct RawHeader {
    signature: [u8; 8],
    clsid: [u8; 16],
    minor_version: U16<LE>,
    major_version: U16<LE>,
    byte_order: U16<LE>,
    sector_shift: U16<LE>,
    mini_sector_shift: U16<LE>,
    reserved: [u8; 6],
    num_dir_sectors: U32<LE>,
    num_fat_sectors: U32<LE>,
    first_dir_sector: U32<LE>,
    transaction_signature: U32<LE>,
    mini_stream_cutoff: U32<LE>,
    first_minifat_sector: U32<LE>,
    num_minifat_sectors: U32<LE>,
    first_difat_sector: U32<LE>,
    num_difat_sectors: U32<LE>,
    difat: [U32<LE>; HEADER_DIFAT_SLOTS],
}

/// Validated header fields needed to walk the container.
#[derive(Debug, Clone)]
pub struct Header {
    /// Major format version (3 or 4)
    pub major_version: u16,
    /// Sector size in bytes (512 or 4096)
    pub sector_size: usize,
    /// Mini sector size in bytes (normally 64)
    pub mini_sector_size: usize,
    /// Streams smaller than this live in the mini stream
    pub mini_stream_cutoff: u32,
    /// Declared number of FAT sectors
    pub num_fat_sectors: u32,
    /// First sector of the directory chain
    pub first_dir_sector: u32,
    /// First sector of the Mini-FAT chain
    pub first_minifat_sector: u32,
    /// Declared number of Mini-FAT sectors
    pub num_minifat_sectors: u32,
    /// First DIFAT sector (ENDOFCHAIN when the header slots suffice)
    pub first_difat_sector: u32,
    /// Declared number of DIFAT sectors
    pub num_difat_sectors: u32,
    /// FAT sector slots held in the header itself
    pub difat: Vec<u32>,
}

impl Header {
    /// Parse and validate the header at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let block = data
            .get(..HEADER_SIZE)
            .ok_or_else(|| Error::corrupt_container(format!(
                "file of {} bytes is shorter than the {}-byte header",
                data.len(),
                HEADER_SIZE
            )))?;
        let raw = RawHeader::read_from_bytes(block)
            .map_err(|_| Error::corrupt_container("unreadable header block"))?;

        if &raw.signature != MAGIC {
            return Err(Error::corrupt_container("bad compound file signature"));
        }
        if raw.byte_order.get() != BYTE_ORDER_LE {
            return Err(Error::corrupt_container(format!(
                "invalid byte order mark 0x{:04X}",
                raw.byte_order.get()
            )));
        }

        let sector_shift = raw.sector_shift.get();
        if sector_shift != SECTOR_SHIFT_V3 && sector_shift != SECTOR_SHIFT_V4 {
            return Err(Error::corrupt_container(format!(
                "unsupported sector size 2^{}",
                sector_shift
            )));
        }
        let major_version = raw.major_version.get();
        if (major_version == 3 && sector_shift != SECTOR_SHIFT_V3)
            || (major_version == 4 && sector_shift != SECTOR_SHIFT_V4)
        {
            log::warn!(
                "major version {} declares sector shift {}; trusting the shift",
                major_version,
                sector_shift
            );
        }

        let mini_sector_shift = raw.mini_sector_shift.get();
        if mini_sector_shift == 0 || mini_sector_shift >= sector_shift {
            return Err(Error::corrupt_container(format!(
                "unsupported mini sector size 2^{}",
                mini_sector_shift
            )));
        }
        if mini_sector_shift != MINI_SECTOR_SHIFT {
            log::debug!("non-standard mini sector shift {}", mini_sector_shift);
        }

        let mini_stream_cutoff = raw.mini_stream_cutoff.get();
        if mini_stream_cutoff != MINI_STREAM_CUTOFF {
            log::warn!(
                "non-standard mini stream cutoff {}; using it as declared",
                mini_stream_cutoff
            );
        }

        Ok(Header {
            major_version,
            sector_size: 1usize << sector_shift,
            mini_sector_size: 1usize << mini_sector_shift,
            mini_stream_cutoff,
            num_fat_sectors: raw.num_fat_sectors.get(),
            first_dir_sector: raw.first_dir_sector.get(),
            first_minifat_sector: raw.first_minifat_sector.get(),
            num_minifat_sectors: raw.num_minifat_sectors.get(),
            first_difat_sector: raw.first_difat_sector.get(),
            num_difat_sectors: raw.num_difat_sectors.get(),
            difat: raw.difat.iter().map(|v| v.get()).collect(),
        })
    }
}

/// Check if a buffer looks like a compound file by its magic bytes
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= HEADER_SIZE && data.get(..8) == Some(&MAGIC[..])
}
