//! Stream assembler: turns a directory entry into its logical bytes.
//!
//! The assembled length is `min(declared size, bytes reachable through the
//! chain)`. Falling short of the declared size is not an error; the stream is
//! flagged as truncated and callers decide how much of it to trust.

use super::sector::{ChainKind, SectorAllocator, SectorOwner};
use crate::common::{Error, Result};

/// A stream sector that also belongs to a container structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SectorOverlap {
    pub sector: u32,
    pub owner: SectorOwner,
}

/// Bytes of one stream plus how they relate to the declared size.
#[derive(Debug, Clone, Default)]
pub struct LogicalStream {
    data: Vec<u8>,
    declared_size: u64,
    truncated: bool,
    overlaps: Vec<SectorOverlap>,
}

impl LogicalStream {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size recorded in the directory entry.
    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }

    /// Whether the chain ended before the declared size was reached.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Sectors shared with container structures, when such sharing was tolerated.
    pub fn overlaps(&self) -> &[SectorOverlap] {
        &self.overlaps
    }
}

impl AsRef<[u8]> for LogicalStream {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Reject a declared size larger than anything the allocation table can address.
///
/// A cut-off file keeps its original FAT, so a stream that merely lost its
/// tail still passes and comes back truncated.
pub(crate) fn check_declared_size(size: u64, addressable: u64) -> Result<usize> {
    if size > addressable {
        return Err(Error::corrupt_container(format!(
            "declared stream size {} exceeds the {} bytes the container can address",
            size, addressable
        )));
    }
    usize::try_from(size)
        .map_err(|_| Error::corrupt_container(format!("declared stream size {} is unaddressable", size)))
}

/// Assemble a stream stored in regular sectors.
///
/// A sector also owned by the FAT, DIFAT, directory, Mini-FAT or mini stream
/// fails with `CorruptContainer` unless `tolerate_overlap` is set, in which
/// case the sector is read anyway and reported through
/// [`LogicalStream::overlaps`].
pub(crate) fn assemble_regular(
    sectors: &SectorAllocator<'_>,
    start: u32,
    size: u64,
    tolerate_overlap: bool,
) -> Result<LogicalStream> {
    let wanted = check_declared_size(size, sectors.addressable_bytes(ChainKind::Main))?;
    let mut stream = LogicalStream {
        data: Vec::with_capacity(wanted.min(sectors.source_len())),
        declared_size: size,
        ..Default::default()
    };

    let mut chain = sectors.chain(start, ChainKind::Main);
    while stream.data.len() < wanted {
        let Some(sector_id) = chain.next().transpose()? else {
            break;
        };

        if let Some(owner) = sectors.usage().owner(sector_id) {
            if !tolerate_overlap {
                return Err(Error::corrupt_container(format!(
                    "workbook corruption: stream sector {} is also used by the {}",
                    sector_id, owner
                )));
            }
            log::warn!("stream sector {} is also used by the {}", sector_id, owner);
            stream.overlaps.push(SectorOverlap {
                sector: sector_id,
                owner,
            });
        }

        let Some(bytes) = sectors.sector(sector_id) else {
            log::warn!("stream sector {} lies past the end of the file", sector_id);
            break;
        };
        let take = bytes.len().min(wanted - stream.data.len());
        stream.data.extend_from_slice(&bytes[..take]);
        if bytes.len() < sectors.sector_size() {
            // Short final sector of a cut file.
            break;
        }
    }

    finish(stream, wanted)
}

/// Assemble a stream stored in mini sectors of `mini_stream`.
pub(crate) fn assemble_mini(
    sectors: &SectorAllocator<'_>,
    mini_stream: &[u8],
    start: u32,
    size: u64,
) -> Result<LogicalStream> {
    let wanted = check_declared_size(size, sectors.addressable_bytes(ChainKind::Mini))?;
    let mini_size = sectors.mini_sector_size();
    let mut stream = LogicalStream {
        data: Vec::with_capacity(wanted.min(mini_stream.len())),
        declared_size: size,
        ..Default::default()
    };

    let mut chain = sectors.chain(start, ChainKind::Mini);
    while stream.data.len() < wanted {
        let Some(mini_id) = chain.next().transpose()? else {
            break;
        };
        let offset = mini_id as usize * mini_size;
        if offset >= mini_stream.len() {
            log::warn!("mini sector {} lies past the end of the mini stream", mini_id);
            break;
        }
        let end = (offset + mini_size).min(mini_stream.len());
        let bytes = &mini_stream[offset..end];
        let take = bytes.len().min(wanted - stream.data.len());
        stream.data.extend_from_slice(&bytes[..take]);
        if bytes.len() < mini_size {
            break;
        }
    }

    finish(stream, wanted)
}

fn finish(mut stream: LogicalStream, wanted: usize) -> Result<LogicalStream> {
    if stream.data.len() < wanted {
        log::warn!(
            "stream truncated: {} of {} declared bytes reachable",
            stream.data.len(),
            wanted
        );
        stream.truncated = true;
    }
    Ok(stream)
}
