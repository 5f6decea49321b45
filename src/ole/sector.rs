//! Sector allocator: FAT / Mini-FAT loading and bounded chain traversal.
//!
//! The container is treated as a flat run of fixed-size sectors following the
//! header block. Sector `i` lives at byte offset `(i + 1) * sector_size`. The
//! FAT maps each sector to the next one in its chain; the Mini-FAT does the
//! same for the 64-byte sectors of the mini stream.
//!
//! Every chain walk carries a visited set sized to its allocation table, so a
//! crafted cycle (`next[5] = 5`, or any longer loop) is reported after at most
//! `table.len()` steps instead of spinning forever.

use super::consts::*;
use super::header::Header;
use crate::common::binary::read_u32_le;
use crate::common::{Error, Result};
use fixedbitset::FixedBitSet;

/// Which allocation table a chain is threaded through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    /// Regular sectors, chained through the FAT
    Main,
    /// Mini sectors inside the mini stream, chained through the Mini-FAT
    Mini,
}

/// Container structure that owns a regular sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SectorOwner {
    Fat,
    Difat,
    Directory,
    MiniFat,
    MiniStream,
}

impl std::fmt::Display for SectorOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SectorOwner::Fat => "FAT",
            SectorOwner::Difat => "DIFAT",
            SectorOwner::Directory => "directory",
            SectorOwner::MiniFat => "Mini-FAT",
            SectorOwner::MiniStream => "mini stream",
        };
        f.write_str(name)
    }
}

/// Records which structure claimed each regular sector.
#[derive(Debug, Clone)]
pub struct SectorMap {
    owners: Vec<Option<SectorOwner>>,
}

impl SectorMap {
    fn new(sector_count: u32) -> Self {
        SectorMap {
            owners: vec![None; sector_count as usize],
        }
    }

    /// Claim `sector` for `owner`, returning the previous owner on conflict.
    fn claim(&mut self, sector: u32, owner: SectorOwner) -> std::result::Result<(), SectorOwner> {
        match self.owners.get_mut(sector as usize) {
            Some(Some(previous)) => Err(*previous),
            Some(slot) => {
                *slot = Some(owner);
                Ok(())
            },
            // Sectors past the end of the file hold nothing to protect.
            None => Ok(()),
        }
    }

    /// The structure owning `sector`, if any.
    pub fn owner(&self, sector: u32) -> Option<SectorOwner> {
        self.owners.get(sector as usize).copied().flatten()
    }
}

/// Lazy, finite walk over one sector chain.
///
/// Yields sector indices in chain order and stops at `ENDOFCHAIN` (or any other
/// reserved marker). An index outside the table or a revisited sector yields a
/// single `CorruptContainer` error and ends the walk.
#[derive(Debug)]
pub struct Chain<'t> {
    table: &'t [u32],
    kind: ChainKind,
    next: u32,
    visited: FixedBitSet,
    done: bool,
}

impl<'t> Chain<'t> {
    fn new(table: &'t [u32], start: u32, kind: ChainKind) -> Self {
        Chain {
            table,
            kind,
            next: start,
            visited: FixedBitSet::with_capacity(table.len()),
            done: false,
        }
    }
}

impl Iterator for Chain<'_> {
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let current = self.next;
        if current > MAXREGSECT {
            self.done = true;
            if current != ENDOFCHAIN {
                log::debug!(
                    "{:?} chain ended on marker 0x{:08X} instead of ENDOFCHAIN",
                    self.kind,
                    current
                );
            }
            return None;
        }

        let index = current as usize;
        let Some(&following) = self.table.get(index) else {
            self.done = true;
            return Some(Err(Error::corrupt_container(format!(
                "{:?} chain references sector {} outside a table of {} entries",
                self.kind,
                current,
                self.table.len()
            ))));
        };
        if self.visited.put(index) {
            self.done = true;
            return Some(Err(Error::corrupt_container(format!(
                "{:?} chain revisits sector {}",
                self.kind, current
            ))));
        }

        log::trace!("{:?} chain: {} -> 0x{:08X}", self.kind, current, following);
        self.next = following;
        Some(Ok(current))
    }
}

/// Regular-sector view of the container plus its allocation tables.
#[derive(Debug)]
pub struct SectorAllocator<'a> {
    data: &'a [u8],
    sector_size: usize,
    mini_sector_size: usize,
    sector_count: u32,
    fat: Vec<u32>,
    minifat: Vec<u32>,
    usage: SectorMap,
}

impl<'a> SectorAllocator<'a> {
    /// Load the FAT (header slots plus DIFAT chain) and the Mini-FAT.
    pub fn new(data: &'a [u8], header: &Header) -> Result<Self> {
        let sector_size = header.sector_size;
        let payload = data.len().saturating_sub(sector_size);
        let sector_count = u32::try_from(payload.div_ceil(sector_size)).map_err(|_| {
            Error::corrupt_container("container has more sectors than can be addressed")
        })?;
        if payload % sector_size != 0 {
            log::warn!(
                "file size {} is not a whole number of {}-byte sectors",
                data.len(),
                sector_size
            );
        }

        let mut allocator = SectorAllocator {
            data,
            sector_size,
            mini_sector_size: header.mini_sector_size,
            sector_count,
            fat: Vec::new(),
            minifat: Vec::new(),
            usage: SectorMap::new(sector_count),
        };

        let fat_sectors = allocator.collect_fat_sectors(header)?;
        allocator.load_fat(&fat_sectors)?;
        if header.num_minifat_sectors > 0 && header.first_minifat_sector <= MAXREGSECT {
            allocator.load_minifat(header.first_minifat_sector)?;
        }

        log::debug!(
            "container: {} sectors of {} bytes, {} FAT entries, {} Mini-FAT entries",
            allocator.sector_count,
            allocator.sector_size,
            allocator.fat.len(),
            allocator.minifat.len()
        );
        Ok(allocator)
    }

    /// Gather FAT sector indices from the header slots and the DIFAT chain.
    fn collect_fat_sectors(&mut self, header: &Header) -> Result<Vec<u32>> {
        let mut fat_sectors: Vec<u32> = header
            .difat
            .iter()
            .copied()
            .filter(|&sector| sector <= MAXREGSECT)
            .collect();

        let entries_per_sector = self.sector_size / 4 - 1;
        let mut difat_sector = header.first_difat_sector;
        let mut visited = FixedBitSet::with_capacity(self.sector_count as usize);
        let mut walked = 0u32;
        let max_listed = self.fat_sectors_needed().max(header.num_fat_sectors as usize);

        while difat_sector <= MAXREGSECT && walked < header.num_difat_sectors {
            if difat_sector >= self.sector_count {
                log::warn!("DIFAT sector {} lies past the end of the file", difat_sector);
                break;
            }
            if visited.put(difat_sector as usize) {
                return Err(Error::corrupt_container(format!(
                    "DIFAT chain revisits sector {}",
                    difat_sector
                )));
            }
            self.claim_structural(difat_sector, SectorOwner::Difat);

            let sector = self.read_sector(difat_sector)?;
            for i in 0..entries_per_sector {
                let entry = read_u32_le(sector, i * 4)?;
                if entry <= MAXREGSECT && fat_sectors.len() < max_listed {
                    fat_sectors.push(entry);
                }
            }
            difat_sector = read_u32_le(sector, entries_per_sector * 4)?;
            walked += 1;
        }

        let declared = header.num_fat_sectors as usize;
        if declared > 0 && fat_sectors.len() > declared {
            fat_sectors.truncate(declared);
        } else if fat_sectors.len() < declared {
            log::warn!(
                "header declares {} FAT sectors but only {} are listed",
                declared,
                fat_sectors.len()
            );
        }

        // FAT sectors beyond those needed to map every sector in the file
        // describe nothing that can be read.
        let needed = self.fat_sectors_needed();
        if fat_sectors.len() > needed {
            log::warn!(
                "{} FAT sectors listed for a file of {} sectors; keeping {}",
                fat_sectors.len(),
                self.sector_count,
                needed
            );
            fat_sectors.truncate(needed);
        }
        Ok(fat_sectors)
    }

    /// FAT sectors required to hold one entry per sector of the file.
    fn fat_sectors_needed(&self) -> usize {
        (self.sector_count as usize).div_ceil(self.sector_size / 4)
    }

    fn load_fat(&mut self, fat_sectors: &[u32]) -> Result<()> {
        let entries_per_sector = self.sector_size / 4;
        self.fat.reserve(fat_sectors.len().saturating_mul(entries_per_sector));

        for &sector_id in fat_sectors {
            if let Err(previous) = self.usage.claim(sector_id, SectorOwner::Fat) {
                return Err(Error::corrupt_container(format!(
                    "FAT sector {} is already used by the {}",
                    sector_id, previous
                )));
            }

            match self.sector(sector_id) {
                Some(sector) => {
                    for i in 0..entries_per_sector {
                        // A short final sector reads as free entries.
                        self.fat.push(read_u32_le(sector, i * 4).unwrap_or(FREESECT));
                    }
                },
                None => {
                    log::warn!("FAT sector {} lies past the end of the file", sector_id);
                    self.fat
                        .extend(std::iter::repeat_n(FREESECT, entries_per_sector));
                },
            }
        }
        Ok(())
    }

    fn load_minifat(&mut self, first_minifat_sector: u32) -> Result<()> {
        let (bytes, truncated) = self.read_structure(first_minifat_sector, SectorOwner::MiniFat)?;
        if truncated {
            log::warn!("Mini-FAT chain runs past the end of the file");
        }
        self.minifat = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(())
    }

    fn claim_structural(&mut self, sector: u32, owner: SectorOwner) {
        if let Err(previous) = self.usage.claim(sector, owner) {
            log::warn!(
                "sector {} claimed by the {} is already used by the {}",
                sector,
                owner,
                previous
            );
        }
    }

    /// Read a whole container structure (directory, Mini-FAT, mini stream)
    /// by following its FAT chain, claiming each sector for `owner`.
    ///
    /// Returns the bytes and whether the chain ran past the end of the file.
    pub(crate) fn read_structure(&mut self, start: u32, owner: SectorOwner) -> Result<(Vec<u8>, bool)> {
        let sectors: Vec<u32> = self.chain(start, ChainKind::Main).collect::<Result<_>>()?;
        let mut bytes = Vec::with_capacity(sectors.len().saturating_mul(self.sector_size));
        let mut truncated = false;
        for sector_id in sectors {
            self.claim_structural(sector_id, owner);
            match self.sector(sector_id) {
                Some(sector) => bytes.extend_from_slice(sector),
                None => {
                    truncated = true;
                    break;
                },
            }
        }
        Ok((bytes, truncated))
    }

    /// Walk the chain starting at `start` through the table for `kind`.
    pub fn chain(&self, start: u32, kind: ChainKind) -> Chain<'_> {
        let table = match kind {
            ChainKind::Main => &self.fat,
            ChainKind::Mini => &self.minifat,
        };
        Chain::new(table, start, kind)
    }

    /// Borrow a regular sector, or `None` when it lies wholly past the end of
    /// the file. The final sector of a short file may be returned partially.
    pub fn sector(&self, index: u32) -> Option<&'a [u8]> {
        if index >= self.sector_count {
            return None;
        }
        let start = (index as usize + 1).checked_mul(self.sector_size)?;
        let end = start.saturating_add(self.sector_size).min(self.data.len());
        self.data.get(start..end)
    }

    /// Borrow a regular sector, failing with `CorruptContainer` when it does
    /// not exist in the file.
    pub fn read_sector(&self, index: u32) -> Result<&'a [u8]> {
        self.sector(index).ok_or_else(|| {
            Error::corrupt_container(format!(
                "sector {} outside a file of {} sectors",
                index, self.sector_count
            ))
        })
    }

    /// Size of a regular sector in bytes.
    pub fn sector_size(&self) -> usize {
        self.sector_size
    }

    /// Size of a mini sector in bytes.
    pub fn mini_sector_size(&self) -> usize {
        self.mini_sector_size
    }

    /// Number of regular sectors physically present after the header.
    pub fn sector_count(&self) -> u32 {
        self.sector_count
    }

    /// Ownership of regular sectors by container structures.
    pub fn usage(&self) -> &SectorMap {
        &self.usage
    }

    /// Upper bound on the size of a stream threaded through the table for `kind`.
    pub fn addressable_bytes(&self, kind: ChainKind) -> u64 {
        match kind {
            ChainKind::Main => self.fat.len() as u64 * self.sector_size as u64,
            ChainKind::Mini => self.minifat.len() as u64 * self.mini_sector_size as u64,
        }
    }

    /// Total length of the underlying byte source.
    pub fn source_len(&self) -> usize {
        self.data.len()
    }
}
