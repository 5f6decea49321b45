//! In-memory compound file: header, allocation tables, directory, mini stream.

use super::directory::{DirEntry, Directory};
use super::header::Header;
use super::sector::{SectorAllocator, SectorOwner};
use super::stream::{self, LogicalStream};
use crate::common::{Error, Result};

/// A parsed OLE2 compound file borrowed from a byte buffer.
///
/// Parsing validates the header, loads the FAT/Mini-FAT, flattens the
/// directory and reads the mini stream. Individual streams are assembled on
/// demand by [`CompoundFile::open_stream`].
///
/// # Examples
///
/// ```no_run
/// use xls_salvage::ole::CompoundFile;
///
/// let data = std::fs::read("book.xls")?;
/// let cfb = CompoundFile::parse(&data)?;
/// for entry in cfb.directory().streams() {
///     println!("{} ({} bytes)", entry.path, entry.size);
/// }
/// let workbook = cfb.open_stream("Workbook")?;
/// println!("truncated: {}", workbook.is_truncated());
/// # Ok::<(), xls_salvage::Error>(())
/// ```
#[derive(Debug)]
pub struct CompoundFile<'a> {
    header: Header,
    sectors: SectorAllocator<'a>,
    directory: Directory,
    mini_stream: Vec<u8>,
    tolerate_overlap: bool,
}

impl<'a> CompoundFile<'a> {
    /// Parse the container structures of `data`.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = Header::parse(data)?;
        let mut sectors = SectorAllocator::new(data, &header)?;

        let (dir_bytes, dir_truncated) =
            sectors.read_structure(header.first_dir_sector, SectorOwner::Directory)?;
        if dir_truncated {
            log::warn!("directory chain runs past the end of the file");
        }
        let directory = Directory::parse(&dir_bytes, header.major_version)?;

        let root = directory.root();
        let mini_stream = if root.size > 0 && root.start_sector <= super::consts::MAXREGSECT {
            let (mut bytes, truncated) =
                sectors.read_structure(root.start_sector, SectorOwner::MiniStream)?;
            if truncated || (bytes.len() as u64) < root.size {
                log::warn!(
                    "mini stream truncated: {} of {} declared bytes reachable",
                    bytes.len(),
                    root.size
                );
            }
            bytes.truncate(usize::try_from(root.size).unwrap_or(usize::MAX));
            bytes
        } else {
            Vec::new()
        };

        log::debug!(
            "compound file v{}: {} directory entries, mini stream {} bytes",
            header.major_version,
            directory.entries().len(),
            mini_stream.len()
        );

        Ok(CompoundFile {
            header,
            sectors,
            directory,
            mini_stream,
            tolerate_overlap: false,
        })
    }

    /// Read streams whose sectors are also claimed by container structures
    /// instead of rejecting them.
    pub fn tolerate_overlap(mut self, tolerate: bool) -> Self {
        self.tolerate_overlap = tolerate;
        self
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Find a stream by slash-separated path (case-insensitive) and assemble it.
    pub fn open_stream(&self, path: &str) -> Result<LogicalStream> {
        let entry = self
            .directory
            .find(path)
            .filter(|e| e.is_stream())
            .ok_or_else(|| Error::corrupt_container(format!("stream '{}' not found", path)))?;
        self.materialize(entry)
    }

    /// Assemble the logical bytes of a stream entry.
    ///
    /// Streams below the mini-stream cutoff are read through the Mini-FAT from
    /// the root's mini stream; everything else through the FAT.
    pub fn materialize(&self, entry: &DirEntry) -> Result<LogicalStream> {
        if entry.size == 0 {
            return Ok(LogicalStream::default());
        }
        if entry.size < u64::from(self.header.mini_stream_cutoff) {
            stream::assemble_mini(&self.sectors, &self.mini_stream, entry.start_sector, entry.size)
        } else {
            stream::assemble_regular(
                &self.sectors,
                entry.start_sector,
                entry.size,
                self.tolerate_overlap,
            )
        }
    }
}
