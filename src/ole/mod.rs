/// Constants for the compound file format
pub mod consts;

/// Container header parsing
pub mod header;

/// FAT / Mini-FAT loading and chain traversal
pub mod sector;

/// Directory tree flattening
pub mod directory;

/// Stream assembly from sector chains
pub mod stream;

/// Compound file entry point
mod file;

/// Codepage decoding for byte strings
pub mod codepage;

/// Legacy Excel workbook (.xls) reader
///
/// Decodes the BIFF5/7 and BIFF8 record streams stored in the `Book` or
/// `Workbook` stream of a compound file.
pub mod xls;

#[cfg(test)]
pub(crate) mod test_support;

pub use directory::{DirEntry, Directory, EntryKind};
pub use file::CompoundFile;
pub use header::is_ole_file;
pub use sector::{ChainKind, SectorOwner};
pub use stream::{LogicalStream, SectorOverlap};
