/// Magic bytes that should be at the beginning of every OLE file
pub const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Size of the fixed header block in bytes
pub const HEADER_SIZE: usize = 512;

/// Size of a directory entry in bytes
pub const DIRENTRY_SIZE: usize = 128;

/// Capacity of the UTF-16LE name buffer of a directory entry, in bytes
pub const DIRENTRY_NAME_CAPACITY: usize = 64;

/// Number of FAT sector slots stored directly in the header
pub const HEADER_DIFAT_SLOTS: usize = 109;

/// Byte-order mark required at header offset 0x1C
pub const BYTE_ORDER_LE: u16 = 0xFFFE;

/// Sector shift for version 3 files (512-byte sectors)
pub const SECTOR_SHIFT_V3: u16 = 9;

/// Sector shift for version 4 files (4096-byte sectors)
pub const SECTOR_SHIFT_V4: u16 = 12;

/// Standard mini-sector shift (64-byte mini sectors)
pub const MINI_SECTOR_SHIFT: u16 = 6;

/// Standard mini-stream cutoff size
pub const MINI_STREAM_CUTOFF: u32 = 4096;

// Sector IDs (from AAF specifications)
/// Maximum regular sector ID
pub const MAXREGSECT: u32 = 0xFFFFFFFA; // -6
/// Denotes a DIFAT sector in a FAT
pub const DIFSECT: u32 = 0xFFFFFFFC; // -4
/// Denotes a FAT sector in a FAT
pub const FATSECT: u32 = 0xFFFFFFFD; // -3
/// End of a virtual stream chain
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE; // -2
/// Unallocated sector
pub const FREESECT: u32 = 0xFFFFFFFF; // -1

// Directory Entry IDs (from AAF specifications)
/// Maximum directory entry ID
pub const MAXREGSID: u32 = 0xFFFFFFFA; // -6
/// Unallocated directory entry
pub const NOSTREAM: u32 = 0xFFFFFFFF; // -1

// Object types in storage (from AAF specifications)
/// Empty directory entry
pub const STGTY_EMPTY: u8 = 0;
/// Element is a storage object
pub const STGTY_STORAGE: u8 = 1;
/// Element is a stream object
pub const STGTY_STREAM: u8 = 2;
/// Element is a root storage
pub const STGTY_ROOT: u8 = 5;

/// Conventional name of the root directory entry
pub const ROOT_ENTRY_NAME: &str = "Root Entry";
