//! Error taxonomy for container and record decoding.
//!
//! Only structural damage that leaves the remaining bytes uninterpretable is an
//! [`Error`]. Locally bounded damage (a truncated stream, a single out-of-range
//! cell) is downgraded to a [`Warning`](crate::ole::xls::Warning) on the result.
use thiserror::Error;

/// Main error type for workbook decoding.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error while reading the input file into memory
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The compound-file envelope violates an invariant that cannot be routed around
    #[error("Corrupt container: {0}")]
    CorruptContainer(String),

    /// The record stream violates continuation framing beyond tolerable truncation
    #[error("Corrupt record 0x{record_type:04X} at offset {offset}: {message}")]
    CorruptRecord {
        record_type: u16,
        offset: usize,
        message: String,
    },

    /// Structurally valid input using a version, codepage or variant that is not implemented
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    pub(crate) fn corrupt_container(message: impl Into<String>) -> Self {
        Error::CorruptContainer(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Error::UnsupportedFormat(message.into())
    }
}

/// Result type for workbook decoding.
pub type Result<T> = std::result::Result<T, Error>;
