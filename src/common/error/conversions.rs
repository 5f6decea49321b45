//! Error conversion implementations.
//!
//! Byte-level read failures only reach callers through the container layer,
//! where running off the end of a header or directory sector means the
//! envelope itself is damaged.

use super::types::Error;
use crate::common::binary::BinaryError;

impl From<BinaryError> for Error {
    fn from(err: BinaryError) -> Self {
        Error::CorruptContainer(err.to_string())
    }
}
