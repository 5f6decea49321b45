//! Codepage decoding for BIFF5/7 byte strings.
//!
//! BIFF8 stores text as UTF-16 (or its "compressed" Latin-1 form), but earlier
//! versions store bytes in the codepage named by the workbook's CODEPAGE
//! record. The record holds a Windows codepage identifier with a couple of
//! Excel-specific aliases.

use encoding_rs::Encoding;
use std::borrow::Cow;

/// Codepage assumed when a workbook has no CODEPAGE record.
pub const DEFAULT_CODEPAGE: u16 = 1252;

/// Codepage identifier marking UTF-16LE text (the BIFF8 norm).
pub const CODEPAGE_UTF16: u16 = 1200;

/// Map a CODEPAGE record value to an `encoding_rs` encoding.
///
/// # Examples
///
/// ```
/// use xls_salvage::ole::codepage::codepage_to_encoding;
///
/// assert_eq!(codepage_to_encoding(1251), Some(encoding_rs::WINDOWS_1251));
/// // Excel's alias for Windows-1252
/// assert_eq!(codepage_to_encoding(32769), Some(encoding_rs::WINDOWS_1252));
/// assert_eq!(codepage_to_encoding(437), None);
/// ```
#[inline]
pub fn codepage_to_encoding(codepage: u16) -> Option<&'static Encoding> {
    match codepage {
        // US-ASCII; 1252 is a strict superset
        367 => Some(encoding_rs::WINDOWS_1252),

        874 => Some(encoding_rs::WINDOWS_874),   // Thai
        1250 => Some(encoding_rs::WINDOWS_1250), // Central European
        1251 => Some(encoding_rs::WINDOWS_1251), // Cyrillic
        1252 => Some(encoding_rs::WINDOWS_1252), // Western European
        1253 => Some(encoding_rs::WINDOWS_1253), // Greek
        1254 => Some(encoding_rs::WINDOWS_1254), // Turkish
        1255 => Some(encoding_rs::WINDOWS_1255), // Hebrew
        1256 => Some(encoding_rs::WINDOWS_1256), // Arabic
        1257 => Some(encoding_rs::WINDOWS_1257), // Baltic
        1258 => Some(encoding_rs::WINDOWS_1258), // Vietnamese

        932 => Some(encoding_rs::SHIFT_JIS),
        936 => Some(encoding_rs::GBK),
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),

        20866 => Some(encoding_rs::KOI8_R),
        21866 => Some(encoding_rs::KOI8_U),
        28592 => Some(encoding_rs::ISO_8859_2),
        28593 => Some(encoding_rs::ISO_8859_3),
        28594 => Some(encoding_rs::ISO_8859_4),
        28595 => Some(encoding_rs::ISO_8859_5),
        28596 => Some(encoding_rs::ISO_8859_6),
        28597 => Some(encoding_rs::ISO_8859_7),
        28598 => Some(encoding_rs::ISO_8859_8),
        28605 => Some(encoding_rs::ISO_8859_15),

        // Mac Roman, plus Excel's own alias for it
        10000 | 32768 => Some(encoding_rs::MACINTOSH),
        // Excel's alias for Windows-1252
        32769 => Some(encoding_rs::WINDOWS_1252),

        CODEPAGE_UTF16 => Some(encoding_rs::UTF_16LE),
        65001 => Some(encoding_rs::UTF_8),

        _ => None,
    }
}

/// A resolved text codepage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codepage {
    id: u16,
    encoding: &'static Encoding,
}

impl Codepage {
    /// Resolve a CODEPAGE record value, or `None` if it has no decoder.
    pub fn new(id: u16) -> Option<Self> {
        codepage_to_encoding(id).map(|encoding| Codepage { id, encoding })
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Decode a byte string, replacing malformed sequences with U+FFFD.
    #[inline]
    pub fn decode<'b>(&self, bytes: &'b [u8]) -> Cow<'b, str> {
        self.encoding.decode_without_bom_handling(bytes).0
    }
}

impl Default for Codepage {
    fn default() -> Self {
        Codepage {
            id: DEFAULT_CODEPAGE,
            encoding: encoding_rs::WINDOWS_1252,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_windows_1251() {
        let cp = Codepage::new(1251).unwrap();
        assert_eq!(cp.decode(&[0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2]), "Привет");
    }

    #[test]
    fn test_decode_default_is_1252() {
        let cp = Codepage::default();
        assert_eq!(cp.id(), 1252);
        assert_eq!(cp.decode(&[0x80, 0x31]), "€1");
    }

    #[test]
    fn test_decode_shift_jis() {
        let cp = Codepage::new(932).unwrap();
        assert_eq!(cp.decode(&[0x93, 0xFA, 0x96, 0x7B]), "日本");
    }

    #[test]
    fn test_unknown_codepage() {
        assert!(Codepage::new(99).is_none());
        assert!(Codepage::new(437).is_none());
    }
}
