//! Number formats (FORMAT) and cell styles (XF).
//!
//! The core keeps these as plain lookup tables: the meaning of a format code
//! is left to whoever renders the values.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::common::binary::{self, BinaryResult};
use crate::ole::xls::strings::TextDecoder;

/// Built-in number format codes that are never written to the file.
fn builtin_format(id: u16) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        5 => "\"$\"#,##0_);(\"$\"#,##0)",
        6 => "\"$\"#,##0_);[Red](\"$\"#,##0)",
        7 => "\"$\"#,##0.00_);(\"$\"#,##0.00)",
        8 => "\"$\"#,##0.00_);[Red](\"$\"#,##0.00)",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        41 => "_(* #,##0_);_(* (#,##0);_(* \"-\"_);_(@_)",
        42 => "_(\"$\"* #,##0_);_(\"$\"* (#,##0);_(\"$\"* \"-\"_);_(@_)",
        43 => "_(* #,##0.00_);_(* (#,##0.00);_(* \"-\"??_);_(@_)",
        44 => "_(\"$\"* #,##0.00_);_(\"$\"* (#,##0.00);_(\"$\"* \"-\"??_);_(@_)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

/// One XF record: the structural part of a cell style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct XfEntry {
    pub font_index: u16,
    pub format_index: u16,
    /// Style XF (as opposed to a cell XF)
    pub is_style: bool,
    /// Parent style XF of a cell XF
    pub parent: u16,
}

impl XfEntry {
    /// BIFF5 and BIFF8 share the leading six bytes this reads.
    pub fn parse(data: &[u8]) -> BinaryResult<Self> {
        let font_index = binary::read_u16_le(data, 0)?;
        let format_index = binary::read_u16_le(data, 2)?;
        let type_prot = binary::read_u16_le(data, 4)?;
        Ok(XfEntry {
            font_index,
            format_index,
            is_style: type_prot & 0x0004 != 0,
            parent: type_prot >> 4,
        })
    }
}

/// Number formats and cell styles of a workbook.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormatTable {
    custom: BTreeMap<u16, String>,
    xfs: Vec<XfEntry>,
}

impl FormatTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a FORMAT record and register its code.
    pub fn add_format(&mut self, data: &[u8], text: &TextDecoder) -> BinaryResult<u16> {
        let id = binary::read_u16_le(data, 0)?;
        let rest = binary::slice_at(data, 2, data.len().saturating_sub(2))?;
        let (code, _) = if text.version().supports_unicode() {
            text.read_u16_string(rest)?
        } else {
            text.read_u8_string(rest)?
        };
        log::trace!("format {}: {:?}", id, code);
        self.custom.insert(id, code);
        Ok(id)
    }

    pub fn add_xf(&mut self, xf: XfEntry) {
        self.xfs.push(xf);
    }

    /// Format code for a format id: custom codes override built-ins.
    pub fn format_code(&self, id: u16) -> Option<&str> {
        self.custom
            .get(&id)
            .map(String::as_str)
            .or_else(|| builtin_format(id))
    }

    pub fn xf(&self, index: u16) -> Option<&XfEntry> {
        self.xfs.get(usize::from(index))
    }

    pub fn xfs(&self) -> &[XfEntry] {
        &self.xfs
    }

    pub fn custom_formats(&self) -> impl Iterator<Item = (u16, &str)> {
        self.custom.iter().map(|(id, code)| (*id, code.as_str()))
    }

    /// Format code applied by a cell XF.
    pub fn number_format(&self, xf_index: u16) -> Option<&str> {
        self.format_code(self.xf(xf_index)?.format_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::codepage::Codepage;
    use crate::ole::xls::records::BiffVersion;

    #[test]
    fn test_builtin_and_custom_formats() {
        let mut table = FormatTable::new();
        assert_eq!(table.format_code(0), Some("General"));
        assert_eq!(table.format_code(14), Some("mm-dd-yy"));
        assert_eq!(table.format_code(30), None);

        let mut record = 164u16.to_le_bytes().to_vec();
        record.extend_from_slice(&[6, 0, 0x00]);
        record.extend_from_slice(b"0.000%");
        assert_eq!(table.add_format(&record, &TextDecoder::default()).unwrap(), 164);
        assert_eq!(table.format_code(164), Some("0.000%"));
    }

    #[test]
    fn test_biff5_format_uses_byte_length() {
        let mut table = FormatTable::new();
        let text = TextDecoder::new(BiffVersion::Biff5, Codepage::default());
        let mut record = 2u16.to_le_bytes().to_vec();
        record.extend_from_slice(&[3]);
        record.extend_from_slice(b"0.0");
        table.add_format(&record, &text).unwrap();
        // Overrides the built-in code for the same id.
        assert_eq!(table.format_code(2), Some("0.0"));
    }

    #[test]
    fn test_xf_resolution() {
        let mut table = FormatTable::new();
        table.add_xf(XfEntry::parse(&[0, 0, 0, 0, 0xF5, 0xFF]).unwrap());
        table.add_xf(XfEntry::parse(&[1, 0, 10, 0, 0x01, 0x00, 0x20]).unwrap());

        assert!(table.xf(0).unwrap().is_style);
        assert_eq!(table.xf(0).unwrap().parent, 0x0FFF);
        assert_eq!(table.xf(1).unwrap().font_index, 1);
        assert_eq!(table.number_format(1), Some("0.00%"));
        assert_eq!(table.number_format(7), None);
        assert!(XfEntry::parse(&[0, 0, 0]).is_err());
    }
}
