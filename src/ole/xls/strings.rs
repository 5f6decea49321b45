//! BIFF string forms and the shared string table.
//!
//! BIFF8 strings carry an option byte: bit 0 selects UTF-16LE over the
//! "compressed" one-byte form (Latin-1), bit 2 announces a trailing extended
//! block (phonetic data) and bit 3 a list of rich-text formatting runs.
//! BIFF5/7 strings are plain byte strings in the workbook codepage.

use bitflags::bitflags;

use crate::common::binary::{self, BinaryError, BinaryResult, decode_latin1, decode_utf16le};
use crate::ole::codepage::Codepage;
use crate::ole::xls::records::{BiffVersion, Record};

bitflags! {
    /// Option flags of a BIFF8 string header
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StringFlags: u8 {
        /// Characters are UTF-16LE rather than compressed
        const HIGH_BYTE = 0x01;
        /// An extended-string block follows the characters
        const EXT = 0x04;
        /// Formatting runs follow the characters
        const RICH = 0x08;
    }
}

fn decode_chars(bytes: &[u8], high_byte: bool) -> String {
    if high_byte {
        decode_utf16le(bytes)
    } else {
        decode_latin1(bytes)
    }
}

/// Read a BIFF8 string body (`flags`, optional run/ext counts, characters,
/// runs, ext block) whose character count has already been read, starting at
/// `offset`. Returns the string and the offset just past the whole structure.
fn read_biff8_body(data: &[u8], offset: usize, cch: usize) -> BinaryResult<(String, usize)> {
    let flags = StringFlags::from_bits_retain(binary::read_u8(data, offset)?);
    let mut pos = offset + 1;

    let runs = if flags.contains(StringFlags::RICH) {
        let runs = binary::read_u16_le(data, pos)? as usize;
        pos += 2;
        runs
    } else {
        0
    };
    let ext = if flags.contains(StringFlags::EXT) {
        let ext = binary::read_u32_le(data, pos)? as usize;
        pos += 4;
        ext
    } else {
        0
    };

    let width = if flags.contains(StringFlags::HIGH_BYTE) { 2 } else { 1 };
    let chars = binary::slice_at(data, pos, cch * width)?;
    let text = decode_chars(chars, flags.contains(StringFlags::HIGH_BYTE));

    // Runs and the ext block are skipped, but only as far as the data goes.
    let end = pos
        .saturating_add(chars.len())
        .saturating_add(runs.saturating_mul(4))
        .saturating_add(ext)
        .min(data.len());
    Ok((text, end))
}

/// Decodes strings embedded in records for one BIFF version and codepage.
#[derive(Debug, Clone, Copy)]
pub struct TextDecoder {
    version: BiffVersion,
    codepage: Codepage,
}

impl Default for TextDecoder {
    fn default() -> Self {
        TextDecoder {
            version: BiffVersion::Biff8,
            codepage: Codepage::default(),
        }
    }
}

impl TextDecoder {
    pub fn new(version: BiffVersion, codepage: Codepage) -> Self {
        TextDecoder { version, codepage }
    }

    pub fn version(&self) -> BiffVersion {
        self.version
    }

    pub fn codepage(&self) -> Codepage {
        self.codepage
    }

    /// String with a 16-bit character count (LABEL, STRING, BIFF8 FORMAT).
    ///
    /// Returns the text and the number of bytes consumed.
    pub fn read_u16_string(&self, data: &[u8]) -> BinaryResult<(String, usize)> {
        let cch = binary::read_u16_le(data, 0)? as usize;
        match self.version {
            BiffVersion::Biff8 => read_biff8_body(data, 2, cch),
            BiffVersion::Biff5 => {
                let bytes = binary::slice_at(data, 2, cch)?;
                Ok((self.codepage.decode(bytes).into_owned(), 2 + cch))
            },
        }
    }

    /// String with an 8-bit character count (sheet names, BIFF5 FORMAT).
    pub fn read_u8_string(&self, data: &[u8]) -> BinaryResult<(String, usize)> {
        let cch = binary::read_u8(data, 0)? as usize;
        let (text, used) = self.read_chars(binary::slice_at(data, 1, data.len().saturating_sub(1))?, cch)?;
        Ok((text, 1 + used))
    }

    /// `cch` characters whose count is stored elsewhere (NAME records).
    ///
    /// BIFF8 prefixes the characters with an option byte; BIFF5 stores
    /// codepage bytes only.
    pub fn read_chars(&self, data: &[u8], cch: usize) -> BinaryResult<(String, usize)> {
        match self.version {
            BiffVersion::Biff8 => {
                let flags = StringFlags::from_bits_retain(binary::read_u8(data, 0)?);
                let width = if flags.contains(StringFlags::HIGH_BYTE) { 2 } else { 1 };
                let chars = binary::slice_at(data, 1, cch * width)?;
                Ok((
                    decode_chars(chars, flags.contains(StringFlags::HIGH_BYTE)),
                    1 + chars.len(),
                ))
            },
            BiffVersion::Biff5 => {
                let bytes = binary::slice_at(data, 0, cch)?;
                Ok((self.codepage.decode(bytes).into_owned(), cch))
            },
        }
    }
}

/// Reads across the physical fragments of a continued record.
///
/// Plain fields flow across fragment boundaries untouched. Character data is
/// different: a fragment that continues a string's characters starts with a
/// fresh option byte, and the character width may change there.
struct FragmentCursor<'r> {
    fragments: Vec<&'r [u8]>,
    index: usize,
    offset: usize,
}

impl<'r> FragmentCursor<'r> {
    fn new(record: &'r Record<'_>) -> Self {
        FragmentCursor {
            fragments: record.fragments().collect(),
            index: 0,
            offset: 0,
        }
    }

    fn remaining_in_fragment(&self) -> usize {
        self.fragments
            .get(self.index)
            .map_or(0, |f| f.len().saturating_sub(self.offset))
    }

    fn is_exhausted(&self) -> bool {
        self.remaining_in_fragment() == 0
            && self.fragments.iter().skip(self.index + 1).all(|f| f.is_empty())
    }

    fn advance_fragment(&mut self) -> BinaryResult<()> {
        if self.index + 1 >= self.fragments.len() {
            return Err(BinaryError::InsufficientData {
                expected: 1,
                available: 0,
            });
        }
        self.index += 1;
        self.offset = 0;
        Ok(())
    }

    fn read_u8(&mut self) -> BinaryResult<u8> {
        while self.remaining_in_fragment() == 0 {
            self.advance_fragment()?;
        }
        let byte = binary::read_u8(self.fragments[self.index], self.offset)?;
        self.offset += 1;
        Ok(byte)
    }

    fn read_u16(&mut self) -> BinaryResult<u16> {
        Ok(u16::from_le_bytes([self.read_u8()?, self.read_u8()?]))
    }

    fn read_u32(&mut self) -> BinaryResult<u32> {
        Ok(u32::from_le_bytes([
            self.read_u8()?,
            self.read_u8()?,
            self.read_u8()?,
            self.read_u8()?,
        ]))
    }

    fn skip(&mut self, mut n: usize) -> BinaryResult<()> {
        while n > 0 {
            let available = self.remaining_in_fragment();
            if available == 0 {
                self.advance_fragment()?;
                continue;
            }
            let take = n.min(available);
            self.offset += take;
            n -= take;
        }
        Ok(())
    }

    /// Read `cch` characters, honouring the option byte at each boundary.
    ///
    /// On running out of data the characters decoded so far are returned
    /// together with the error.
    fn read_chars(&mut self, cch: usize, mut high_byte: bool) -> Result<String, (String, BinaryError)> {
        let mut text = String::with_capacity(cch.min(1024));
        let mut remaining = cch;
        while remaining > 0 {
            if self.remaining_in_fragment() == 0 {
                if let Err(e) = self.advance_fragment() {
                    return Err((text, e));
                }
                match self.read_u8() {
                    Ok(flags) => high_byte = flags & StringFlags::HIGH_BYTE.bits() != 0,
                    Err(e) => return Err((text, e)),
                }
                continue;
            }

            let width = if high_byte { 2 } else { 1 };
            let available = self.remaining_in_fragment() / width;
            if available == 0 {
                // Half a UTF-16 code unit before the boundary; drop it.
                log::debug!("string continuation splits a character");
                self.offset += self.remaining_in_fragment();
                continue;
            }
            let take = remaining.min(available);
            let fragment = self.fragments[self.index];
            let bytes = &fragment[self.offset..self.offset + take * width];
            text.push_str(&decode_chars(bytes, high_byte));
            self.offset += take * width;
            remaining -= take;
        }
        Ok(text)
    }
}

/// Shared String Table: the workbook-global string list LABELSST cells index.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SharedStringTable {
    strings: Vec<String>,
    /// Total string references the writer claims across the workbook
    pub total_refs: u32,
    /// Unique strings the writer claims the table holds
    pub declared_unique: u32,
    /// Whether the table ended before `declared_unique` strings were read
    pub truncated: bool,
}

impl SharedStringTable {
    /// Decode an SST record (with its merged CONTINUE fragments).
    ///
    /// Never fails: a table cut short keeps the strings decoded so far,
    /// including a partial final string, and is flagged truncated.
    pub fn parse(record: &Record<'_>) -> Self {
        let mut cursor = FragmentCursor::new(record);
        let mut table = SharedStringTable::default();

        let (Ok(total), Ok(unique)) = (cursor.read_u32(), cursor.read_u32()) else {
            table.truncated = true;
            return table;
        };
        table.total_refs = total;
        table.declared_unique = unique;
        // Each entry needs at least three bytes, which bounds the allocation.
        table
            .strings
            .reserve((unique as usize).min(record.data().len() / 3));

        for _ in 0..unique {
            if cursor.is_exhausted() {
                table.truncated = true;
                break;
            }
            match Self::read_entry(&mut cursor) {
                Ok(text) => table.strings.push(text),
                Err(partial) => {
                    if let Some(text) = partial {
                        table.strings.push(text);
                    }
                    table.truncated = true;
                    break;
                },
            }
        }

        if table.truncated {
            log::warn!(
                "shared string table truncated: {} of {} strings decoded",
                table.strings.len(),
                unique
            );
        } else {
            log::debug!("shared string table: {} strings", table.strings.len());
        }
        table
    }

    /// One XLUnicodeRichExtendedString.
    fn read_entry(cursor: &mut FragmentCursor<'_>) -> Result<String, Option<String>> {
        let cch = cursor.read_u16().map_err(|_| None)? as usize;
        let flags = StringFlags::from_bits_retain(cursor.read_u8().map_err(|_| None)?);
        let runs = if flags.contains(StringFlags::RICH) {
            cursor.read_u16().map_err(|_| None)? as usize
        } else {
            0
        };
        let ext = if flags.contains(StringFlags::EXT) {
            cursor.read_u32().map_err(|_| None)? as usize
        } else {
            0
        };

        let text = cursor
            .read_chars(cch, flags.contains(StringFlags::HIGH_BYTE))
            .map_err(|(partial, _)| Some(partial))?;
        cursor
            .skip(runs.saturating_mul(4).saturating_add(ext))
            .map_err(|_| Some(text.clone()))?;
        Ok(text)
    }

    pub fn get(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }
}
