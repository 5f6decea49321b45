//! BIFF record decoding for XLS workbook streams.
//!
//! A workbook stream is a flat sequence of records, each a 4-byte header
//! (`type: u16`, `length: u16`) followed by `length` payload bytes. Payloads
//! longer than [`MAX_RECORD_DATA`] are split across one or more immediately
//! following `CONTINUE` records; [`RecordIter`] merges them so callers see one
//! logical record, while still exposing the fragment boundaries for the few
//! parsers (the SST) that need them.

use std::borrow::Cow;

use smallvec::{SmallVec, smallvec};

use crate::common::binary::{self, BinaryError, BinaryResult};
use crate::common::{Error, Result};
use crate::ole::xls::cell::ErrorCode;
use crate::ole::xls::strings::TextDecoder;
use crate::ole::xls::utils;

/// Size of a record header
pub const RECORD_HEADER_SIZE: usize = 4;
/// Largest payload a single physical record carries in BIFF8
pub const MAX_RECORD_DATA: usize = 8224;

// Record types
pub const RECORD_FORMULA: u16 = 0x0006;
pub const RECORD_BOF_BIFF2: u16 = 0x0009;
pub const RECORD_EOF: u16 = 0x000A;
pub const RECORD_EXTERNSHEET: u16 = 0x0017;
pub const RECORD_NAME: u16 = 0x0018;
pub const RECORD_DATEMODE: u16 = 0x0022;
pub const RECORD_EXTERNNAME: u16 = 0x0023;
pub const RECORD_FILEPASS: u16 = 0x002F;
pub const RECORD_CONTINUE: u16 = 0x003C;
pub const RECORD_CODEPAGE: u16 = 0x0042;
pub const RECORD_BOUNDSHEET: u16 = 0x0085;
pub const RECORD_MULRK: u16 = 0x00BD;
pub const RECORD_MULBLANK: u16 = 0x00BE;
pub const RECORD_RSTRING: u16 = 0x00D6;
pub const RECORD_XF: u16 = 0x00E0;
pub const RECORD_SST: u16 = 0x00FC;
pub const RECORD_LABELSST: u16 = 0x00FD;
pub const RECORD_EXTSST: u16 = 0x00FF;
pub const RECORD_SUPBOOK: u16 = 0x01AE;
pub const RECORD_DIMENSION: u16 = 0x0200;
pub const RECORD_BLANK: u16 = 0x0201;
pub const RECORD_NUMBER: u16 = 0x0203;
pub const RECORD_LABEL: u16 = 0x0204;
pub const RECORD_BOOLERR: u16 = 0x0205;
pub const RECORD_STRING: u16 = 0x0207;
pub const RECORD_BOF_BIFF3: u16 = 0x0209;
pub const RECORD_ARRAY: u16 = 0x0221;
pub const RECORD_RK: u16 = 0x027E;
pub const RECORD_BOF_BIFF4: u16 = 0x0409;
pub const RECORD_FORMAT: u16 = 0x041E;
pub const RECORD_SHRFMLA: u16 = 0x04BC;
pub const RECORD_BOF: u16 = 0x0809;

/// Whether `record_type` is a BOF of any BIFF generation.
pub fn is_bof(record_type: u16) -> bool {
    matches!(
        record_type,
        RECORD_BOF | RECORD_BOF_BIFF2 | RECORD_BOF_BIFF3 | RECORD_BOF_BIFF4
    )
}

/// A logical BIFF record with `CONTINUE` fragments merged.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    /// Offset of the record header in the stream
    pub offset: usize,
    pub record_type: u16,
    data: Cow<'a, [u8]>,
    fragment_sizes: SmallVec<[usize; 2]>,
    truncated: bool,
}

impl<'a> Record<'a> {
    /// Merged payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload of each physical fragment, in order.
    pub fn fragments(&self) -> impl Iterator<Item = &[u8]> {
        let data: &[u8] = &self.data;
        self.fragment_sizes.iter().scan(0usize, move |start, &size| {
            let fragment = data.get(*start..start.saturating_add(size))?;
            *start += size;
            Some(fragment)
        })
    }

    pub fn is_continued(&self) -> bool {
        self.fragment_sizes.len() > 1
    }

    /// Whether the stream ended inside this record's payload.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Lazy sequence of logical records over an in-memory stream.
///
/// Stops cleanly (setting [`RecordIter::is_truncated`]) when the stream ends
/// inside a header or payload; the partially available final record is still
/// yielded. The only error is a `CONTINUE` record where a record must start,
/// which means the iteration began at a position that is not a record boundary.
#[derive(Debug, Clone)]
pub struct RecordIter<'a> {
    stream: &'a [u8],
    start: usize,
    pos: usize,
    truncated: bool,
    finished: bool,
}

impl<'a> RecordIter<'a> {
    pub fn new(stream: &'a [u8]) -> Self {
        Self::from_offset(stream, 0)
    }

    /// Start iterating at byte `offset`; an offset past the end yields nothing.
    pub fn from_offset(stream: &'a [u8], offset: usize) -> Self {
        RecordIter {
            stream,
            start: offset,
            pos: offset,
            truncated: false,
            finished: offset >= stream.len(),
        }
    }

    /// Offset of the next record header.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether the stream ended inside a record.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Type of the next record without consuming it.
    pub fn peek_type(&self) -> Option<u16> {
        if self.finished {
            return None;
        }
        binary::read_u16_le(self.stream, self.pos).ok()
    }

    /// Read the header at `pos`, or `None` if fewer than four bytes remain.
    fn header_at(&self, pos: usize) -> Option<(u16, usize)> {
        let header = binary::slice_at(self.stream, pos, RECORD_HEADER_SIZE).ok()?;
        Some((
            u16::from_le_bytes([header[0], header[1]]),
            u16::from_le_bytes([header[2], header[3]]) as usize,
        ))
    }

    /// Payload of the physical record at `pos` with declared length `len`,
    /// cut short at the end of the stream.
    fn payload_at(&mut self, pos: usize, record_type: u16, len: usize) -> &'a [u8] {
        if len > MAX_RECORD_DATA {
            log::debug!(
                "record 0x{:04X} at offset {} declares {} bytes, above the {} byte limit",
                record_type,
                pos,
                len,
                MAX_RECORD_DATA
            );
        }
        let start = pos + RECORD_HEADER_SIZE;
        let end = start + len;
        match self.stream.get(start..end) {
            Some(payload) => payload,
            None => {
                log::warn!(
                    "record 0x{:04X} at offset {} runs {} bytes past the end of the stream",
                    record_type,
                    pos,
                    end - self.stream.len()
                );
                self.truncated = true;
                self.stream.get(start..).unwrap_or_default()
            },
        }
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Result<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.pos >= self.stream.len() {
            self.finished = true;
            return None;
        }

        let offset = self.pos;
        let Some((record_type, len)) = self.header_at(offset) else {
            log::warn!("stream ends inside a record header at offset {}", offset);
            self.truncated = true;
            self.finished = true;
            return None;
        };

        if record_type == RECORD_CONTINUE {
            self.finished = true;
            return Some(Err(Error::CorruptRecord {
                record_type,
                offset,
                message: if offset == self.start {
                    "iteration starts on a CONTINUE record".to_string()
                } else {
                    "CONTINUE record without a preceding record".to_string()
                },
            }));
        }

        let first = self.payload_at(offset, record_type, len);
        self.pos = offset + RECORD_HEADER_SIZE + first.len();
        if self.truncated {
            self.finished = true;
            return Some(Ok(Record {
                offset,
                record_type,
                data: Cow::Borrowed(first),
                fragment_sizes: smallvec![first.len()],
                truncated: true,
            }));
        }

        let mut data = Cow::Borrowed(first);
        let mut fragment_sizes: SmallVec<[usize; 2]> = smallvec![first.len()];
        while let Some((RECORD_CONTINUE, continue_len)) = self.header_at(self.pos) {
            let fragment = self.payload_at(self.pos, RECORD_CONTINUE, continue_len);
            log::trace!(
                "merging {}-byte CONTINUE into record 0x{:04X} at offset {}",
                fragment.len(),
                record_type,
                offset
            );
            data.to_mut().extend_from_slice(fragment);
            fragment_sizes.push(fragment.len());
            self.pos += RECORD_HEADER_SIZE + fragment.len();
            if self.truncated {
                self.finished = true;
                break;
            }
        }

        Some(Ok(Record {
            offset,
            record_type,
            data,
            fragment_sizes,
            truncated: self.truncated,
        }))
    }
}

/// Records of one substream: everything from its BOF up to (not including)
/// its EOF, or up to the next BOF when the EOF is missing.
#[derive(Debug, Clone)]
pub struct Substream<'a> {
    iter: RecordIter<'a>,
    started: bool,
    saw_eof: bool,
    done: bool,
}

impl<'a> Substream<'a> {
    pub fn new(iter: RecordIter<'a>) -> Self {
        Substream {
            iter,
            started: false,
            saw_eof: false,
            done: false,
        }
    }

    /// Whether the underlying stream ended inside a record.
    pub fn is_truncated(&self) -> bool {
        self.iter.is_truncated()
    }

    /// Whether the substream ended without its EOF record.
    pub fn missing_eof(&self) -> bool {
        self.done && !self.saw_eof
    }
}

impl<'a> Iterator for Substream<'a> {
    type Item = Result<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.started && self.iter.peek_type().is_some_and(is_bof) {
            log::debug!("substream ends at a BOF without EOF (offset {})", self.iter.position());
            self.done = true;
            return None;
        }
        self.started = true;

        match self.iter.next() {
            Some(Ok(record)) if record.record_type == RECORD_EOF => {
                self.saw_eof = true;
                self.done = true;
                None
            },
            Some(item) => Some(item),
            None => {
                self.done = true;
                None
            },
        }
    }
}

/// BIFF generation of a substream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub enum BiffVersion {
    /// BIFF5 and BIFF7 (Excel 5.0 to 95), byte strings in the workbook codepage
    Biff5,
    /// BIFF8 (Excel 97 to 2003), UTF-16 strings and the shared string table
    Biff8,
}

impl BiffVersion {
    /// Largest number of rows a sheet of this version can address.
    pub fn max_rows(self) -> u32 {
        match self {
            BiffVersion::Biff5 => 16_384,
            BiffVersion::Biff8 => 65_536,
        }
    }

    /// Largest number of columns a sheet of this version can address.
    pub fn max_cols(self) -> u16 {
        256
    }

    pub fn supports_unicode(self) -> bool {
        matches!(self, BiffVersion::Biff8)
    }
}

/// Substream type declared by a BOF record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SubstreamKind {
    Globals,
    VbModule,
    Worksheet,
    Chart,
    MacroSheet,
    Workspace,
    Other(u16),
}

impl From<u16> for SubstreamKind {
    fn from(value: u16) -> Self {
        match value {
            0x0005 => SubstreamKind::Globals,
            0x0006 => SubstreamKind::VbModule,
            0x0010 => SubstreamKind::Worksheet,
            0x0020 => SubstreamKind::Chart,
            0x0040 => SubstreamKind::MacroSheet,
            0x0100 => SubstreamKind::Workspace,
            other => SubstreamKind::Other(other),
        }
    }
}

/// BOF (Beginning of File) record
#[derive(Debug, Clone, Copy)]
pub struct BofRecord {
    pub version: BiffVersion,
    pub kind: SubstreamKind,
}

impl BofRecord {
    /// Decode a BOF.
    ///
    /// BIFF2 to BIFF4 BOFs are `UnsupportedFormat`. A BIFF5+ BOF carrying a
    /// version number we do not recognise falls back to `fallback`, which the
    /// caller derives from the stream name.
    pub fn parse(record: &Record<'_>, fallback: BiffVersion) -> Result<Self> {
        let data = record.data();
        match record.record_type {
            RECORD_BOF => {},
            RECORD_BOF_BIFF2 | RECORD_BOF_BIFF3 | RECORD_BOF_BIFF4 => {
                return Err(Error::unsupported(format!(
                    "BIFF{} workbooks are not supported",
                    match record.record_type {
                        RECORD_BOF_BIFF2 => 2,
                        RECORD_BOF_BIFF3 => 3,
                        _ => 4,
                    }
                )));
            },
            other => {
                return Err(Error::CorruptRecord {
                    record_type: other,
                    offset: record.offset,
                    message: "expected a BOF record".to_string(),
                });
            },
        }

        let (raw_version, raw_kind) = match (binary::read_u16_le(data, 0), binary::read_u16_le(data, 2)) {
            (Ok(v), Ok(k)) => (v, k),
            _ => {
                return Err(Error::CorruptRecord {
                    record_type: RECORD_BOF,
                    offset: record.offset,
                    message: format!("BOF payload of {} bytes is too short", data.len()),
                });
            },
        };

        let version = match raw_version {
            0x0600 => BiffVersion::Biff8,
            0x0500 => BiffVersion::Biff5,
            other => {
                log::warn!(
                    "unrecognised BOF version 0x{:04X}; assuming {:?}",
                    other,
                    fallback
                );
                fallback
            },
        };

        Ok(BofRecord {
            version,
            kind: SubstreamKind::from(raw_kind),
        })
    }
}

/// Sheet visibility types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum SheetVisibility {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

impl SheetVisibility {
    pub fn from_u8(value: u8) -> Self {
        match value & 0x03 {
            0x01 => SheetVisibility::Hidden,
            0x02 => SheetVisibility::VeryHidden,
            // 0x03 is undefined; Excel shows such sheets
            _ => SheetVisibility::Visible,
        }
    }
}

/// Sheet types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SheetKind {
    Worksheet,
    MacroSheet,
    Chart,
    VbModule,
    Unknown(u8),
}

impl SheetKind {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => SheetKind::Worksheet,
            0x01 => SheetKind::MacroSheet,
            0x02 => SheetKind::Chart,
            0x06 => SheetKind::VbModule,
            other => SheetKind::Unknown(other),
        }
    }

    /// Whether sheets of this kind carry a cell grid worth decoding.
    pub fn has_cells(self) -> bool {
        matches!(self, SheetKind::Worksheet | SheetKind::MacroSheet)
    }
}

/// BOUNDSHEET record (sheet name, kind and substream position)
#[derive(Debug, Clone)]
pub struct BoundSheetRecord {
    /// Offset of the sheet's BOF in the workbook stream
    pub position: u32,
    pub visibility: SheetVisibility,
    pub kind: SheetKind,
    pub name: String,
}

impl BoundSheetRecord {
    pub fn parse(data: &[u8], text: &TextDecoder) -> BinaryResult<Self> {
        let position = binary::read_u32_le(data, 0)?;
        let visibility = SheetVisibility::from_u8(binary::read_u8(data, 4)?);
        let kind = SheetKind::from_u8(binary::read_u8(data, 5)?);
        let (name, _) = text.read_u8_string(binary::slice_at(data, 6, data.len().saturating_sub(6))?)?;

        Ok(BoundSheetRecord {
            position,
            visibility,
            kind,
            name,
        })
    }
}

/// DIMENSION record: the used range the writer claims, half-open at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Dimensions {
    pub first_row: u32,
    /// One past the last used row
    pub last_row: u32,
    pub first_col: u16,
    /// One past the last used column
    pub last_col: u16,
}

impl Dimensions {
    pub fn parse(data: &[u8], version: BiffVersion) -> BinaryResult<Self> {
        match version {
            BiffVersion::Biff8 => Ok(Dimensions {
                first_row: binary::read_u32_le(data, 0)?,
                last_row: binary::read_u32_le(data, 4)?,
                first_col: binary::read_u16_le(data, 8)?,
                last_col: binary::read_u16_le(data, 10)?,
            }),
            BiffVersion::Biff5 => Ok(Dimensions {
                first_row: u32::from(binary::read_u16_le(data, 0)?),
                last_row: u32::from(binary::read_u16_le(data, 2)?),
                first_col: binary::read_u16_le(data, 4)?,
                last_col: binary::read_u16_le(data, 6)?,
            }),
        }
    }
}

/// Cached result stored in a FORMULA record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CachedResult {
    Number(f64),
    Bool(bool),
    Error(ErrorCode),
    EmptyString,
    /// The string result follows in a STRING record
    StringFollows,
}

/// Value stored in a BOOLERR record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolErrValue {
    Bool(bool),
    Error(ErrorCode),
}

/// Cell records
#[derive(Debug, Clone, PartialEq)]
pub enum CellRecord {
    Blank {
        row: u16,
        col: u16,
        xf_index: u16,
    },
    MulBlank {
        row: u16,
        first_col: u16,
        xf_indices: Vec<u16>,
    },
    Number {
        row: u16,
        col: u16,
        xf_index: u16,
        value: f64,
    },
    Rk {
        row: u16,
        col: u16,
        xf_index: u16,
        value: f64,
    },
    MulRk {
        row: u16,
        first_col: u16,
        /// (xf_index, value) per column
        cells: Vec<(u16, f64)>,
    },
    LabelSst {
        row: u16,
        col: u16,
        xf_index: u16,
        sst_index: u32,
    },
    Label {
        row: u16,
        col: u16,
        xf_index: u16,
        value: String,
    },
    BoolErr {
        row: u16,
        col: u16,
        xf_index: u16,
        value: BoolErrValue,
    },
    Formula {
        row: u16,
        col: u16,
        xf_index: u16,
        result: CachedResult,
        tokens: Vec<u8>,
    },
}

impl CellRecord {
    /// Whether `record_type` is decoded by [`CellRecord::parse`].
    pub fn is_cell_record(record_type: u16) -> bool {
        matches!(
            record_type,
            RECORD_BLANK
                | RECORD_MULBLANK
                | RECORD_NUMBER
                | RECORD_RK
                | RECORD_MULRK
                | RECORD_LABELSST
                | RECORD_LABEL
                | RECORD_RSTRING
                | RECORD_BOOLERR
                | RECORD_FORMULA
        )
    }

    pub fn parse(record_type: u16, data: &[u8], text: &TextDecoder) -> BinaryResult<Self> {
        match record_type {
            RECORD_BLANK => Self::parse_blank(data),
            RECORD_MULBLANK => Self::parse_mul_blank(data),
            RECORD_NUMBER => Self::parse_number(data),
            RECORD_RK => Self::parse_rk(data),
            RECORD_MULRK => Self::parse_mul_rk(data),
            RECORD_LABELSST => Self::parse_label_sst(data),
            RECORD_LABEL | RECORD_RSTRING => Self::parse_label(data, text),
            RECORD_BOOLERR => Self::parse_bool_err(data),
            RECORD_FORMULA => Self::parse_formula(data),
            _ => Err(BinaryError::InsufficientData {
                expected: 0,
                available: data.len(),
            }),
        }
    }

    fn cell_header(data: &[u8]) -> BinaryResult<(u16, u16, u16)> {
        Ok((
            binary::read_u16_le(data, 0)?,
            binary::read_u16_le(data, 2)?,
            binary::read_u16_le(data, 4)?,
        ))
    }

    fn parse_blank(data: &[u8]) -> BinaryResult<Self> {
        let (row, col, xf_index) = Self::cell_header(data)?;
        Ok(CellRecord::Blank { row, col, xf_index })
    }

    fn parse_mul_blank(data: &[u8]) -> BinaryResult<Self> {
        // row, first_col, xf[n], last_col
        let row = binary::read_u16_le(data, 0)?;
        let first_col = binary::read_u16_le(data, 2)?;
        let body = binary::slice_at(data, 4, data.len().saturating_sub(6))?;
        let xf_indices = body
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        Ok(CellRecord::MulBlank {
            row,
            first_col,
            xf_indices,
        })
    }

    fn parse_number(data: &[u8]) -> BinaryResult<Self> {
        let (row, col, xf_index) = Self::cell_header(data)?;
        Ok(CellRecord::Number {
            row,
            col,
            xf_index,
            value: binary::read_f64_le(data, 6)?,
        })
    }

    fn parse_rk(data: &[u8]) -> BinaryResult<Self> {
        let (row, col, xf_index) = Self::cell_header(data)?;
        Ok(CellRecord::Rk {
            row,
            col,
            xf_index,
            value: utils::rk_to_f64(binary::read_u32_le(data, 6)?),
        })
    }

    fn parse_mul_rk(data: &[u8]) -> BinaryResult<Self> {
        // row, first_col, (xf, rk)[n], last_col
        let row = binary::read_u16_le(data, 0)?;
        let first_col = binary::read_u16_le(data, 2)?;
        let body = binary::slice_at(data, 4, data.len().saturating_sub(6))?;
        let cells = body
            .chunks_exact(6)
            .map(|c| {
                let xf = u16::from_le_bytes([c[0], c[1]]);
                let rk = u32::from_le_bytes([c[2], c[3], c[4], c[5]]);
                (xf, utils::rk_to_f64(rk))
            })
            .collect();
        Ok(CellRecord::MulRk {
            row,
            first_col,
            cells,
        })
    }

    fn parse_label_sst(data: &[u8]) -> BinaryResult<Self> {
        let (row, col, xf_index) = Self::cell_header(data)?;
        Ok(CellRecord::LabelSst {
            row,
            col,
            xf_index,
            sst_index: binary::read_u32_le(data, 6)?,
        })
    }

    fn parse_label(data: &[u8], text: &TextDecoder) -> BinaryResult<Self> {
        let (row, col, xf_index) = Self::cell_header(data)?;
        let (value, _) = text.read_u16_string(binary::slice_at(data, 6, data.len().saturating_sub(6))?)?;
        Ok(CellRecord::Label {
            row,
            col,
            xf_index,
            value,
        })
    }

    fn parse_bool_err(data: &[u8]) -> BinaryResult<Self> {
        let (row, col, xf_index) = Self::cell_header(data)?;
        let raw = binary::read_u8(data, 6)?;
        let value = if binary::read_u8(data, 7)? == 0 {
            BoolErrValue::Bool(raw != 0)
        } else {
            BoolErrValue::Error(ErrorCode::from_u8(raw))
        };
        Ok(CellRecord::BoolErr {
            row,
            col,
            xf_index,
            value,
        })
    }

    fn parse_formula(data: &[u8]) -> BinaryResult<Self> {
        let (row, col, xf_index) = Self::cell_header(data)?;
        let result_bytes = binary::slice_at(data, 6, 8)?;
        let result = if result_bytes[6] == 0xFF && result_bytes[7] == 0xFF {
            match result_bytes[0] {
                0x00 => CachedResult::StringFollows,
                0x01 => CachedResult::Bool(result_bytes[2] != 0),
                0x02 => CachedResult::Error(ErrorCode::from_u8(result_bytes[2])),
                0x03 => CachedResult::EmptyString,
                other => {
                    log::debug!("unknown formula result type 0x{:02X}", other);
                    CachedResult::EmptyString
                },
            }
        } else {
            CachedResult::Number(binary::read_f64_le(result_bytes, 0)?)
        };

        // flags (2) and chn (4) precede the expression length
        let tokens = match binary::read_u16_le(data, 20) {
            Ok(cce) => {
                let available = data.len().saturating_sub(22);
                let cce = usize::from(cce);
                if cce > available {
                    log::debug!("formula expression cut short: {} of {} bytes", available, cce);
                }
                binary::slice_at(data, 22, cce.min(available))?.to_vec()
            },
            Err(_) => Vec::new(),
        };

        Ok(CellRecord::Formula {
            row,
            col,
            xf_index,
            result,
            tokens,
        })
    }

    /// Row shared by every cell of the record.
    pub fn row(&self) -> u16 {
        match self {
            CellRecord::Blank { row, .. }
            | CellRecord::MulBlank { row, .. }
            | CellRecord::Number { row, .. }
            | CellRecord::Rk { row, .. }
            | CellRecord::MulRk { row, .. }
            | CellRecord::LabelSst { row, .. }
            | CellRecord::Label { row, .. }
            | CellRecord::BoolErr { row, .. }
            | CellRecord::Formula { row, .. } => *row,
        }
    }
}

#[cfg(test)]
pub(crate) fn raw_record(record_type: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(RECORD_HEADER_SIZE + payload.len());
    out.extend_from_slice(&record_type.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn collect(stream: &[u8]) -> Vec<(u16, Vec<u8>, usize)> {
        RecordIter::new(stream)
            .map(|r| {
                let r = r.unwrap();
                (r.record_type, r.data().to_vec(), r.fragments().count())
            })
            .collect()
    }

    #[test]
    fn test_plain_records() {
        let stream = [raw_record(0x0001, &[1, 2]), raw_record(0x0002, &[])].concat();
        let records = collect(&stream);
        assert_eq!(records, vec![(1, vec![1, 2], 1), (2, vec![], 1)]);
    }

    #[test]
    fn test_merges_continue_at_fragment_limit() {
        let first = vec![0xAB; MAX_RECORD_DATA];
        let stream = [
            raw_record(RECORD_SST, &first),
            raw_record(RECORD_CONTINUE, &[1, 2, 3]),
            raw_record(RECORD_EOF, &[]),
        ]
        .concat();
        let mut iter = RecordIter::new(&stream);
        let sst = iter.next().unwrap().unwrap();
        assert_eq!(sst.data().len(), MAX_RECORD_DATA + 3);
        assert!(sst.is_continued());
        let sizes: Vec<usize> = sst.fragments().map(<[u8]>::len).collect();
        assert_eq!(sizes, vec![MAX_RECORD_DATA, 3]);
        assert_eq!(iter.next().unwrap().unwrap().record_type, RECORD_EOF);
        assert!(iter.next().is_none());
        assert!(!iter.is_truncated());
    }

    #[test]
    fn test_merges_payloads_of_8225_and_16448_bytes() {
        for total in [MAX_RECORD_DATA + 1, 2 * MAX_RECORD_DATA] {
            let payload: Vec<u8> = (0..total).map(|i| (i % 253) as u8).collect();
            let mut stream = raw_record(RECORD_SST, &payload[..MAX_RECORD_DATA]);
            stream.extend(raw_record(RECORD_CONTINUE, &payload[MAX_RECORD_DATA..]));
            let records: Vec<_> = RecordIter::new(&stream).collect::<Result<_>>().unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].data(), &payload[..]);
        }
    }

    #[test]
    fn test_merges_continue_after_short_record() {
        let stream = [
            raw_record(RECORD_SST, &[1, 2]),
            raw_record(RECORD_CONTINUE, &[3]),
            raw_record(RECORD_CONTINUE, &[4, 5]),
        ]
        .concat();
        assert_eq!(collect(&stream), vec![(RECORD_SST, vec![1, 2, 3, 4, 5], 3)]);
    }

    #[test]
    fn test_orphan_continue_is_corrupt() {
        let stream = [raw_record(RECORD_CONTINUE, &[1]), raw_record(RECORD_EOF, &[])].concat();
        let mut iter = RecordIter::new(&stream);
        assert!(matches!(
            iter.next(),
            Some(Err(Error::CorruptRecord {
                record_type: RECORD_CONTINUE,
                offset: 0,
                ..
            }))
        ));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_truncated_payload_is_yielded_and_flagged() {
        let mut stream = raw_record(RECORD_NUMBER, &[0u8; 14]);
        stream.truncate(10);
        let mut iter = RecordIter::new(&stream);
        let record = iter.next().unwrap().unwrap();
        assert_eq!(record.data().len(), 6);
        assert!(record.is_truncated());
        assert!(iter.next().is_none());
        assert!(iter.is_truncated());
    }

    #[test]
    fn test_truncated_header_ends_iteration() {
        let mut stream = raw_record(RECORD_EOF, &[]);
        stream.extend_from_slice(&[0x09, 0x08]);
        let mut iter = RecordIter::new(&stream);
        assert_eq!(iter.next().unwrap().unwrap().record_type, RECORD_EOF);
        assert!(iter.next().is_none());
        assert!(iter.is_truncated());
    }

    #[test]
    fn test_substream_stops_at_eof_or_next_bof() {
        let bof = [0x00, 0x06, 0x10, 0x00];
        let stream = [
            raw_record(RECORD_BOF, &bof),
            raw_record(RECORD_NUMBER, &[0u8; 14]),
            // missing EOF
            raw_record(RECORD_BOF, &bof),
            raw_record(RECORD_BLANK, &[0u8; 6]),
            raw_record(RECORD_EOF, &[]),
            raw_record(RECORD_LABEL, &[0u8; 9]),
        ]
        .concat();

        let first: Vec<u16> = Substream::new(RecordIter::new(&stream))
            .map(|r| r.unwrap().record_type)
            .collect();
        assert_eq!(first, vec![RECORD_BOF, RECORD_NUMBER]);

        let mut substream = Substream::new(RecordIter::new(&stream));
        substream.by_ref().for_each(drop);
        assert!(substream.missing_eof());

        let second: Vec<u16> = Substream::new(RecordIter::from_offset(&stream, 4 + 4 + 4 + 14))
            .map(|r| r.unwrap().record_type)
            .collect();
        assert_eq!(second, vec![RECORD_BOF, RECORD_BLANK]);
    }

    #[test]
    fn test_bof_versions() {
        let record = |record_type: u16, payload: &[u8]| Record {
            offset: 0,
            record_type,
            data: Cow::Owned(payload.to_vec()),
            fragment_sizes: smallvec![payload.len()],
            truncated: false,
        };

        let bof = BofRecord::parse(&record(RECORD_BOF, &[0x00, 0x06, 0x05, 0x00]), BiffVersion::Biff5).unwrap();
        assert_eq!(bof.version, BiffVersion::Biff8);
        assert_eq!(bof.kind, SubstreamKind::Globals);

        let bof = BofRecord::parse(&record(RECORD_BOF, &[0x00, 0x00, 0x10, 0x00]), BiffVersion::Biff5).unwrap();
        assert_eq!(bof.version, BiffVersion::Biff5);
        assert_eq!(bof.kind, SubstreamKind::Worksheet);

        assert!(matches!(
            BofRecord::parse(&record(RECORD_BOF_BIFF4, &[0x00, 0x00, 0x10, 0x00]), BiffVersion::Biff8),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            BofRecord::parse(&record(RECORD_BOF, &[0x00]), BiffVersion::Biff8),
            Err(Error::CorruptRecord { .. })
        ));
    }

    #[test]
    fn test_formula_cached_results() {
        let mut data = vec![0u8; 22];
        data[0] = 3; // row
        data[2] = 1; // col
        data[6..14].copy_from_slice(&2.5f64.to_le_bytes());
        let parsed = CellRecord::parse(RECORD_FORMULA, &data, &TextDecoder::default()).unwrap();
        assert!(matches!(
            parsed,
            CellRecord::Formula {
                row: 3,
                col: 1,
                result: CachedResult::Number(v),
                ..
            } if v == 2.5
        ));

        data[6..14].copy_from_slice(&[0x02, 0, 0x07, 0, 0, 0, 0xFF, 0xFF]);
        data.extend_from_slice(&[0x1E, 0x01, 0x00]);
        data[20] = 3; // cce
        let parsed = CellRecord::parse(RECORD_FORMULA, &data, &TextDecoder::default()).unwrap();
        match parsed {
            CellRecord::Formula { result, tokens, .. } => {
                assert_eq!(result, CachedResult::Error(ErrorCode::Div0));
                assert_eq!(tokens, vec![0x1E, 0x01, 0x00]);
            },
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_mul_rk_cells() {
        let mut data = vec![];
        data.extend_from_slice(&5u16.to_le_bytes()); // row
        data.extend_from_slice(&2u16.to_le_bytes()); // first col
        for (xf, value) in [(15u16, 1i32), (16, -3)] {
            data.extend_from_slice(&xf.to_le_bytes());
            data.extend_from_slice(&(((value << 2) as u32) | 0x02 | 0x01).to_le_bytes());
        }
        data.extend_from_slice(&3u16.to_le_bytes()); // last col
        let parsed = CellRecord::parse(RECORD_MULRK, &data, &TextDecoder::default()).unwrap();
        assert_eq!(
            parsed,
            CellRecord::MulRk {
                row: 5,
                first_col: 2,
                cells: vec![(15, 0.01), (16, -0.03)],
            }
        );
    }

    #[test]
    fn test_short_cell_record_is_an_error() {
        assert!(CellRecord::parse(RECORD_NUMBER, &[0u8; 10], &TextDecoder::default()).is_err());
        assert!(CellRecord::parse(RECORD_LABELSST, &[0u8; 6], &TextDecoder::default()).is_err());
    }

    proptest! {
        #[test]
        fn prop_truncated_streams_never_panic(cut in 0usize..200, seed in any::<u8>()) {
            let payload: Vec<u8> = (0..60u8).map(|b| b ^ seed).collect();
            let stream = [
                raw_record(RECORD_BOF, &[0x00, 0x06, 0x10, 0x00]),
                raw_record(RECORD_SST, &payload),
                raw_record(RECORD_CONTINUE, &payload),
                raw_record(RECORD_NUMBER, &payload[..14]),
                raw_record(RECORD_EOF, &[]),
            ]
            .concat();
            let cut = cut.min(stream.len());
            let mut seen = 0usize;
            for record in RecordIter::new(&stream[..cut]) {
                let record = record.unwrap();
                seen += RECORD_HEADER_SIZE + record.data().len();
            }
            prop_assert!(seen <= cut + RECORD_HEADER_SIZE * 2);
        }

        #[test]
        fn prop_arbitrary_bytes_terminate(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let count = RecordIter::new(&bytes).count();
            prop_assert!(count <= bytes.len() / RECORD_HEADER_SIZE + 1);
        }
    }
}
