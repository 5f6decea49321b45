//! Workbook implementation for XLS files
//!
//! Decoding runs in two passes over the workbook stream. The globals substream
//! establishes the BIFF version, codepage, shared strings, formats and the
//! sheet list; each sheet substream is then located through its BOUNDSHEET
//! offset and decoded into its own grid.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::common::binary;
use crate::common::{Error, Result};
use crate::ole::CompoundFile;
use crate::ole::codepage::Codepage;
use crate::ole::xls::cell::{Cell, CellText, CellValue, FormulaResult, SstIndex};
use crate::ole::xls::format::{FormatTable, XfEntry};
use crate::ole::xls::formula::{self, DefinedName, ExternSheet, FormulaContext, FormulaError, SharedFormula, SupBook};
use crate::ole::xls::options::ParseOptions;
use crate::ole::xls::records::*;
use crate::ole::xls::strings::{SharedStringTable, TextDecoder};
use crate::ole::xls::warning::Warning;
use crate::ole::xls::utils;
use crate::ole::xls::worksheet::Sheet;

/// A decoded workbook: sheets, shared strings, formats and diagnostics.
///
/// # Examples
///
/// ```no_run
/// use xls_salvage::{CellValue, parse_workbook};
///
/// let data = std::fs::read("report.xls")?;
/// let workbook = parse_workbook(&data)?;
/// if workbook.is_truncated() {
///     eprintln!("partial workbook: {} warnings", workbook.warnings().len());
/// }
/// for sheet in workbook.sheets() {
///     for cell in sheet.cells() {
///         if let CellValue::Text(text) = &cell.value {
///             println!("{}: {:?}", cell.coordinate(), workbook.resolve_text(text));
///         }
///     }
/// }
/// # Ok::<(), xls_salvage::Error>(())
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Workbook {
    version: BiffVersion,
    codepage: u16,
    date_1904: bool,
    sheets: Vec<Sheet>,
    shared_strings: SharedStringTable,
    formats: FormatTable,
    formulas: FormulaContext,
    warnings: Vec<Warning>,
    suppressed_warnings: usize,
    truncated: bool,
}

impl Workbook {
    /// Decode a workbook from the bytes of a compound file.
    pub fn parse(data: &[u8], options: &ParseOptions) -> Result<Self> {
        let cfb = CompoundFile::parse(data)?.tolerate_overlap(options.ignore_workbook_corruption);

        // BIFF8 writes "Workbook"; BIFF5/7 writes "Book".
        let (entry, fallback) = match cfb.directory().find("Workbook").filter(|e| e.is_stream()) {
            Some(entry) => (entry, BiffVersion::Biff8),
            None => match cfb.directory().find("Book").filter(|e| e.is_stream()) {
                Some(entry) => (entry, BiffVersion::Biff5),
                None => {
                    return Err(Error::corrupt_container(
                        "no Workbook or Book stream in the compound file",
                    ));
                },
            },
        };
        log::debug!("decoding '{}' stream ({} bytes declared)", entry.path, entry.size);

        let stream = cfb.materialize(entry)?;
        let mut builder = Builder::new(options);
        for overlap in stream.overlaps() {
            builder.warn(Warning::SectorOverlap {
                sector: overlap.sector,
                owner: overlap.owner,
            });
        }
        if stream.is_truncated() {
            builder.truncated = true;
            builder.warn(Warning::Truncated {
                sheet: None,
                detail: format!(
                    "workbook stream holds {} of {} declared bytes",
                    stream.len(),
                    stream.declared_size()
                ),
            });
        }

        builder.build(stream.data(), fallback)
    }

    /// Decode a bare BIFF record stream, as stored inside the container.
    ///
    /// `fallback` is used when the globals BOF carries an unknown version.
    pub fn from_biff_stream(stream: &[u8], fallback: BiffVersion, options: &ParseOptions) -> Result<Self> {
        Builder::new(options).build(stream, fallback)
    }

    pub fn version(&self) -> BiffVersion {
        self.version
    }

    /// Codepage declared by the CODEPAGE record (1252 when absent)
    pub fn codepage(&self) -> u16 {
        self.codepage
    }

    /// Whether serial dates count from 1904 rather than 1900
    pub fn is_1904(&self) -> bool {
        self.date_1904
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    pub fn shared_strings(&self) -> &SharedStringTable {
        &self.shared_strings
    }

    pub fn formats(&self) -> &FormatTable {
        &self.formats
    }

    /// Text of a cell, following shared-string references.
    ///
    /// `None` for a reference past the end of the shared string table.
    pub fn resolve_text<'s>(&'s self, text: &'s CellText) -> Option<&'s str> {
        match text {
            CellText::Inline(s) => Some(s),
            CellText::Shared(SstIndex(index)) => self.shared_strings.get(*index),
        }
    }

    /// Number format code applied to a cell through its XF index.
    pub fn number_format(&self, xf_index: u16) -> Option<&str> {
        self.formats.number_format(xf_index)
    }

    /// Defined names in NAME record order
    pub fn defined_names(&self) -> &[DefinedName] {
        self.formulas.names()
    }

    /// Names, external sheets and sheet names used to render formulas
    pub fn formula_context(&self) -> &FormulaContext {
        &self.formulas
    }

    /// Formula text of a defined name, without the leading `=`.
    pub fn name_formula(&self, name: &DefinedName) -> std::result::Result<String, FormulaError> {
        self.formulas.decompile(name.tokens(), 0, 0)
    }

    /// Decompile the formula of a cell.
    ///
    /// `None` when the cell has no formula tokens. Cells that belong to a
    /// shared or array formula are rendered from the sheet's definition.
    pub fn decompile_formula(
        &self,
        sheet: &Sheet,
        row: u32,
        col: u16,
    ) -> Option<std::result::Result<String, FormulaError>> {
        let tokens = sheet.formula_tokens(row, col)?;
        Some(
            self.formulas
                .decompile_cell(tokens, row, col, |anchor_row, anchor_col| {
                    sheet.shared_formula(anchor_row, anchor_col)
                }),
        )
    }

    /// Formula text of a cell without the leading `=`; formulas that cannot
    /// be rendered are logged and skipped.
    pub fn formula_text(&self, sheet: &Sheet, row: u32, col: u16) -> Option<String> {
        match self.decompile_formula(sheet, row, col)? {
            Ok(text) => Some(text),
            Err(e) => {
                log::debug!("sheet '{}' {}: {}", sheet.name(), utils::cell_reference(row, u32::from(col)), e);
                None
            },
        }
    }

    /// Text of every formula on a sheet that renders, by position.
    pub fn formula_map(&self, sheet: &Sheet) -> BTreeMap<(u32, u16), String> {
        sheet
            .formula_positions()
            .filter_map(|(row, col)| Some(((row, col), self.formula_text(sheet, row, col)?)))
            .collect()
    }

    /// Recorded warnings, at most `ParseOptions::max_warnings` of them
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Warnings that were counted but not stored
    pub fn suppressed_warnings(&self) -> usize {
        self.suppressed_warnings
    }

    /// Whether any part of the workbook was cut short.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Per-parse decoding state.
struct Builder<'o> {
    options: &'o ParseOptions,
    warnings: Vec<Warning>,
    suppressed: usize,
    truncated: bool,
}

/// Settings fixed by the globals substream.
struct Globals {
    version: BiffVersion,
    text: TextDecoder,
    date_1904: bool,
    shared_strings: SharedStringTable,
    formats: FormatTable,
    formulas: FormulaContext,
    bound_sheets: Vec<BoundSheetRecord>,
}

impl<'o> Builder<'o> {
    fn new(options: &'o ParseOptions) -> Self {
        Builder {
            options,
            warnings: Vec::new(),
            suppressed: 0,
            truncated: false,
        }
    }

    fn warn(&mut self, warning: Warning) {
        log::warn!("{}", warning);
        if self.warnings.len() < self.options.max_warnings {
            self.warnings.push(warning);
        } else {
            self.suppressed += 1;
        }
    }

    fn build(mut self, stream: &[u8], fallback: BiffVersion) -> Result<Workbook> {
        let mut globals = self.parse_globals(stream, fallback)?;
        globals.formulas.set_sheet_names(globals.bound_sheets.iter().map(|b| b.name.clone()).collect());

        let mut sheets: Vec<Sheet> = Vec::with_capacity(globals.bound_sheets.len());
        // Offset -> index of the sheet that decoded it.
        let mut decoded: HashMap<u32, usize> = HashMap::new();
        for (index, bound) in globals.bound_sheets.iter().enumerate() {
            let mut sheet = Sheet::new(
                bound.name.clone(),
                index,
                bound.kind,
                bound.visibility,
                bound.position,
            );
            if let Some(&first) = decoded.get(&bound.position) {
                self.warn(Warning::DuplicateSheetOffset {
                    sheet: bound.name.clone(),
                    offset: bound.position,
                    first: sheets[first].name().to_string(),
                });
                sheets.push(sheet);
                continue;
            }
            decoded.insert(bound.position, index);
            self.parse_sheet(stream, bound, &globals, &mut sheet);
            if sheet.is_truncated() {
                self.truncated = true;
            }
            sheets.push(sheet);
        }

        if self.suppressed > 0 {
            log::warn!("{} further warnings were not recorded", self.suppressed);
        }

        Ok(Workbook {
            version: globals.version,
            codepage: globals.text.codepage().id(),
            date_1904: globals.date_1904,
            sheets,
            shared_strings: globals.shared_strings,
            formats: globals.formats,
            formulas: globals.formulas,
            warnings: self.warnings,
            suppressed_warnings: self.suppressed,
            truncated: self.truncated,
        })
    }

    fn parse_globals(&mut self, stream: &[u8], fallback: BiffVersion) -> Result<Globals> {
        let mut records = Substream::new(RecordIter::new(stream));
        let first = records.next().transpose()?.ok_or_else(|| Error::CorruptRecord {
            record_type: 0,
            offset: 0,
            message: "workbook stream holds no records".to_string(),
        })?;
        let bof = BofRecord::parse(&first, fallback)?;
        if bof.kind != SubstreamKind::Globals {
            return Err(Error::unsupported(format!(
                "workbook stream starts with a {:?} substream instead of the globals",
                bof.kind
            )));
        }
        log::debug!("BIFF version {:?}", bof.version);

        let text = TextDecoder::new(bof.version, Codepage::default());
        let mut globals = Globals {
            version: bof.version,
            text,
            date_1904: false,
            shared_strings: SharedStringTable::default(),
            formats: FormatTable::new(),
            formulas: FormulaContext::new(text),
            bound_sheets: Vec::new(),
        };

        for record in records.by_ref() {
            let record = record?;
            let data = record.data();
            let decoded = match record.record_type {
                RECORD_FILEPASS => return Err(Error::unsupported("workbook is encrypted")),
                RECORD_CODEPAGE => match binary::read_u16_le(data, 0) {
                    Ok(id) => {
                        globals.text = Self::select_codepage(id, globals.version)?;
                        globals.formulas.set_text(globals.text);
                        Ok(())
                    },
                    Err(e) => Err(e),
                },
                RECORD_DATEMODE => binary::read_u16_le(data, 0).map(|flag| {
                    globals.date_1904 = flag == 1;
                }),
                RECORD_SST => {
                    globals.shared_strings = SharedStringTable::parse(&record);
                    if globals.shared_strings.truncated {
                        self.truncated = true;
                        self.warn(Warning::Truncated {
                            sheet: None,
                            detail: format!(
                                "shared string table holds {} of {} strings",
                                globals.shared_strings.len(),
                                globals.shared_strings.declared_unique
                            ),
                        });
                    }
                    Ok(())
                },
                RECORD_FORMAT => globals.formats.add_format(data, &globals.text).map(|_| ()),
                RECORD_XF => XfEntry::parse(data).map(|xf| globals.formats.add_xf(xf)),
                RECORD_BOUNDSHEET => BoundSheetRecord::parse(data, &globals.text).map(|sheet| {
                    log::debug!(
                        "sheet '{}' ({:?}, {:?}) at offset {}",
                        sheet.name,
                        sheet.kind,
                        sheet.visibility,
                        sheet.position
                    );
                    globals.bound_sheets.push(sheet);
                }),
                RECORD_NAME => match DefinedName::parse(data, &globals.text) {
                    Ok(name) => {
                        globals.formulas.add_name(name);
                        Ok(())
                    },
                    Err(e) => {
                        // Formulas refer to names by position
                        globals.formulas.add_name(DefinedName::unreadable());
                        Err(e)
                    },
                },
                RECORD_SUPBOOK => SupBook::parse(data, &globals.text).map(|supbook| globals.formulas.add_supbook(supbook)),
                RECORD_EXTERNNAME if globals.version.supports_unicode() => {
                    formula::parse_extern_name(data, &globals.text).map(|name| globals.formulas.add_extern_name(name))
                },
                RECORD_EXTERNSHEET if globals.version.supports_unicode() => {
                    ExternSheet::parse_all(data).map(|sheets| globals.formulas.add_extern_sheets(sheets))
                },
                _ => Ok(()),
            };

            if decoded.is_err() {
                self.warn(Warning::MalformedRecord {
                    sheet: None,
                    record_type: record.record_type,
                    offset: record.offset,
                });
            }
        }

        if records.is_truncated() || records.missing_eof() {
            self.truncated = true;
            self.warn(Warning::Truncated {
                sheet: None,
                detail: "workbook globals end without an EOF record".to_string(),
            });
        }

        Ok(globals)
    }

    /// BIFF8 strings carry their own encoding, so only BIFF5/7 needs a codec.
    fn select_codepage(id: u16, version: BiffVersion) -> Result<TextDecoder> {
        match Codepage::new(id) {
            Some(codepage) => {
                log::debug!("codepage {} ({})", id, codepage.encoding().name());
                Ok(TextDecoder::new(version, codepage))
            },
            None if version.supports_unicode() => {
                log::debug!("codepage {} has no decoder; BIFF8 strings are self-describing", id);
                Ok(TextDecoder::new(version, Codepage::default()))
            },
            None => Err(Error::unsupported(format!("codepage {} is not supported", id))),
        }
    }

    fn parse_sheet(&mut self, stream: &[u8], bound: &BoundSheetRecord, globals: &Globals, sheet: &mut Sheet) {
        if !bound.kind.has_cells() {
            if let SheetKind::Unknown(kind) = bound.kind {
                self.warn(Warning::UnknownSheetKind {
                    sheet: bound.name.clone(),
                    kind,
                });
            } else {
                log::debug!("sheet '{}' is a {:?}; no cells decoded", bound.name, bound.kind);
            }
            return;
        }

        let offset = bound.position as usize;
        if offset >= stream.len() {
            // Points past a cut-off stream, or nowhere at all.
            sheet.mark_truncated();
            self.warn(Warning::SheetOffsetOutOfRange {
                sheet: bound.name.clone(),
                offset: bound.position,
            });
            return;
        }

        let mut records = Substream::new(RecordIter::from_offset(stream, offset));
        match records.next() {
            Some(Ok(first)) => match BofRecord::parse(&first, globals.version) {
                Ok(bof) if matches!(bof.kind, SubstreamKind::Worksheet | SubstreamKind::MacroSheet) => {},
                Ok(bof) => {
                    self.warn(Warning::UnexpectedSubstream {
                        sheet: bound.name.clone(),
                        detail: format!("BOF declares a {:?} substream", bof.kind),
                    });
                    return;
                },
                Err(e) => {
                    self.warn(Warning::UnexpectedSubstream {
                        sheet: bound.name.clone(),
                        detail: e.to_string(),
                    });
                    return;
                },
            },
            Some(Err(e)) => {
                self.warn(Warning::UnexpectedSubstream {
                    sheet: bound.name.clone(),
                    detail: e.to_string(),
                });
                return;
            },
            None => {
                sheet.mark_truncated();
                self.warn(Warning::Truncated {
                    sheet: Some(bound.name.clone()),
                    detail: "no records at the sheet offset".to_string(),
                });
                return;
            },
        }

        let mut pending_string: Option<(u32, u16)> = None;
        for item in records.by_ref() {
            let record = match item {
                Ok(record) => record,
                Err(e) => {
                    // Framing is lost; nothing after this point can be trusted.
                    log::warn!("sheet '{}': {}", bound.name, e);
                    let (record_type, offset) = match e {
                        Error::CorruptRecord {
                            record_type, offset, ..
                        } => (record_type, offset),
                        _ => (0, 0),
                    };
                    self.warn(Warning::MalformedRecord {
                        sheet: Some(bound.name.clone()),
                        record_type,
                        offset,
                    });
                    break;
                },
            };

            match record.record_type {
                RECORD_DIMENSION => {
                    if let Ok(dimensions) = Dimensions::parse(record.data(), globals.version) {
                        sheet.set_declared_dimensions(dimensions);
                    }
                },
                RECORD_STRING => {
                    let Some((row, col)) = pending_string.take() else {
                        log::debug!("STRING record without a preceding string formula");
                        continue;
                    };
                    match globals.text.read_u16_string(record.data()) {
                        Ok((text, _)) => {
                            if let Some(cell) = sheet.cell_mut(row, col) {
                                cell.value = CellValue::Formula(FormulaResult::Text(text));
                            }
                        },
                        Err(_) => self.warn(Warning::MalformedRecord {
                            sheet: Some(bound.name.clone()),
                            record_type: record.record_type,
                            offset: record.offset,
                        }),
                    }
                },
                RECORD_SHRFMLA | RECORD_ARRAY => {
                    let parsed = if record.record_type == RECORD_SHRFMLA {
                        SharedFormula::parse_shared(record.data())
                    } else {
                        SharedFormula::parse_array(record.data())
                    };
                    match parsed {
                        Ok(shared) => sheet.add_shared_formula(shared),
                        Err(_) => self.warn(Warning::MalformedRecord {
                            sheet: Some(bound.name.clone()),
                            record_type: record.record_type,
                            offset: record.offset,
                        }),
                    }
                },
                record_type if CellRecord::is_cell_record(record_type) => {
                    pending_string = None;
                    match CellRecord::parse(record_type, record.data(), &globals.text) {
                        Ok(cell) => {
                            pending_string = self.apply_cell(sheet, cell, globals);
                        },
                        Err(_) => self.warn(Warning::MalformedRecord {
                            sheet: Some(bound.name.clone()),
                            record_type,
                            offset: record.offset,
                        }),
                    }
                },
                _ => {},
            }
        }

        if records.is_truncated() || records.missing_eof() {
            sheet.mark_truncated();
            self.warn(Warning::Truncated {
                sheet: Some(bound.name.clone()),
                detail: "records end without an EOF record".to_string(),
            });
        }

        log::debug!(
            "sheet '{}': {} cells, {} x {}",
            sheet.name(),
            sheet.len(),
            sheet.nrows(),
            sheet.ncols()
        );
    }

    /// Place the cells of one record; returns the position of a formula
    /// whose string result follows in a STRING record.
    fn apply_cell(&mut self, sheet: &mut Sheet, record: CellRecord, globals: &Globals) -> Option<(u32, u16)> {
        match record {
            CellRecord::Blank { row, col, xf_index } => {
                if self.options.include_blank_cells {
                    self.place(sheet, globals, row, u32::from(col), CellValue::Empty, xf_index);
                }
            },
            CellRecord::MulBlank {
                row,
                first_col,
                xf_indices,
            } => {
                if self.options.include_blank_cells {
                    for (i, xf_index) in xf_indices.into_iter().enumerate() {
                        let col = u32::from(first_col) + i as u32;
                        self.place(sheet, globals, row, col, CellValue::Empty, xf_index);
                    }
                }
            },
            CellRecord::Number {
                row,
                col,
                xf_index,
                value,
            }
            | CellRecord::Rk {
                row,
                col,
                xf_index,
                value,
            } => {
                self.place(sheet, globals, row, u32::from(col), CellValue::Number(value), xf_index);
            },
            CellRecord::MulRk {
                row,
                first_col,
                cells,
            } => {
                for (i, (xf_index, value)) in cells.into_iter().enumerate() {
                    let col = u32::from(first_col) + i as u32;
                    self.place(sheet, globals, row, col, CellValue::Number(value), xf_index);
                }
            },
            CellRecord::LabelSst {
                row,
                col,
                xf_index,
                sst_index,
            } => {
                let table_len = globals.shared_strings.len();
                if sst_index as usize >= table_len {
                    self.warn(Warning::SharedStringOutOfRange {
                        sheet: sheet.name().to_string(),
                        row: u32::from(row),
                        col,
                        index: sst_index,
                        table_len,
                    });
                }
                let value = CellValue::Text(CellText::Shared(SstIndex(sst_index)));
                self.place(sheet, globals, row, u32::from(col), value, xf_index);
            },
            CellRecord::Label {
                row,
                col,
                xf_index,
                value,
            } => {
                let value = CellValue::Text(CellText::Inline(value));
                self.place(sheet, globals, row, u32::from(col), value, xf_index);
            },
            CellRecord::BoolErr {
                row,
                col,
                xf_index,
                value,
            } => {
                let value = match value {
                    BoolErrValue::Bool(b) => CellValue::Bool(b),
                    BoolErrValue::Error(e) => CellValue::Error(e),
                };
                self.place(sheet, globals, row, u32::from(col), value, xf_index);
            },
            CellRecord::Formula {
                row,
                col,
                xf_index,
                result,
                tokens,
            } => {
                let (result, string_follows) = match result {
                    CachedResult::Number(n) => (FormulaResult::Number(n), false),
                    CachedResult::Bool(b) => (FormulaResult::Bool(b), false),
                    CachedResult::Error(e) => (FormulaResult::Error(e), false),
                    CachedResult::EmptyString => (FormulaResult::EmptyString, false),
                    CachedResult::StringFollows => (FormulaResult::EmptyString, true),
                };
                let col = u32::from(col);
                if self.place(sheet, globals, row, col, CellValue::Formula(result), xf_index) {
                    // place() only accepts columns that fit the grid
                    let col = col as u16;
                    sheet.set_formula_tokens(u32::from(row), col, tokens);
                    if string_follows {
                        return Some((u32::from(row), col));
                    }
                }
            },
        }
        None
    }

    /// Insert a cell if it lies inside the BIFF grid; returns whether it did.
    fn place(
        &mut self,
        sheet: &mut Sheet,
        globals: &Globals,
        row: u16,
        col: u32,
        value: CellValue,
        xf_index: u16,
    ) -> bool {
        let row = u32::from(row);
        let in_range = row < globals.version.max_rows() && col < u32::from(globals.version.max_cols());
        match u16::try_from(col) {
            Ok(col) if in_range => {
                sheet.insert(Cell::new(row, col, value, xf_index));
                true
            },
            _ => {
                self.warn(Warning::CellOutOfRange {
                    sheet: sheet.name().to_string(),
                    row,
                    col,
                });
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codepage_selection() {
        let text = Builder::select_codepage(1251, BiffVersion::Biff5).unwrap();
        assert_eq!(text.codepage().id(), 1251);

        let text = Builder::select_codepage(1200, BiffVersion::Biff8).unwrap();
        assert_eq!(text.version(), BiffVersion::Biff8);

        // No decoder for 437, which only matters for byte strings.
        assert!(Builder::select_codepage(437, BiffVersion::Biff8).is_ok());
        assert!(matches!(
            Builder::select_codepage(437, BiffVersion::Biff5),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_warnings_are_capped() {
        let options = ParseOptions::new().with_max_warnings(2);
        let mut builder = Builder::new(&options);
        for sector in 0..5 {
            builder.warn(Warning::SectorOverlap {
                sector,
                owner: crate::ole::SectorOwner::Fat,
            });
        }
        assert_eq!(builder.warnings.len(), 2);
        assert_eq!(builder.suppressed, 3);
    }
}
