//! Cell representation for XLS files

use std::fmt;

use serde::Serialize;

use crate::ole::xls::utils;

/// Error values stored in BOOLERR and FORMULA records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    Null,
    Div0,
    Value,
    Ref,
    Name,
    Num,
    NA,
    GettingData,
    Unknown(u8),
}

impl ErrorCode {
    pub fn from_u8(code: u8) -> Self {
        match code {
            0x00 => ErrorCode::Null,
            0x07 => ErrorCode::Div0,
            0x0F => ErrorCode::Value,
            0x17 => ErrorCode::Ref,
            0x1D => ErrorCode::Name,
            0x24 => ErrorCode::Num,
            0x2A => ErrorCode::NA,
            0x2B => ErrorCode::GettingData,
            other => ErrorCode::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ErrorCode::Null => 0x00,
            ErrorCode::Div0 => 0x07,
            ErrorCode::Value => 0x0F,
            ErrorCode::Ref => 0x17,
            ErrorCode::Name => 0x1D,
            ErrorCode::Num => 0x24,
            ErrorCode::NA => 0x2A,
            ErrorCode::GettingData => 0x2B,
            ErrorCode::Unknown(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Null => f.write_str("#NULL!"),
            ErrorCode::Div0 => f.write_str("#DIV/0!"),
            ErrorCode::Value => f.write_str("#VALUE!"),
            ErrorCode::Ref => f.write_str("#REF!"),
            ErrorCode::Name => f.write_str("#NAME?"),
            ErrorCode::Num => f.write_str("#NUM!"),
            ErrorCode::NA => f.write_str("#N/A"),
            ErrorCode::GettingData => f.write_str("#GETTING_DATA"),
            ErrorCode::Unknown(code) => write!(f, "#ERR{:02X}", code),
        }
    }
}

/// Index into the workbook's shared string table.
///
/// Only produced from LABELSST records; resolution through
/// [`Workbook::resolve_text`](crate::ole::xls::Workbook::resolve_text) is
/// checked against the table length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SstIndex(pub u32);

/// Text held by a cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CellText {
    /// Stored in the cell record itself (LABEL, RSTRING, formula STRING)
    Inline(String),
    /// Reference into the shared string table (LABELSST)
    Shared(SstIndex),
}

/// Cached result of a formula cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FormulaResult {
    Number(f64),
    Text(String),
    Bool(bool),
    Error(ErrorCode),
    /// Empty string result, or a string result whose STRING record is missing
    EmptyString,
}

/// Decoded cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(CellText),
    Bool(bool),
    Error(ErrorCode),
    Formula(FormulaResult),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric value of number cells and numeric formula results.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) | CellValue::Formula(FormulaResult::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Inline text, or `None` for shared-string references and non-text values.
    pub fn as_inline_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(CellText::Inline(s)) | CellValue::Formula(FormulaResult::Text(s)) => {
                Some(s)
            },
            _ => None,
        }
    }
}

/// One populated grid position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub row: u32,
    pub col: u16,
    pub value: CellValue,
    /// XF (cell style) index from the cell record
    pub xf_index: u16,
}

impl Cell {
    pub fn new(row: u32, col: u16, value: CellValue, xf_index: u16) -> Self {
        Cell {
            row,
            col,
            value,
            xf_index,
        }
    }

    /// A1-style reference of this cell
    pub fn coordinate(&self) -> String {
        utils::cell_reference(self.row, u32::from(self.col))
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.value, CellValue::Formula(_))
    }
}
