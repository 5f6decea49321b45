//! Formula decompilation
//!
//! FORMULA, SHRFMLA, ARRAY and NAME records store formulas as parsed
//! expressions: Ptg tokens in Reverse Polish Notation. [`FormulaParser`]
//! reads one expression into [`FormulaToken`]s and [`FormulaContext`]
//! renders them as A1-style text, resolving defined names and 3D references
//! through the NAME, SUPBOOK, EXTERNNAME and EXTERNSHEET records of the
//! globals substream.
//!
//! Rendering happens on demand. A decoded workbook keeps the raw token bytes
//! and only decompiles the formulas a caller asks for; each rendered formula
//! is capped at [`MAX_FORMULA_LEN`] characters.
//!
//! # Reference
//!
//! - [MS-XLS] Section 2.5.198 - Parsed expressions and Ptgs
//! - [MS-XLS] Section 2.4.150 - NAME
//! - [MS-XLS] Section 2.4.271 - SUPBOOK

use serde::Serialize;
use thiserror::Error;

use crate::common::binary::{self, BinaryResult};
use crate::ole::xls::cell::ErrorCode;
use crate::ole::xls::functions;
use crate::ole::xls::records::BiffVersion;
use crate::ole::xls::strings::TextDecoder;
use crate::ole::xls::utils;

/// Longest formula text that is rendered.
pub const MAX_FORMULA_LEN: usize = 8192;

/// Function index of a call to a user-defined or add-in function.
const USER_DEFINED_FUNCTION: u16 = 0x00FF;

/// Parse Tree Generator (Ptg) token types
///
/// Operand tokens exist in reference, value and array classes (bases 0x20,
/// 0x40 and 0x60); they are listed by their reference-class id.
pub mod ptg_types {
    pub const PTG_EXP: u8 = 0x01; // Shared or array formula
    pub const PTG_TBL: u8 = 0x02; // Data table
    pub const PTG_ADD: u8 = 0x03;
    pub const PTG_SUB: u8 = 0x04;
    pub const PTG_MUL: u8 = 0x05;
    pub const PTG_DIV: u8 = 0x06;
    pub const PTG_POWER: u8 = 0x07;
    pub const PTG_CONCAT: u8 = 0x08;
    pub const PTG_LT: u8 = 0x09;
    pub const PTG_LE: u8 = 0x0A;
    pub const PTG_EQ: u8 = 0x0B;
    pub const PTG_GE: u8 = 0x0C;
    pub const PTG_GT: u8 = 0x0D;
    pub const PTG_NE: u8 = 0x0E;
    pub const PTG_ISECT: u8 = 0x0F;
    pub const PTG_UNION: u8 = 0x10;
    pub const PTG_RANGE: u8 = 0x11;
    pub const PTG_UPLUS: u8 = 0x12;
    pub const PTG_UMINUS: u8 = 0x13;
    pub const PTG_PERCENT: u8 = 0x14;
    pub const PTG_PAREN: u8 = 0x15;
    pub const PTG_MISSING_ARG: u8 = 0x16;
    pub const PTG_STR: u8 = 0x17;
    pub const PTG_EXTENDED: u8 = 0x18;
    pub const PTG_ATTR: u8 = 0x19;
    pub const PTG_SHEET: u8 = 0x1A;
    pub const PTG_END_SHEET: u8 = 0x1B;
    pub const PTG_ERR: u8 = 0x1C;
    pub const PTG_BOOL: u8 = 0x1D;
    pub const PTG_INT: u8 = 0x1E;
    pub const PTG_NUM: u8 = 0x1F;

    pub const PTG_ARRAY: u8 = 0x20; // Array constant
    pub const PTG_FUNC: u8 = 0x21; // Built-in function with fixed args
    pub const PTG_FUNC_VAR: u8 = 0x22; // Built-in function with variable args
    pub const PTG_NAME: u8 = 0x23;
    pub const PTG_REF: u8 = 0x24;
    pub const PTG_AREA: u8 = 0x25;
    pub const PTG_MEM_AREA: u8 = 0x26;
    pub const PTG_MEM_ERR: u8 = 0x27;
    pub const PTG_MEM_NO_MEM: u8 = 0x28;
    pub const PTG_MEM_FUNC: u8 = 0x29;
    pub const PTG_REF_ERR: u8 = 0x2A;
    pub const PTG_AREA_ERR: u8 = 0x2B;
    pub const PTG_REF_N: u8 = 0x2C; // Cell reference relative to the formula's cell
    pub const PTG_AREA_N: u8 = 0x2D;
    pub const PTG_MEM_AREA_N: u8 = 0x2E;
    pub const PTG_MEM_NO_MEM_N: u8 = 0x2F;
    pub const PTG_NAME_X: u8 = 0x39; // External or add-in name
    pub const PTG_REF_3D: u8 = 0x3A;
    pub const PTG_AREA_3D: u8 = 0x3B;
    pub const PTG_REF_ERR_3D: u8 = 0x3C;
    pub const PTG_AREA_ERR_3D: u8 = 0x3D;

    // tAttr option bits
    pub const ATTR_VOLATILE: u8 = 0x01;
    pub const ATTR_IF: u8 = 0x02;
    pub const ATTR_CHOOSE: u8 = 0x04;
    pub const ATTR_SKIP: u8 = 0x08;
    pub const ATTR_SUM: u8 = 0x10;
    pub const ATTR_SPACE: u8 = 0x40;
}

use ptg_types::*;

/// Why a parsed expression could not be rendered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("token 0x{ptg:02X} at offset {offset} runs past the end of the expression")]
    Truncated { ptg: u8, offset: usize },

    #[error("token 0x{ptg:02X} at offset {offset} is not supported")]
    UnsupportedToken { ptg: u8, offset: usize },

    #[error("fixed-argument function {index} is unknown")]
    UnknownFunction { index: u16 },

    #[error("operator needs {needed} operands, {available} available")]
    MissingOperands { needed: usize, available: usize },

    #[error("expression leaves {0} operands instead of one")]
    Unbalanced(usize),

    #[error("formula text exceeds {} characters", MAX_FORMULA_LEN)]
    TooLong,

    #[error("no shared or array formula is anchored at row {row}, column {col}")]
    MissingSharedFormula { row: u32, col: u16 },
}

type Result<T> = std::result::Result<T, FormulaError>;

/// Binary operators, including the reference operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Concat,
    LessThan,
    LessEqual,
    Equal,
    GreaterEqual,
    GreaterThan,
    NotEqual,
    Intersect,
    Union,
    Range,
}

impl BinaryOperator {
    fn from_ptg(ptg: u8) -> Option<Self> {
        Some(match ptg {
            PTG_ADD => BinaryOperator::Add,
            PTG_SUB => BinaryOperator::Subtract,
            PTG_MUL => BinaryOperator::Multiply,
            PTG_DIV => BinaryOperator::Divide,
            PTG_POWER => BinaryOperator::Power,
            PTG_CONCAT => BinaryOperator::Concat,
            PTG_LT => BinaryOperator::LessThan,
            PTG_LE => BinaryOperator::LessEqual,
            PTG_EQ => BinaryOperator::Equal,
            PTG_GE => BinaryOperator::GreaterEqual,
            PTG_GT => BinaryOperator::GreaterThan,
            PTG_NE => BinaryOperator::NotEqual,
            PTG_ISECT => BinaryOperator::Intersect,
            PTG_UNION => BinaryOperator::Union,
            PTG_RANGE => BinaryOperator::Range,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Concat => "&",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Equal => "=",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::Intersect => " ",
            BinaryOperator::Union => ",",
            BinaryOperator::Range => ":",
        }
    }

    fn rank(self) -> u8 {
        match self {
            BinaryOperator::LessThan
            | BinaryOperator::LessEqual
            | BinaryOperator::Equal
            | BinaryOperator::GreaterEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::NotEqual => RANK_COMPARE,
            BinaryOperator::Concat => RANK_CONCAT,
            BinaryOperator::Add | BinaryOperator::Subtract => RANK_ADD,
            BinaryOperator::Multiply | BinaryOperator::Divide => RANK_MUL,
            BinaryOperator::Power => RANK_POWER,
            BinaryOperator::Intersect | BinaryOperator::Union | BinaryOperator::Range => RANK_REFERENCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Percent,
}

// Binding strength of rendered operands; higher binds tighter.
const RANK_COMPARE: u8 = 10;
const RANK_CONCAT: u8 = 20;
const RANK_ADD: u8 = 30;
const RANK_MUL: u8 = 40;
const RANK_POWER: u8 = 50;
const RANK_PERCENT: u8 = 60;
const RANK_UNARY: u8 = 70;
const RANK_REFERENCE: u8 = 80;
const RANK_LEAF: u8 = 90;

/// A single-cell reference after relative offsets are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellAddress {
    pub row: u32,
    pub col: u16,
    pub row_relative: bool,
    pub col_relative: bool,
}

impl CellAddress {
    fn column_text(&self) -> String {
        let anchor = if self.col_relative { "" } else { "$" };
        format!("{}{}", anchor, utils::column_index_to_name(u32::from(self.col) + 1))
    }

    fn row_text(&self) -> String {
        let anchor = if self.row_relative { "" } else { "$" };
        format!("{}{}", anchor, self.row + 1)
    }
}

impl std::fmt::Display for CellAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.column_text(), self.row_text())
    }
}

/// A rectangular reference between two corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AreaAddress {
    pub first: CellAddress,
    pub last: CellAddress,
}

impl AreaAddress {
    /// A1 text; whole columns render as `A:C` and whole rows as `1:3`.
    fn render(&self, version: BiffVersion) -> String {
        if self.first.row == 0 && self.last.row + 1 == version.max_rows() {
            format!("{}:{}", self.first.column_text(), self.last.column_text())
        } else if self.first.col == 0 && self.last.col + 1 == version.max_cols() {
            format!("{}:{}", self.first.row_text(), self.last.row_text())
        } else {
            format!("{}:{}", self.first, self.last)
        }
    }
}

/// Sheet part of a 3D reference or external name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SheetRef {
    /// BIFF8 index into the EXTERNSHEET table
    Extern(u16),
    /// BIFF5 sheet range; a positive `extern_index` points at another workbook
    Biff5 { extern_index: i16, first: i16, last: i16 },
}

/// One token of a parsed expression.
///
/// Attribute tokens that only steer evaluation (if, choose, skip, spacing)
/// and the memory-area wrappers are dropped while parsing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FormulaToken {
    /// Cell belongs to the shared or array formula anchored here
    Exp { row: u32, col: u16 },
    Binary(BinaryOperator),
    Unary(UnaryOperator),
    Paren,
    MissingArg,
    Str(String),
    Error(ErrorCode),
    Bool(bool),
    Int(u16),
    Number(f64),
    /// SUM over the single operand on the stack
    AttrSum,
    /// `args` is `None` for a fixed-argument call
    Function { index: u16, args: Option<u8> },
    /// One-based index into the NAME records
    Name(u16),
    NameX { sheet: SheetRef, index: u16 },
    Ref(CellAddress),
    Area(AreaAddress),
    RefErr,
    AreaErr,
    Ref3d { sheet: SheetRef, cell: CellAddress },
    Area3d { sheet: SheetRef, area: AreaAddress },
    RefErr3d(SheetRef),
    AreaErr3d(SheetRef),
}

/// Reads one parsed expression into tokens.
pub struct FormulaParser<'a> {
    data: &'a [u8],
    pos: usize,
    text: TextDecoder,
    base: (u32, u16),
    // Token being read, for error reports
    ptg: u8,
    start: usize,
}

impl<'a> FormulaParser<'a> {
    pub fn new(data: &'a [u8], text: TextDecoder) -> Self {
        FormulaParser {
            data,
            pos: 0,
            text,
            base: (0, 0),
            ptg: 0,
            start: 0,
        }
    }

    /// Cell that relative (RefN and AreaN) tokens are offsets from.
    pub fn with_base(mut self, row: u32, col: u16) -> Self {
        self.base = (row, col);
        self
    }

    pub fn parse(&mut self) -> Result<Vec<FormulaToken>> {
        let mut tokens = Vec::new();
        while self.pos < self.data.len() {
            if let Some(token) = self.parse_token()? {
                tokens.push(token);
            }
        }
        Ok(tokens)
    }

    fn biff8(&self) -> bool {
        self.text.version() == BiffVersion::Biff8
    }

    fn parse_token(&mut self) -> Result<Option<FormulaToken>> {
        self.start = self.pos;
        self.ptg = 0;
        let ptg = self.u8()?;
        self.ptg = ptg;
        if ptg >= 0x80 {
            return Err(self.unsupported());
        }
        // Operand classes share one id
        let base = if ptg >= 0x20 { 0x20 | (ptg & 0x1F) } else { ptg };
        if let Some(op) = BinaryOperator::from_ptg(base) {
            return Ok(Some(FormulaToken::Binary(op)));
        }

        let token = match base {
            PTG_EXP => {
                let row = u32::from(self.u16()?);
                let col = self.col_field()?;
                FormulaToken::Exp { row, col }
            },
            PTG_UPLUS => FormulaToken::Unary(UnaryOperator::Plus),
            PTG_UMINUS => FormulaToken::Unary(UnaryOperator::Minus),
            PTG_PERCENT => FormulaToken::Unary(UnaryOperator::Percent),
            PTG_PAREN => FormulaToken::Paren,
            PTG_MISSING_ARG => FormulaToken::MissingArg,
            PTG_STR => {
                let rest = self.data.get(self.pos..).unwrap_or_default();
                let (text, used) = self.text.read_u8_string(rest).map_err(|_| self.truncated())?;
                self.pos += used;
                FormulaToken::Str(text)
            },
            PTG_ATTR => {
                let flags = self.u8()?;
                let data = self.u16()?;
                if flags & ATTR_CHOOSE != 0 {
                    // Jump table
                    self.skip((usize::from(data) + 1) * 2)?;
                }
                if flags & ATTR_SUM == 0 {
                    return Ok(None);
                }
                FormulaToken::AttrSum
            },
            PTG_ERR => FormulaToken::Error(ErrorCode::from_u8(self.u8()?)),
            PTG_BOOL => FormulaToken::Bool(self.u8()? != 0),
            PTG_INT => FormulaToken::Int(self.u16()?),
            PTG_NUM => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(self.take(8)?);
                FormulaToken::Number(f64::from_le_bytes(raw))
            },
            PTG_FUNC => FormulaToken::Function {
                index: self.u16()?,
                args: None,
            },
            PTG_FUNC_VAR => {
                let args = self.u8()? & 0x7F;
                FormulaToken::Function {
                    index: self.u16()?,
                    args: Some(args),
                }
            },
            PTG_NAME => {
                let index = self.u16()?;
                self.skip(if self.biff8() { 2 } else { 12 })?;
                FormulaToken::Name(index)
            },
            PTG_REF => FormulaToken::Ref(self.cell(false)?),
            PTG_AREA => FormulaToken::Area(self.area(false)?),
            PTG_REF_N => FormulaToken::Ref(self.cell(true)?),
            PTG_AREA_N => FormulaToken::Area(self.area(true)?),
            PTG_MEM_AREA | PTG_MEM_ERR | PTG_MEM_NO_MEM => {
                // The subexpression follows as ordinary tokens
                self.skip(6)?;
                return Ok(None);
            },
            PTG_MEM_FUNC | PTG_MEM_AREA_N | PTG_MEM_NO_MEM_N => {
                self.skip(2)?;
                return Ok(None);
            },
            PTG_REF_ERR => {
                self.skip(self.cell_size())?;
                FormulaToken::RefErr
            },
            PTG_AREA_ERR => {
                self.skip(self.area_size())?;
                FormulaToken::AreaErr
            },
            PTG_NAME_X => {
                if self.biff8() {
                    let sheet = SheetRef::Extern(self.u16()?);
                    let index = self.u16()?;
                    self.skip(2)?;
                    FormulaToken::NameX { sheet, index }
                } else {
                    let extern_index = self.i16()?;
                    self.skip(8)?;
                    let index = self.u16()?;
                    self.skip(12)?;
                    let sheet = SheetRef::Biff5 {
                        extern_index,
                        first: -1,
                        last: -1,
                    };
                    FormulaToken::NameX { sheet, index }
                }
            },
            PTG_REF_3D => {
                let sheet = self.sheet()?;
                FormulaToken::Ref3d {
                    sheet,
                    cell: self.cell(false)?,
                }
            },
            PTG_AREA_3D => {
                let sheet = self.sheet()?;
                FormulaToken::Area3d {
                    sheet,
                    area: self.area(false)?,
                }
            },
            PTG_REF_ERR_3D => {
                let sheet = self.sheet()?;
                self.skip(self.cell_size())?;
                FormulaToken::RefErr3d(sheet)
            },
            PTG_AREA_ERR_3D => {
                let sheet = self.sheet()?;
                self.skip(self.area_size())?;
                FormulaToken::AreaErr3d(sheet)
            },
            // Tables, array constants, extended and sheet tokens
            _ => return Err(self.unsupported()),
        };
        Ok(Some(token))
    }

    fn truncated(&self) -> FormulaError {
        FormulaError::Truncated {
            ptg: self.ptg,
            offset: self.start,
        }
    }

    fn unsupported(&self) -> FormulaError {
        FormulaError::UnsupportedToken {
            ptg: self.ptg,
            offset: self.start,
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let bytes = binary::slice_at(self.data, self.pos, len).map_err(|_| self.truncated())?;
        self.pos += len;
        Ok(bytes)
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    fn u8(&mut self) -> Result<u8> {
        let byte = binary::read_u8(self.data, self.pos).map_err(|_| self.truncated())?;
        self.pos += 1;
        Ok(byte)
    }

    fn u16(&mut self) -> Result<u16> {
        let value = binary::read_u16_le(self.data, self.pos).map_err(|_| self.truncated())?;
        self.pos += 2;
        Ok(value)
    }

    fn i16(&mut self) -> Result<i16> {
        self.u16().map(|v| v as i16)
    }

    /// Column field: 16 bits with flags in BIFF8, one byte in BIFF5.
    fn col_field(&mut self) -> Result<u16> {
        if self.biff8() {
            self.u16()
        } else {
            self.u8().map(u16::from)
        }
    }

    fn cell_size(&self) -> usize {
        if self.biff8() { 4 } else { 3 }
    }

    fn area_size(&self) -> usize {
        if self.biff8() { 8 } else { 6 }
    }

    fn cell(&mut self, offsets: bool) -> Result<CellAddress> {
        let row = self.u16()?;
        let col = self.col_field()?;
        Ok(self.address(row, col, offsets))
    }

    fn area(&mut self, offsets: bool) -> Result<AreaAddress> {
        let (first_row, last_row) = (self.u16()?, self.u16()?);
        let (first_col, last_col) = (self.col_field()?, self.col_field()?);
        Ok(AreaAddress {
            first: self.address(first_row, first_col, offsets),
            last: self.address(last_row, last_col, offsets),
        })
    }

    fn sheet(&mut self) -> Result<SheetRef> {
        if self.biff8() {
            return Ok(SheetRef::Extern(self.u16()?));
        }
        let extern_index = self.i16()?;
        self.skip(8)?;
        let first = self.i16()?;
        let last = self.i16()?;
        Ok(SheetRef::Biff5 {
            extern_index,
            first,
            last,
        })
    }

    /// Split row and column fields into a cell address.
    ///
    /// BIFF8 keeps the relative flags in the column field, BIFF5 in the top
    /// bits of the row field. With `offsets` set, relative parts are signed
    /// offsets from the base cell and wrap around the grid.
    fn address(&self, row_field: u16, col_field: u16, offsets: bool) -> CellAddress {
        let (row, col, row_relative, col_relative) = if self.biff8() {
            (
                u32::from(row_field),
                col_field & 0x00FF,
                col_field & 0x4000 != 0,
                col_field & 0x8000 != 0,
            )
        } else {
            (
                u32::from(row_field & 0x3FFF),
                col_field & 0x00FF,
                row_field & 0x8000 != 0,
                row_field & 0x4000 != 0,
            )
        };
        if !offsets {
            return CellAddress {
                row,
                col,
                row_relative,
                col_relative,
            };
        }

        let version = self.text.version();
        let row = if row_relative {
            let delta = if self.biff8() {
                i64::from(row as u16 as i16)
            } else {
                // 14-bit two's complement
                (i64::from(row) ^ 0x2000) - 0x2000
            };
            (i64::from(self.base.0) + delta).rem_euclid(i64::from(version.max_rows())) as u32
        } else {
            row
        };
        let col = if col_relative {
            let delta = i64::from(col as u8 as i8);
            (i64::from(self.base.1) + delta).rem_euclid(i64::from(version.max_cols())) as u16
        } else {
            col
        };
        CellAddress {
            row,
            col,
            row_relative,
            col_relative,
        }
    }
}

/// A NAME record: a workbook- or sheet-level defined name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinedName {
    pub name: String,
    /// Zero-based sheet index of a sheet-level name
    pub scope: Option<usize>,
    pub hidden: bool,
    /// One of the reserved names such as `Print_Area`
    pub builtin: bool,
    /// Names a macro function or command
    pub function: bool,
    tokens: Vec<u8>,
}

const NAME_HIDDEN: u16 = 0x0001;
const NAME_FUNCTION: u16 = 0x0002;
const NAME_BUILTIN: u16 = 0x0020;

impl DefinedName {
    pub fn parse(data: &[u8], text: &TextDecoder) -> BinaryResult<Self> {
        let flags = binary::read_u16_le(data, 0)?;
        let cch = usize::from(binary::read_u8(data, 3)?);
        let cce = usize::from(binary::read_u16_le(data, 4)?);
        let itab = binary::read_u16_le(data, 8)?;
        let (raw, used) = text.read_chars(data.get(14..).unwrap_or_default(), cch)?;

        let builtin = flags & NAME_BUILTIN != 0;
        let name = if builtin {
            builtin_name(raw.chars().next().map_or(0, u32::from))
        } else {
            raw
        };
        // A cut-off expression is kept; rendering reports it.
        let expression = data.get(14 + used..).unwrap_or_default();
        let tokens = expression[..cce.min(expression.len())].to_vec();

        Ok(DefinedName {
            name,
            scope: itab.checked_sub(1).map(usize::from),
            hidden: flags & NAME_HIDDEN != 0,
            builtin,
            function: flags & NAME_FUNCTION != 0,
            tokens,
        })
    }

    /// Stands in for a NAME record that could not be read, so later names
    /// keep their index.
    pub(crate) fn unreadable() -> Self {
        DefinedName {
            name: String::new(),
            scope: None,
            hidden: false,
            builtin: false,
            function: false,
            tokens: Vec::new(),
        }
    }

    /// Parsed expression the name stands for
    pub fn tokens(&self) -> &[u8] {
        &self.tokens
    }
}

fn builtin_name(code: u32) -> String {
    let name = match code {
        0x00 => "Consolidate_Area",
        0x01 => "Auto_Open",
        0x02 => "Auto_Close",
        0x03 => "Extract",
        0x04 => "Database",
        0x05 => "Criteria",
        0x06 => "Print_Area",
        0x07 => "Print_Titles",
        0x08 => "Recorder",
        0x09 => "Data_Form",
        0x0A => "Auto_Activate",
        0x0B => "Auto_Deactivate",
        0x0C => "Sheet_Title",
        0x0D => "_FilterDatabase",
        other => return format!("Builtin_{:02X}", other),
    };
    name.to_string()
}

/// An EXTERNSHEET entry: a sheet range in a SUPBOOK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExternSheet {
    pub supbook: u16,
    pub first: u16,
    pub last: u16,
}

impl ExternSheet {
    /// Entries of a BIFF8 EXTERNSHEET record; a short record yields the
    /// entries it holds.
    pub fn parse_all(data: &[u8]) -> BinaryResult<Vec<Self>> {
        let count = usize::from(binary::read_u16_le(data, 0)?);
        let available = data.len().saturating_sub(2) / 6;
        if available < count {
            log::debug!("EXTERNSHEET lists {} entries but holds {}", count, available);
        }
        (0..count.min(available))
            .map(|i| {
                let at = 2 + i * 6;
                Ok(ExternSheet {
                    supbook: binary::read_u16_le(data, at)?,
                    first: binary::read_u16_le(data, at + 2)?,
                    last: binary::read_u16_le(data, at + 4)?,
                })
            })
            .collect()
    }
}

/// A SUPBOOK record: the workbook that 3D references point into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SupBook {
    /// Sheets of this workbook
    Internal,
    /// Add-in functions, named by the EXTERNNAME records that follow
    AddIn { names: Vec<String> },
    External {
        path: String,
        sheets: Vec<String>,
        names: Vec<String>,
    },
}

const SUPBOOK_INTERNAL: u16 = 0x0401;
const SUPBOOK_ADDIN: u16 = 0x3A01;

impl SupBook {
    pub fn parse(data: &[u8], text: &TextDecoder) -> BinaryResult<Self> {
        let sheet_count = binary::read_u16_le(data, 0)?;
        match binary::read_u16_le(data, 2)? {
            SUPBOOK_INTERNAL => Ok(SupBook::Internal),
            SUPBOOK_ADDIN => Ok(SupBook::AddIn { names: Vec::new() }),
            _ => {
                let (path, used) = text.read_u16_string(data.get(2..).unwrap_or_default())?;
                let mut pos = 2 + used;
                let mut sheets = Vec::new();
                for _ in 0..sheet_count {
                    match text.read_u16_string(data.get(pos..).unwrap_or_default()) {
                        Ok((sheet, used)) => {
                            sheets.push(sheet);
                            pos += used;
                        },
                        Err(_) => break,
                    }
                }
                Ok(SupBook::External {
                    path: decode_virtual_path(&path),
                    sheets,
                    names: Vec::new(),
                })
            },
        }
    }

    /// Record a name from an EXTERNNAME record following this SUPBOOK.
    pub(crate) fn push_name(&mut self, name: String) {
        match self {
            SupBook::Internal => {},
            SupBook::AddIn { names } | SupBook::External { names, .. } => names.push(name),
        }
    }
}

/// Name held by an EXTERNNAME record.
pub fn parse_extern_name(data: &[u8], text: &TextDecoder) -> BinaryResult<String> {
    text.read_u8_string(data.get(6..).unwrap_or_default()).map(|(name, _)| name)
}

/// Replace the control characters of an encoded file path with separators.
fn decode_virtual_path(raw: &str) -> String {
    let mut path = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\u{1}' => match chars.next() {
                Some('@') => path.push_str("\\\\"),
                Some(drive) => {
                    path.push(drive);
                    path.push_str(":\\");
                },
                None => {},
            },
            '\u{2}' | '\u{3}' => path.push('\\'),
            '\u{4}' => path.push_str("..\\"),
            c if c < ' ' => {},
            c => path.push(c),
        }
    }
    path
}

/// A SHRFMLA or ARRAY definition shared by a block of formula cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedFormula {
    pub kind: SharedFormulaKind,
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u16,
    pub last_col: u16,
    tokens: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SharedFormulaKind {
    Shared,
    Array,
}

impl SharedFormula {
    /// SHRFMLA: range, reserved byte, use count, then the expression at 8.
    pub fn parse_shared(data: &[u8]) -> BinaryResult<Self> {
        Self::parse(data, SharedFormulaKind::Shared, 8)
    }

    /// ARRAY: range, options, reserved dword, then the expression at 12.
    pub fn parse_array(data: &[u8]) -> BinaryResult<Self> {
        Self::parse(data, SharedFormulaKind::Array, 12)
    }

    fn parse(data: &[u8], kind: SharedFormulaKind, cce_offset: usize) -> BinaryResult<Self> {
        let cce = usize::from(binary::read_u16_le(data, cce_offset)?);
        Ok(SharedFormula {
            kind,
            first_row: u32::from(binary::read_u16_le(data, 0)?),
            last_row: u32::from(binary::read_u16_le(data, 2)?),
            first_col: u16::from(binary::read_u8(data, 4)?),
            last_col: u16::from(binary::read_u8(data, 5)?),
            tokens: binary::slice_at(data, cce_offset + 2, cce)?.to_vec(),
        })
    }

    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row) && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn tokens(&self) -> &[u8] {
        &self.tokens
    }
}

/// Workbook-wide tables needed to render formulas.
#[derive(Debug, Clone, Serialize)]
pub struct FormulaContext {
    #[serde(skip)]
    text: TextDecoder,
    sheet_names: Vec<String>,
    names: Vec<DefinedName>,
    extern_sheets: Vec<ExternSheet>,
    supbooks: Vec<SupBook>,
}

struct Operand {
    text: String,
    rank: u8,
}

impl Operand {
    fn leaf(text: String) -> Self {
        Operand { text, rank: RANK_LEAF }
    }

    /// Text, parenthesized when it binds looser than `rank` (or equally
    /// loose, for `strict`).
    fn wrapped(&self, rank: u8, strict: bool) -> String {
        if self.rank < rank || (strict && self.rank == rank) {
            format!("({})", self.text)
        } else {
            self.text.clone()
        }
    }
}

impl FormulaContext {
    pub fn new(text: TextDecoder) -> Self {
        FormulaContext {
            text,
            sheet_names: Vec::new(),
            names: Vec::new(),
            extern_sheets: Vec::new(),
            supbooks: Vec::new(),
        }
    }

    pub(crate) fn set_text(&mut self, text: TextDecoder) {
        self.text = text;
    }

    pub(crate) fn set_sheet_names(&mut self, names: Vec<String>) {
        self.sheet_names = names;
    }

    pub(crate) fn add_name(&mut self, name: DefinedName) {
        self.names.push(name);
    }

    pub(crate) fn add_extern_sheets(&mut self, sheets: Vec<ExternSheet>) {
        self.extern_sheets.extend(sheets);
    }

    pub(crate) fn add_supbook(&mut self, supbook: SupBook) {
        self.supbooks.push(supbook);
    }

    /// Attach an EXTERNNAME to the most recent SUPBOOK.
    pub(crate) fn add_extern_name(&mut self, name: String) {
        match self.supbooks.last_mut() {
            Some(supbook) => supbook.push_name(name),
            None => log::debug!("EXTERNNAME '{}' without a SUPBOOK", name),
        }
    }

    /// Defined names in NAME record order
    pub fn names(&self) -> &[DefinedName] {
        &self.names
    }

    pub fn extern_sheets(&self) -> &[ExternSheet] {
        &self.extern_sheets
    }

    pub fn supbooks(&self) -> &[SupBook] {
        &self.supbooks
    }

    /// Render an expression whose relative tokens are offsets from (row, col).
    pub fn decompile(&self, tokens: &[u8], row: u32, col: u16) -> Result<String> {
        let parsed = FormulaParser::new(tokens, self.text).with_base(row, col).parse()?;
        self.render(&parsed)
    }

    /// Render the formula of the cell at (row, col).
    ///
    /// A cell that only points at a shared or array formula is rendered from
    /// the definition `shared` returns for the anchor position.
    pub fn decompile_cell<'s, F>(&self, tokens: &[u8], row: u32, col: u16, shared: F) -> Result<String>
    where
        F: FnOnce(u32, u16) -> Option<&'s SharedFormula>,
    {
        let parsed = FormulaParser::new(tokens, self.text).with_base(row, col).parse()?;
        if let [FormulaToken::Exp {
            row: anchor_row,
            col: anchor_col,
        }] = parsed.as_slice()
        {
            let definition = shared(*anchor_row, *anchor_col).ok_or(FormulaError::MissingSharedFormula {
                row: *anchor_row,
                col: *anchor_col,
            })?;
            return self.decompile(definition.tokens(), row, col);
        }
        self.render(&parsed)
    }

    /// Render tokens as A1-style formula text without the leading `=`.
    pub fn render(&self, tokens: &[FormulaToken]) -> Result<String> {
        let version = self.text.version();
        let mut stack: Vec<Operand> = Vec::new();

        for token in tokens {
            let operand = match token {
                FormulaToken::Exp { row, col } => {
                    return Err(FormulaError::MissingSharedFormula { row: *row, col: *col });
                },
                FormulaToken::Binary(op) => {
                    let mut operands = pop(&mut stack, 2)?;
                    let (right, left) = (operands.remove(1), operands.remove(0));
                    let rank = op.rank();
                    Operand {
                        text: format!(
                            "{}{}{}",
                            left.wrapped(rank, false),
                            op.symbol(),
                            right.wrapped(rank, true)
                        ),
                        rank,
                    }
                },
                FormulaToken::Unary(UnaryOperator::Percent) => {
                    let operand = pop(&mut stack, 1)?.remove(0);
                    Operand {
                        text: format!("{}%", operand.wrapped(RANK_PERCENT, false)),
                        rank: RANK_PERCENT,
                    }
                },
                FormulaToken::Unary(op) => {
                    let operand = pop(&mut stack, 1)?.remove(0);
                    let sign = if *op == UnaryOperator::Minus { "-" } else { "+" };
                    Operand {
                        text: format!("{}{}", sign, operand.wrapped(RANK_UNARY, false)),
                        rank: RANK_UNARY,
                    }
                },
                FormulaToken::Paren => {
                    let operand = pop(&mut stack, 1)?.remove(0);
                    Operand::leaf(format!("({})", operand.text))
                },
                FormulaToken::MissingArg => Operand::leaf(String::new()),
                FormulaToken::Str(s) => Operand::leaf(format!("\"{}\"", s.replace('"', "\"\""))),
                FormulaToken::Error(code) => Operand::leaf(code.to_string()),
                FormulaToken::Bool(b) => Operand::leaf(if *b { "TRUE" } else { "FALSE" }.to_string()),
                FormulaToken::Int(n) => Operand::leaf(n.to_string()),
                FormulaToken::Number(n) => Operand::leaf(n.to_string()),
                FormulaToken::AttrSum => {
                    let operand = pop(&mut stack, 1)?.remove(0);
                    Operand::leaf(format!("SUM({})", operand.text))
                },
                FormulaToken::Function { index, args } => self.call(&mut stack, *index, *args)?,
                FormulaToken::Name(index) => Operand::leaf(self.name_text(*index)),
                FormulaToken::NameX { sheet, index } => Operand::leaf(self.extern_name_text(sheet, *index)),
                FormulaToken::Ref(cell) => Operand::leaf(cell.to_string()),
                FormulaToken::Area(area) => Operand::leaf(area.render(version)),
                FormulaToken::RefErr | FormulaToken::AreaErr => Operand::leaf(ErrorCode::Ref.to_string()),
                FormulaToken::Ref3d { sheet, cell } => Operand::leaf(match self.sheet_prefix(sheet) {
                    Some(prefix) => format!("{}{}", prefix, cell),
                    None => ErrorCode::Ref.to_string(),
                }),
                FormulaToken::Area3d { sheet, area } => Operand::leaf(match self.sheet_prefix(sheet) {
                    Some(prefix) => format!("{}{}", prefix, area.render(version)),
                    None => ErrorCode::Ref.to_string(),
                }),
                FormulaToken::RefErr3d(sheet) | FormulaToken::AreaErr3d(sheet) => {
                    let prefix = self.sheet_prefix(sheet).unwrap_or_default();
                    Operand::leaf(format!("{}{}", prefix, ErrorCode::Ref))
                },
            };
            if operand.text.len() > MAX_FORMULA_LEN {
                return Err(FormulaError::TooLong);
            }
            stack.push(operand);
        }

        match stack.len() {
            1 => Ok(stack.remove(0).text),
            n => Err(FormulaError::Unbalanced(n)),
        }
    }

    fn call(&self, stack: &mut Vec<Operand>, index: u16, args: Option<u8>) -> Result<Operand> {
        let info = functions::lookup(index);
        let count = match (args, info) {
            (Some(n), _) => usize::from(n),
            (None, Some(info)) => usize::from(info.min_args),
            (None, None) => return Err(FormulaError::UnknownFunction { index }),
        };
        let mut operands = pop(stack, count)?;
        let name = if index == USER_DEFINED_FUNCTION && args.is_some() {
            // The callee is the first argument, usually an add-in name
            if operands.is_empty() {
                return Err(FormulaError::MissingOperands {
                    needed: 1,
                    available: 0,
                });
            }
            operands.remove(0).text
        } else {
            info.map_or_else(|| format!("FUNC{}", index), |info| info.name.to_string())
        };
        let arguments: Vec<&str> = operands.iter().map(|o| o.text.as_str()).collect();
        Ok(Operand::leaf(format!("{}({})", name, arguments.join(","))))
    }

    fn name_text(&self, index: u16) -> String {
        usize::from(index)
            .checked_sub(1)
            .and_then(|i| self.names.get(i))
            .filter(|n| !n.name.is_empty())
            .map_or_else(|| ErrorCode::Name.to_string(), |n| n.name.clone())
    }

    fn extern_name_text(&self, sheet: &SheetRef, index: u16) -> String {
        let unknown = || ErrorCode::Name.to_string();
        let slot = match usize::from(index).checked_sub(1) {
            Some(slot) => slot,
            None => return unknown(),
        };
        match *sheet {
            SheetRef::Extern(extern_index) => {
                let supbook = self
                    .extern_sheets
                    .get(usize::from(extern_index))
                    .and_then(|entry| self.supbooks.get(usize::from(entry.supbook)));
                match supbook {
                    Some(SupBook::Internal) => self.name_text(index),
                    Some(SupBook::AddIn { names }) => names.get(slot).cloned().unwrap_or_else(unknown),
                    Some(SupBook::External { path, names, .. }) => names
                        .get(slot)
                        .map_or_else(unknown, |name| format!("{}!{}", quote_sheet(path), name)),
                    None => unknown(),
                }
            },
            SheetRef::Biff5 { extern_index, .. } if extern_index < 0 => self.name_text(index),
            SheetRef::Biff5 { .. } => unknown(),
        }
    }

    /// `Sheet!` prefix of a 3D reference, empty for "the formula's own
    /// sheet" and `None` when the sheets cannot be resolved.
    fn sheet_prefix(&self, sheet: &SheetRef) -> Option<String> {
        match *sheet {
            SheetRef::Extern(index) => {
                let entry = self.extern_sheets.get(usize::from(index))?;
                match self.supbooks.get(usize::from(entry.supbook))? {
                    SupBook::Internal => match (entry.first, entry.last) {
                        (0xFFFE, 0xFFFE) => Some(String::new()),
                        (0xFFFF, _) | (_, 0xFFFF) => None,
                        (first, last) => self.local_prefix(usize::from(first), usize::from(last)),
                    },
                    SupBook::AddIn { .. } => Some(String::new()),
                    SupBook::External { path, sheets, .. } => {
                        let first = sheets.get(usize::from(entry.first))?;
                        let last = sheets.get(usize::from(entry.last))?;
                        Some(sheet_range_prefix(Some(path), first, last))
                    },
                }
            },
            SheetRef::Biff5 {
                extern_index,
                first,
                last,
            } => {
                if extern_index > 0 {
                    return None;
                }
                let first = usize::try_from(first).ok()?;
                let last = usize::try_from(last).ok()?;
                self.local_prefix(first, last)
            },
        }
    }

    fn local_prefix(&self, first: usize, last: usize) -> Option<String> {
        let first = self.sheet_names.get(first)?;
        let last = self.sheet_names.get(last)?;
        Some(sheet_range_prefix(None, first, last))
    }
}

fn pop(stack: &mut Vec<Operand>, count: usize) -> Result<Vec<Operand>> {
    if stack.len() < count {
        return Err(FormulaError::MissingOperands {
            needed: count,
            available: stack.len(),
        });
    }
    Ok(stack.split_off(stack.len() - count))
}

/// Whether a sheet name has to be quoted inside a reference.
fn needs_quoting(name: &str) -> bool {
    name.is_empty()
        || name.starts_with(|c: char| c.is_ascii_digit())
        || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        || utils::parse_cell_reference(name).is_some()
}

fn quote_sheet(name: &str) -> String {
    if needs_quoting(name) {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

/// `Sheet!`, `First:Last!` or `[Book]Sheet!`, quoted as a whole when any
/// part needs it.
fn sheet_range_prefix(book: Option<&str>, first: &str, last: &str) -> String {
    let mut raw = String::new();
    if let Some(book) = book {
        raw.push('[');
        raw.push_str(book);
        raw.push(']');
    }
    raw.push_str(first);
    if last != first {
        raw.push(':');
        raw.push_str(last);
    }
    let quote = book.is_some_and(needs_quoting) || needs_quoting(first) || needs_quoting(last);
    if quote {
        format!("'{}'!", raw.replace('\'', "''"))
    } else {
        format!("{}!", raw)
    }
}
