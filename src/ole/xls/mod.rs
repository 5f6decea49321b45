//! Legacy Excel (.xls) file format reader
//!
//! Decodes the BIFF5/7 (`Book` stream) and BIFF8 (`Workbook` stream) record
//! streams of a compound file into sheets of sparse cell grids. Damage that
//! can be contained (a cut-off stream, a cell outside the grid, a dangling
//! shared-string index) is recorded as a [`Warning`] and decoding continues.

/// BIFF record framing and record payload decoding
pub mod records;

/// BIFF string forms and the shared string table
pub mod strings;

/// Number formats and cell styles
pub mod format;

/// Parsed-expression decoding and formula text
pub mod formula;

/// Built-in function table
pub mod functions;

/// Workbook parsing implementation
mod workbook;

/// Worksheet grid
mod worksheet;

/// Cell value representation
mod cell;

/// Parse options
mod options;

/// Soft diagnostics
mod warning;

/// Shared parsing utilities
pub mod utils;

#[cfg(test)]
mod tests;

pub use cell::{Cell, CellText, CellValue, ErrorCode, FormulaResult, SstIndex};
pub use format::{FormatTable, XfEntry};
pub use formula::{DefinedName, FormulaContext, FormulaError, SharedFormula, SharedFormulaKind};
pub use options::ParseOptions;
pub use records::{BiffVersion, SheetKind, SheetVisibility};
pub use strings::SharedStringTable;
pub use warning::Warning;
pub use workbook::Workbook;
pub use worksheet::Sheet;
