//! xls-salvage - A defensive reader for legacy Microsoft Excel (.xls) workbooks
//!
//! This library decodes BIFF5/7 and BIFF8 workbooks stored in OLE2 compound
//! files, treating every byte of the input as potentially hostile. It salvages
//! whatever is decodable and reports what could not be trusted.
//!
//! # Features
//!
//! - **Compound file reader**: FAT, Mini-FAT and DIFAT chains with bounded,
//!   cycle-checked traversal; flattened directory with path lookup
//! - **Record decoder**: lazy BIFF record sequence with transparent
//!   `CONTINUE` merging and substream boundaries
//! - **Workbook builder**: sheets, shared strings, number formats and sparse
//!   cell grids with range-checked coordinates
//! - **Soft truncation**: cut-off files yield partial results flagged as
//!   truncated instead of errors
//!
//! # Example - Reading a workbook
//!
//! ```no_run
//! use xls_salvage::{CellValue, open_workbook};
//!
//! # fn main() -> Result<(), xls_salvage::Error> {
//! let workbook = open_workbook("legacy.xls")?;
//! for sheet in workbook.sheets() {
//!     println!("{}: {} x {}", sheet.name(), sheet.nrows(), sheet.ncols());
//!     for cell in sheet.cells() {
//!         match &cell.value {
//!             CellValue::Number(n) => println!("{} = {}", cell.coordinate(), n),
//!             CellValue::Text(text) => {
//!                 println!("{} = {:?}", cell.coordinate(), workbook.resolve_text(text))
//!             },
//!             _ => {},
//!         }
//!     }
//! }
//! for warning in workbook.warnings() {
//!     eprintln!("warning: {}", warning);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Low-level container access
//!
//! ```no_run
//! use xls_salvage::ole::CompoundFile;
//! use xls_salvage::ole::xls::records::RecordIter;
//!
//! # fn main() -> Result<(), xls_salvage::Error> {
//! let data = std::fs::read("legacy.xls")?;
//! let cfb = CompoundFile::parse(&data)?;
//! let stream = cfb.open_stream("Workbook")?;
//! for record in RecordIter::new(stream.data()) {
//!     let record = record?;
//!     println!("0x{:04X}: {} bytes", record.record_type, record.data().len());
//! }
//! # Ok(())
//! # }
//! ```

/// Common types and utilities shared by the container and record layers
pub mod common;

/// OLE2 compound file reader and the XLS record layer
pub mod ole;

pub use common::{Error, Result};
pub use ole::CompoundFile;
pub use ole::xls::{Cell, CellText, CellValue, DefinedName, FormulaError, ParseOptions, Sheet, Warning, Workbook};

/// Decode a workbook held in memory with default options.
pub fn parse_workbook(data: &[u8]) -> Result<Workbook> {
    Workbook::parse(data, &ParseOptions::default())
}

/// Decode a workbook held in memory.
pub fn parse_workbook_with_options(data: &[u8], options: &ParseOptions) -> Result<Workbook> {
    Workbook::parse(data, options)
}

/// Read a file into memory and decode it with default options.
pub fn open_workbook<P: AsRef<std::path::Path>>(path: P) -> Result<Workbook> {
    let data = std::fs::read(path)?;
    parse_workbook(&data)
}
