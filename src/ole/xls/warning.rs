//! Soft diagnostics recorded while salvaging a workbook.

use serde::Serialize;
use thiserror::Error;

use crate::ole::sector::SectorOwner;

/// Locally bounded damage that did not stop decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Warning {
    /// Fewer bytes or records were available than declared
    #[error("{}truncated: {detail}", sheet_prefix(.sheet, " "))]
    Truncated {
        /// `None` for the workbook globals or the container
        sheet: Option<String>,
        detail: String,
    },

    /// A cell record addressed a position outside the BIFF grid
    #[error("sheet '{sheet}': cell at row {row} column {col} is outside the grid")]
    CellOutOfRange { sheet: String, row: u32, col: u32 },

    /// A LABELSST cell referenced a string the table does not hold
    #[error("sheet '{sheet}': cell at row {row} column {col} references shared string {index} of {table_len}")]
    SharedStringOutOfRange {
        sheet: String,
        row: u32,
        col: u16,
        index: u32,
        table_len: usize,
    },

    /// A record too short or inconsistent to decode was skipped
    #[error("{}malformed record 0x{record_type:04X} at offset {offset}", sheet_prefix(.sheet, ": "))]
    MalformedRecord {
        sheet: Option<String>,
        record_type: u16,
        offset: usize,
    },

    /// A BOUNDSHEET offset points outside the workbook stream
    #[error("sheet '{sheet}': stream offset {offset} is out of range")]
    SheetOffsetOutOfRange { sheet: String, offset: u32 },

    /// A BOUNDSHEET offset already decoded for an earlier sheet; the grid is left empty
    #[error("sheet '{sheet}': stream offset {offset} is already used by sheet '{first}'")]
    DuplicateSheetOffset { sheet: String, offset: u32, first: String },

    /// The record at a sheet offset is not the expected BOF
    #[error("sheet '{sheet}': {detail}")]
    UnexpectedSubstream { sheet: String, detail: String },

    /// A workbook stream sector also belongs to a container structure
    #[error("workbook stream sector {sector} is also used by the {owner}")]
    SectorOverlap { sector: u32, owner: SectorOwner },

    /// BOUNDSHEET kind the reader does not know; the grid is left empty
    #[error("sheet '{sheet}': unknown sheet kind 0x{kind:02X}")]
    UnknownSheetKind { sheet: String, kind: u8 },
}

fn sheet_prefix(sheet: &Option<String>, separator: &str) -> String {
    match sheet {
        Some(sheet) => format!("sheet '{}'{}", sheet, separator),
        None => String::new(),
    }
}
