//! Worksheet implementation for XLS files

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ole::xls::cell::{Cell, CellValue};
use crate::ole::xls::formula::SharedFormula;
use crate::ole::xls::records::{Dimensions, SheetKind, SheetVisibility};
use crate::ole::xls::utils;

static EMPTY: CellValue = CellValue::Empty;

/// One sheet of a workbook with its sparse cell grid.
///
/// Row and column counts cover the accepted cells only; the DIMENSION record
/// is kept separately in [`Sheet::declared_dimensions`] and never widens them.
#[derive(Debug, Clone, Serialize)]
pub struct Sheet {
    name: String,
    index: usize,
    kind: SheetKind,
    visibility: SheetVisibility,
    stream_offset: u32,
    cells: BTreeMap<(u32, u16), Cell>,
    nrows: u32,
    ncols: u32,
    declared_dimensions: Option<Dimensions>,
    formulas: BTreeMap<(u32, u16), Vec<u8>>,
    shared_formulas: BTreeMap<(u32, u16), SharedFormula>,
    truncated: bool,
}

impl Sheet {
    pub(crate) fn new(
        name: String,
        index: usize,
        kind: SheetKind,
        visibility: SheetVisibility,
        stream_offset: u32,
    ) -> Self {
        Sheet {
            name,
            index,
            kind,
            visibility,
            stream_offset,
            cells: BTreeMap::new(),
            nrows: 0,
            ncols: 0,
            declared_dimensions: None,
            formulas: BTreeMap::new(),
            shared_formulas: BTreeMap::new(),
            truncated: false,
        }
    }

    /// Add a cell whose coordinates were already checked against the grid.
    ///
    /// Replacing a cell drops the formula tokens stored for its position;
    /// a formula cell gets fresh ones through `set_formula_tokens`.
    pub(crate) fn insert(&mut self, cell: Cell) {
        self.nrows = self.nrows.max(cell.row + 1);
        self.ncols = self.ncols.max(u32::from(cell.col) + 1);
        self.formulas.remove(&(cell.row, cell.col));
        self.cells.insert((cell.row, cell.col), cell);
    }

    pub(crate) fn set_formula_tokens(&mut self, row: u32, col: u16, tokens: Vec<u8>) {
        self.formulas.insert((row, col), tokens);
    }

    /// Keep a SHRFMLA or ARRAY definition under its top-left cell; a later
    /// definition for the same cell replaces the earlier one.
    pub(crate) fn add_shared_formula(&mut self, formula: SharedFormula) {
        self.shared_formulas
            .insert((formula.first_row, formula.first_col), formula);
    }

    pub(crate) fn cell_mut(&mut self, row: u32, col: u16) -> Option<&mut Cell> {
        self.cells.get_mut(&(row, col))
    }

    pub(crate) fn set_declared_dimensions(&mut self, dimensions: Dimensions) {
        self.declared_dimensions = Some(dimensions);
    }

    pub(crate) fn mark_truncated(&mut self) {
        self.truncated = true;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the workbook's BOUNDSHEET order
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> SheetKind {
        self.kind
    }

    pub fn visibility(&self) -> SheetVisibility {
        self.visibility
    }

    /// Offset of the sheet's BOF record in the workbook stream
    pub fn stream_offset(&self) -> u32 {
        self.stream_offset
    }

    /// One past the highest row holding an accepted cell
    pub fn nrows(&self) -> u32 {
        self.nrows
    }

    /// One past the highest column holding an accepted cell
    pub fn ncols(&self) -> u32 {
        self.ncols
    }

    /// Used range claimed by the DIMENSION record, if any
    pub fn declared_dimensions(&self) -> Option<&Dimensions> {
        self.declared_dimensions.as_ref()
    }

    /// Whether the sheet's records ended early
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Value at a position, `Empty` for positions without a cell.
    pub fn cell_value(&self, row: u32, col: u16) -> &CellValue {
        self.cell(row, col).map_or(&EMPTY, |c| &c.value)
    }

    /// Cell at an A1-style reference such as `"B7"`.
    pub fn cell_by_reference(&self, reference: &str) -> Option<&Cell> {
        let (row, col) = utils::parse_cell_reference(reference)?;
        self.cell(row, u16::try_from(col).ok()?)
    }

    /// Cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Dense view of one row, `ncols` values wide.
    pub fn row(&self, row: u32) -> Vec<CellValue> {
        let mut values = vec![CellValue::Empty; self.ncols as usize];
        for ((_, col), cell) in self.cells.range((row, 0)..=(row, u16::MAX)) {
            if let Some(slot) = values.get_mut(usize::from(*col)) {
                *slot = cell.value.clone();
            }
        }
        values
    }

    /// Raw parsed-expression bytes of a formula cell.
    pub fn formula_tokens(&self, row: u32, col: u16) -> Option<&[u8]> {
        self.formulas.get(&(row, col)).map(Vec::as_slice)
    }

    /// Positions of the cells that carry formula tokens
    pub fn formula_positions(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        self.formulas.keys().copied()
    }

    /// Shared or array formula covering a cell, preferring one anchored there.
    pub fn shared_formula(&self, row: u32, col: u16) -> Option<&SharedFormula> {
        self.shared_formulas
            .get(&(row, col))
            .or_else(|| self.shared_formulas.values().rev().find(|f| f.contains(row, col)))
    }

    pub fn shared_formulas(&self) -> impl Iterator<Item = &SharedFormula> {
        self.shared_formulas.values()
    }
}
