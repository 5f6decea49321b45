/// Options controlling how much damage a parse tolerates and what it keeps.
///
/// # Examples
///
/// ```rust
/// use xls_salvage::ParseOptions;
///
/// // Create with defaults
/// let options = ParseOptions::default();
///
/// // Or customize
/// let options = ParseOptions::new()
///     .with_ignore_workbook_corruption(true)
///     .with_blank_cells(true)
///     .with_max_warnings(50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Read a workbook stream whose sectors are also claimed by container
    /// structures instead of failing with `CorruptContainer`
    pub ignore_workbook_corruption: bool,
    /// Keep BLANK/MULBLANK cells as `CellValue::Empty`
    pub include_blank_cells: bool,
    /// Warnings stored on the workbook; the rest are only counted
    pub max_warnings: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            ignore_workbook_corruption: false,
            include_blank_cells: false,
            max_warnings: 1000,
        }
    }
}

impl ParseOptions {
    /// Create a new `ParseOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether sector sharing between the workbook stream and container
    /// structures is tolerated.
    ///
    /// Tolerated overlaps are reported as
    /// [`Warning::SectorOverlap`](crate::ole::xls::Warning::SectorOverlap).
    #[inline]
    pub fn with_ignore_workbook_corruption(mut self, ignore: bool) -> Self {
        self.ignore_workbook_corruption = ignore;
        self
    }

    /// Set whether blank cells are kept in the grid.
    ///
    /// Kept blanks count toward the sheet dimensions.
    #[inline]
    pub fn with_blank_cells(mut self, include: bool) -> Self {
        self.include_blank_cells = include;
        self
    }

    #[inline]
    pub fn with_max_warnings(mut self, max: usize) -> Self {
        self.max_warnings = max;
        self
    }
}
