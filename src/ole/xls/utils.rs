//! Utility functions for XLS parsing

/// Convert an RK value to f64
///
/// RK values are compressed numbers: bit 0 marks a 30-bit signed integer
/// (otherwise the upper 30 bits are the top of an IEEE 754 double), bit 1
/// marks a value that was multiplied by 100.
pub fn rk_to_f64(rk: u32) -> f64 {
    let d100 = rk & 0x02 != 0;
    let value = if rk & 0x01 != 0 {
        f64::from((rk as i32) >> 2)
    } else {
        f64::from_bits(u64::from(rk & 0xFFFF_FFFC) << 32)
    };

    if d100 { value / 100.0 } else { value }
}

/// Convert a 1-based column number to its Excel name (1 = A, 27 = AA).
pub fn column_index_to_name(mut col: u32) -> String {
    let mut name = String::new();

    while col > 0 {
        col -= 1;
        let ch = (b'A' + (col % 26) as u8) as char;
        name.insert(0, ch);
        col /= 26;
    }

    name
}

/// Convert Excel column name to column index (A=0, B=1, ..., Z=25, AA=26, etc.)
pub fn column_name_to_index(name: &str) -> Option<u32> {
    if name.is_empty() {
        return None;
    }
    let mut result: u32 = 0;

    for ch in name.chars() {
        let ch = ch.to_ascii_uppercase();
        if !ch.is_ascii_uppercase() {
            return None;
        }
        result = result
            .checked_mul(26)?
            .checked_add(ch as u32 - 'A' as u32 + 1)?;
    }

    Some(result - 1)
}

/// Convert row and column to Excel cell reference (e.g., "A1", "B2")
pub fn cell_reference(row: u32, col: u32) -> String {
    format!(
        "{}{}",
        column_index_to_name(col.saturating_add(1)),
        u64::from(row) + 1
    )
}

/// Parse Excel cell reference to row and column indices
pub fn parse_cell_reference(ref_str: &str) -> Option<(u32, u32)> {
    let split = ref_str.find(|c: char| c.is_ascii_digit())?;
    let (col_str, row_str) = ref_str.split_at(split);
    if col_str.is_empty() || !row_str.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let col = column_name_to_index(col_str)?;
    let row: u32 = row_str.parse().ok()?;

    Some((row.checked_sub(1)?, col))
}
