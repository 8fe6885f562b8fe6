//! Row and column windowing shared by the decoders.

/// Extent of the data actually materialized by a decode.
///
/// Recomputed on every prepare; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeWindow {
    /// 0-based index of the first selected row
    pub first_row: usize,
    /// Number of rows selected
    pub rows: usize,
    /// Number of output columns, including a synthesized index column
    pub cols: usize,
}

impl DecodeWindow {
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Rows to decode when at most `lines` are requested.
    pub fn rows_limited(&self, lines: Option<usize>) -> usize {
        lines.map_or(self.rows, |n| n.min(self.rows))
    }
}

/// Select rows `start..=end` (1-based, `end == -1` meaning "to the end")
/// out of `total`.
///
/// Returns `(first_row, count)` or `None` when `start` lies beyond the data.
/// A `start` below 1 is treated as 1.
pub fn select_range(start: i64, end: i64, total: usize) -> Option<(usize, usize)> {
    let start = start.max(1) as u64;
    let total = total as u64;
    if start > total {
        return None;
    }
    let last = if end < 0 { total } else { (end as u64).min(total) };
    let count = (last + 1).saturating_sub(start);
    Some(((start - 1) as usize, count as usize))
}
