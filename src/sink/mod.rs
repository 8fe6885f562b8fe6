//! Import destinations.
//!
//! A [`DataSink`] owns the columns an import fills. Decoders never touch
//! those columns directly: they ask the sink for staging buffers with
//! [`DataSink::prepare_import`], decode into them, and hand them back with
//! [`DataSink::finalize_import`], which commits them and notifies observers.

mod spreadsheet;

pub use spreadsheet::Spreadsheet;

use crate::column::ColumnValues;
use crate::types::{ColumnMode, ImportMode};

/// Parameters of a finished import, passed to [`DataSink::finalize_import`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCommit {
    /// Sink column the first staging buffer maps to
    pub column_offset: usize,
    /// First staging buffer to commit
    pub start_column: usize,
    /// Last staging buffer to commit (inclusive)
    pub end_column: usize,
    /// Number of rows actually decoded
    pub rows: usize,
    /// Human-readable name of the source, used as column comment
    pub source_label: String,
    pub mode: ImportMode,
}

/// Destination of an import.
pub trait DataSink {
    /// Allocate `cols` staging buffers of `rows` rows into `buffers`.
    ///
    /// Returns the sink column index that buffer 0 will land in.
    fn prepare_import(
        &mut self,
        buffers: &mut Vec<ColumnValues>,
        mode: ImportMode,
        rows: usize,
        cols: usize,
        names: &[String],
        modes: &[ColumnMode],
    ) -> usize;

    /// Commit staged buffers into the sink's columns.
    fn finalize_import(&mut self, buffers: Vec<ColumnValues>, commit: ImportCommit);

    /// Empty the sink after an import that produced nothing.
    fn clear(&mut self);
}
