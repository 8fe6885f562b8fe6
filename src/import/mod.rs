//! Import decoders
//!
//! A decoder reads an external byte stream and materializes it as typed
//! columns of a [`DataSink`]. Every decode runs the same sequence:
//!
//! 1. **Pre-scan** - a full pass over the source counts the available rows.
//!    Sources may be compressed, so the count cannot be derived from a
//!    length.
//! 2. **Prepare** - the row window (`startRow`..`endRow`) and column extent
//!    are derived from the count. An empty selection ends the decode.
//! 3. **Read** - a second pass decodes the selected rows into staging
//!    buffers obtained from [`DataSink::prepare_import`], reporting progress
//!    after each row.
//! 4. **Finalize** - the buffers are handed back through
//!    [`DataSink::finalize_import`].
//!
//! Preview shares the window logic but produces row-major strings instead
//! of writing to a sink.
//!
//! Failures never cross this boundary as errors: an empty selection or an
//! unopenable source is reported as an [`ImportOutcome`] from
//! [`FileFilter::read_into`] and as a single placeholder row from
//! [`FileFilter::preview`].

pub mod ascii;
pub mod attributes;
pub mod binary;
pub mod progress;
pub mod source;
pub mod window;

pub use ascii::{AsciiFilter, AsciiSettings};
pub use attributes::AttributeSet;
pub use binary::{BinaryFilter, BinarySettings};
pub use progress::{channel_reporter, ProgressReporter};
pub use source::{ByteSource, FileSource, MemorySource};
pub use window::DecodeWindow;

use crate::column::ColumnRef;
use crate::error::Result;
use crate::sink::DataSink;
use crate::types::ImportMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Preview row shown when the window selects nothing.
pub const NO_DATA_PLACEHOLDER: &str = "no data to import";

/// Single placeholder row for a source that could not be opened.
pub fn unavailable_placeholder(reason: impl fmt::Display) -> Vec<Vec<String>> {
    vec![vec![format!("could not open source: {}", reason)]]
}

/// Single placeholder row for an empty selection.
pub fn empty_placeholder() -> Vec<Vec<String>> {
    vec![vec![NO_DATA_PLACEHOLDER.to_string()]]
}

/// Result of [`FileFilter::read_into`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Rows were committed to the sink.
    Imported {
        rows: usize,
        columns: usize,
        column_offset: usize,
    },
    /// The window selected no rows; the sink was cleared.
    Empty,
    /// The source could not be opened or read.
    SourceUnavailable(String),
}

impl ImportOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self, ImportOutcome::Imported { .. })
    }

    pub fn rows(&self) -> usize {
        match self {
            ImportOutcome::Imported { rows, .. } => *rows,
            _ => 0,
        }
    }
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportOutcome::Imported {
                rows,
                columns,
                column_offset,
            } => write!(
                f,
                "imported {} rows into {} columns starting at column {}",
                rows,
                columns,
                column_offset + 1
            ),
            ImportOutcome::Empty => write!(f, "{}", NO_DATA_PLACEHOLDER),
            ImportOutcome::SourceUnavailable(reason) => {
                write!(f, "could not open source: {}", reason)
            }
        }
    }
}

/// Decoder family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Binary,
    Ascii,
}

impl FilterKind {
    /// Guess from a file name: `.bin`/`.raw` (optionally `.gz`) are binary,
    /// everything else is treated as text.
    pub fn guess(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        if name.ends_with(".bin") || name.ends_with(".raw") {
            FilterKind::Binary
        } else {
            FilterKind::Ascii
        }
    }

    /// New decoder of this kind with default settings.
    pub fn create(self) -> Box<dyn FileFilter> {
        match self {
            FilterKind::Binary => Box::new(BinaryFilter::new()),
            FilterKind::Ascii => Box::new(AsciiFilter::new()),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Binary => write!(f, "binary"),
            FilterKind::Ascii => write!(f, "ascii"),
        }
    }
}

/// Common interface of the import decoders.
pub trait FileFilter {
    fn kind(&self) -> FilterKind;

    /// Decode `source` into `sink`, reading at most `lines` rows.
    fn read_into(
        &mut self,
        source: &dyn ByteSource,
        sink: &mut dyn DataSink,
        mode: ImportMode,
        lines: Option<usize>,
        progress: &mut ProgressReporter<'_>,
    ) -> ImportOutcome;

    /// Decode at most `lines` rows as strings, one inner vector per row.
    fn preview(&mut self, source: &dyn ByteSource, lines: usize) -> Vec<Vec<String>>;

    /// Export `columns` to `target`.
    fn write(&self, columns: &[ColumnRef], target: &Path) -> Result<()>;

    /// Store the settings as attributes.
    fn save(&self, attributes: &mut AttributeSet);

    /// Restore the settings. Never fails; returns a warning per attribute
    /// that was missing or invalid and therefore defaulted.
    fn load(&mut self, attributes: &AttributeSet) -> Vec<String>;
}
