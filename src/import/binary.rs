//! Binary decoder
//!
//! A binary source is a sequence of fixed-size records, optionally preceded
//! by `skip_start_bytes` bytes of header. Each record holds `vectors`
//! elements of one [`DataType`]; every element may be preceded by
//! `skip_bytes` padding bytes. Element `j` of a record becomes column `j`
//! (shifted by one when an index column is synthesized).

use crate::column::ColumnRef;
use crate::error::Result;
use crate::import::attributes::AttributeSet;
use crate::import::progress::{ProgressReporter, RowProgress};
use crate::import::source::{skip_bytes, ByteSource};
use crate::import::window::{select_range, DecodeWindow};
use crate::import::{empty_placeholder, unavailable_placeholder, FileFilter, FilterKind, ImportOutcome};
use crate::sink::{DataSink, ImportCommit};
use crate::types::{ByteOrder, ColumnMode, DataType, ImportMode, MISSING_VALUE};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::path::Path;

/// Layout and window of a binary decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinarySettings {
    /// Elements per record
    pub vectors: usize,
    pub data_type: DataType,
    pub byte_order: ByteOrder,
    /// First row to read, 1-based
    pub start_row: i64,
    /// Last row to read, 1-based and inclusive; `-1` reads to the end
    pub end_row: i64,
    /// Header bytes before the first record
    pub skip_start_bytes: usize,
    /// Padding bytes before every element
    pub skip_bytes: usize,
    /// Synthesize a leading 1-based index column
    pub create_index: bool,
    /// Persisted for front ends that guess the layout; not used when decoding
    pub auto_mode: bool,
}

impl Default for BinarySettings {
    fn default() -> Self {
        Self {
            vectors: 2,
            data_type: DataType::Int8,
            byte_order: ByteOrder::LittleEndian,
            start_row: 1,
            end_row: -1,
            skip_start_bytes: 0,
            skip_bytes: 0,
            create_index: false,
            auto_mode: false,
        }
    }
}

impl BinarySettings {
    /// Bytes occupied by one record including padding, or `None` when the
    /// layout overflows `usize`.
    pub fn record_size(&self) -> Option<usize> {
        self.data_type
            .size_bytes()
            .checked_add(self.skip_bytes)?
            .checked_mul(self.vectors)
    }
}

/// Result of the row-count pre-scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowScan {
    /// Total bytes in the (decompressed) source
    pub total_bytes: u64,
    /// Complete records after the header
    pub rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct BinaryFilter {
    settings: BinarySettings,
    window: DecodeWindow,
}

impl BinaryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: BinarySettings) -> Self {
        Self {
            settings,
            window: DecodeWindow::default(),
        }
    }

    pub fn settings(&self) -> &BinarySettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut BinarySettings {
        &mut self.settings
    }

    /// Window derived by the most recent prepare.
    pub fn window(&self) -> DecodeWindow {
        self.window
    }

    pub fn actual_rows(&self) -> usize {
        self.window.rows
    }

    pub fn actual_cols(&self) -> usize {
        self.window.cols
    }

    /// Stream the whole source and count complete records after the header.
    /// A trailing partial record is ignored.
    pub fn row_count(&self, source: &dyn ByteSource) -> io::Result<RowScan> {
        let mut reader = source.open()?;
        let total_bytes = io::copy(&mut reader, &mut io::sink())?;
        let Some(record) = self.settings.record_size().map(|r| r as u64) else {
            tracing::warn!(
                "{}: {} vectors with {} padding bytes overflow the record size",
                source.label(),
                self.settings.vectors,
                self.settings.skip_bytes
            );
            return Ok(RowScan { total_bytes, rows: 0 });
        };
        let payload = total_bytes.saturating_sub(self.settings.skip_start_bytes as u64);
        let rows = if record == 0 { 0 } else { (payload / record) as usize };
        tracing::debug!(
            "{}: {} bytes, {} records of {} bytes",
            source.label(),
            total_bytes,
            rows,
            record
        );
        Ok(RowScan { total_bytes, rows })
    }

    /// Pre-scan and derive the decode window. `Ok(None)` is an empty
    /// selection.
    pub fn prepare(&mut self, source: &dyn ByteSource) -> io::Result<Option<DecodeWindow>> {
        self.window = DecodeWindow::default();
        let scan = self.row_count(source)?;
        let s = &self.settings;

        if s.skip_start_bytes as u64 > scan.total_bytes {
            tracing::warn!(
                "{}: skipping {} start bytes exceeds the {} available",
                source.label(),
                s.skip_start_bytes,
                scan.total_bytes
            );
            return Ok(None);
        }
        let Some((first_row, rows)) = select_range(s.start_row, s.end_row, scan.rows) else {
            tracing::warn!(
                "{}: start row {} is beyond the {} available rows",
                source.label(),
                s.start_row,
                scan.rows
            );
            return Ok(None);
        };
        if rows == 0 {
            tracing::warn!("{}: rows {}..{} select nothing", source.label(), s.start_row, s.end_row);
            return Ok(None);
        }

        self.window = DecodeWindow {
            first_row,
            rows,
            cols: s.vectors + usize::from(s.create_index),
        };
        tracing::debug!("{}: decode window {:?}", source.label(), self.window);
        Ok(Some(self.window))
    }

    /// Decode `rows` records of `window`, calling `visit` with the 0-based
    /// row number and the record's values. Returns the rows decoded, which
    /// is less than `rows` only if the source shrank since the pre-scan.
    fn decode_rows(
        &self,
        source: &dyn ByteSource,
        window: DecodeWindow,
        rows: usize,
        mut visit: impl FnMut(usize, &[f64]),
    ) -> io::Result<usize> {
        let s = &self.settings;
        let mut reader = source.open()?;
        skip_bytes(&mut reader, s.skip_start_bytes as u64)?;
        let offset = s
            .record_size()
            .and_then(|record| record.checked_mul(window.first_row))
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "record offset overflows"))?;
        skip_bytes(&mut reader, offset as u64)?;

        let width = s.data_type.size_bytes();
        let mut element = [0u8; 8];
        let mut values = vec![MISSING_VALUE; s.vectors];
        for row in 0..rows {
            for value in values.iter_mut() {
                let read = skip_bytes(&mut reader, s.skip_bytes as u64)
                    .and_then(|_| reader.read_exact(&mut element[..width]));
                if let Err(e) = read {
                    tracing::warn!("{}: source ended at row {}: {}", source.label(), row + 1, e);
                    return Ok(row);
                }
                *value = s
                    .data_type
                    .decode(&element[..width], s.byte_order)
                    .unwrap_or(MISSING_VALUE);
            }
            visit(row, &values);
        }
        Ok(rows)
    }

    fn column_layout(&self) -> (Vec<String>, Vec<ColumnMode>) {
        let mut names = Vec::with_capacity(self.window.cols);
        let mut modes = Vec::with_capacity(self.window.cols);
        if self.settings.create_index {
            names.push("index".to_string());
            modes.push(ColumnMode::Integer);
        }
        for i in 0..self.settings.vectors {
            names.push((i + 1).to_string());
            modes.push(ColumnMode::Double);
        }
        (names, modes)
    }
}

impl FileFilter for BinaryFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Binary
    }

    fn read_into(
        &mut self,
        source: &dyn ByteSource,
        sink: &mut dyn DataSink,
        mode: ImportMode,
        lines: Option<usize>,
        progress: &mut ProgressReporter<'_>,
    ) -> ImportOutcome {
        let window = match self.prepare(source) {
            Ok(Some(window)) => window,
            Ok(None) => {
                sink.clear();
                return ImportOutcome::Empty;
            }
            Err(e) => {
                tracing::warn!("Could not open {}: {}", source.label(), e);
                return ImportOutcome::SourceUnavailable(e.to_string());
            }
        };

        let rows = window.rows_limited(lines);
        let (names, modes) = self.column_layout();
        let mut buffers = Vec::new();
        let column_offset = sink.prepare_import(&mut buffers, mode, rows, window.cols, &names, &modes);

        let index = usize::from(self.settings.create_index);
        let mut reporter = RowProgress::new(window.rows, progress);
        let decoded = self.decode_rows(source, window, rows, |row, values| {
            if index == 1 {
                if let Some(column) = buffers.first_mut() {
                    column.set_value_at(row, (row + 1) as f64);
                }
            }
            for (buffer, &value) in buffers.iter_mut().skip(index).zip(values) {
                buffer.set_value_at(row, value);
            }
            reporter.row_done(row + 1);
        });
        let rows = match decoded {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("Could not read {}: {}", source.label(), e);
                return ImportOutcome::SourceUnavailable(e.to_string());
            }
        };

        sink.finalize_import(
            buffers,
            ImportCommit {
                column_offset,
                start_column: 0,
                end_column: window.cols - 1,
                rows,
                source_label: source.label(),
                mode,
            },
        );
        ImportOutcome::Imported {
            rows,
            columns: window.cols,
            column_offset,
        }
    }

    fn preview(&mut self, source: &dyn ByteSource, lines: usize) -> Vec<Vec<String>> {
        let window = match self.prepare(source) {
            Ok(Some(window)) => window,
            Ok(None) => return empty_placeholder(),
            Err(e) => return unavailable_placeholder(e),
        };

        let rows = window.rows_limited(Some(lines));
        let create_index = self.settings.create_index;
        let mut out = Vec::with_capacity(rows);
        let decoded = self.decode_rows(source, window, rows, |row, values| {
            let mut line = Vec::with_capacity(window.cols);
            if create_index {
                line.push((row + 1).to_string());
            }
            line.extend(values.iter().map(|v| v.to_string()));
            out.push(line);
        });
        match decoded {
            Ok(_) => out,
            Err(e) => unavailable_placeholder(e),
        }
    }

    fn write(&self, _columns: &[ColumnRef], target: &Path) -> Result<()> {
        tracing::debug!("Binary export to {} is not supported, nothing written", target.display());
        Ok(())
    }

    fn save(&self, attributes: &mut AttributeSet) {
        let s = &self.settings;
        attributes.set("vectors", s.vectors);
        attributes.set("dataType", s.data_type.ordinal());
        attributes.set("byteOrder", s.byte_order.ordinal());
        attributes.set_flag("autoMode", s.auto_mode);
        attributes.set("startRow", s.start_row);
        attributes.set("endRow", s.end_row);
        attributes.set("skipStartBytes", s.skip_start_bytes);
        attributes.set("skipBytes", s.skip_bytes);
        attributes.set_flag("createIndex", s.create_index);
    }

    fn load(&mut self, attributes: &AttributeSet) -> Vec<String> {
        let d = BinarySettings::default();
        let mut warnings = Vec::new();
        let w = &mut warnings;
        self.settings = BinarySettings {
            vectors: attributes.read_with("vectors", d.vectors, w, |v| {
                usize::try_from(v).ok().filter(|&v| v > 0)
            }),
            data_type: attributes.read_with("dataType", d.data_type, w, DataType::from_ordinal),
            byte_order: attributes.read_with("byteOrder", d.byte_order, w, ByteOrder::from_ordinal),
            auto_mode: attributes.read_flag("autoMode", d.auto_mode, w),
            start_row: attributes.read("startRow", d.start_row, w),
            end_row: attributes.read("endRow", d.end_row, w),
            skip_start_bytes: attributes.read("skipStartBytes", d.skip_start_bytes, w),
            skip_bytes: attributes.read("skipBytes", d.skip_bytes, w),
            create_index: attributes.read_flag("createIndex", d.create_index, w),
        };
        if self.settings.record_size().is_none() {
            let message = format!(
                "Attributes 'vectors' ({}) and 'skipBytes' ({}) overflow the record size, using defaults {} and {}",
                self.settings.vectors, self.settings.skip_bytes, d.vectors, d.skip_bytes
            );
            tracing::warn!("{}", message);
            warnings.push(message);
            self.settings.vectors = d.vectors;
            self.settings.skip_bytes = d.skip_bytes;
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::source::MemorySource;

    fn int32_records(records: &[[i32; 2]], order: ByteOrder) -> MemorySource {
        let bytes: Vec<u8> = records
            .iter()
            .flatten()
            .flat_map(|v| match order {
                ByteOrder::BigEndian => v.to_be_bytes(),
                ByteOrder::LittleEndian => v.to_le_bytes(),
            })
            .collect();
        MemorySource::new(bytes)
    }

    fn int32_filter() -> BinaryFilter {
        BinaryFilter::with_settings(BinarySettings {
            data_type: DataType::Int32,
            ..Default::default()
        })
    }

    #[test]
    fn test_defaults() {
        let s = BinarySettings::default();
        assert_eq!(s.vectors, 2);
        assert_eq!(s.data_type, DataType::Int8);
        assert_eq!(s.byte_order, ByteOrder::LittleEndian);
        assert_eq!((s.start_row, s.end_row), (1, -1));
    }

    #[test]
    fn test_row_count_ignores_partial_record() {
        let filter = int32_filter();
        let mut bytes = int32_records(&[[1, 2], [3, 4]], ByteOrder::LittleEndian).bytes().to_vec();
        bytes.extend_from_slice(&[0; 7]);
        let scan = filter.row_count(&MemorySource::new(bytes)).unwrap();
        assert_eq!(scan.rows, 2);
        assert_eq!(scan.total_bytes, 23);
    }

    #[test]
    fn test_prepare_window() {
        let mut filter = int32_filter();
        filter.settings_mut().create_index = true;
        filter.settings_mut().start_row = 2;
        filter.settings_mut().end_row = 3;
        let source = int32_records(&[[0, 0]; 5], ByteOrder::LittleEndian);
        let window = filter.prepare(&source).unwrap().unwrap();
        assert_eq!(window, DecodeWindow { first_row: 1, rows: 2, cols: 3 });
    }

    #[test]
    fn test_skip_start_beyond_data_is_empty() {
        let mut filter = int32_filter();
        filter.settings_mut().skip_start_bytes = 100;
        let source = int32_records(&[[1, 2]], ByteOrder::LittleEndian);
        assert_eq!(filter.prepare(&source).unwrap(), None);
        assert_eq!(filter.preview(&source, 10), empty_placeholder());
    }

    #[test]
    fn test_preview_honours_byte_order_and_window() {
        let mut filter = int32_filter();
        filter.settings_mut().byte_order = ByteOrder::BigEndian;
        filter.settings_mut().start_row = 2;
        let source = int32_records(&[[1, -1], [2, -2], [3, -3]], ByteOrder::BigEndian);
        assert_eq!(
            filter.preview(&source, 10),
            vec![vec!["2".to_string(), "-2".to_string()], vec!["3".to_string(), "-3".to_string()]]
        );
    }

    #[test]
    fn test_skip_bytes_between_values() {
        let mut filter = BinaryFilter::with_settings(BinarySettings {
            vectors: 2,
            data_type: DataType::UInt8,
            skip_start_bytes: 1,
            skip_bytes: 1,
            ..Default::default()
        });
        // header, then records of [pad, a, pad, b]
        let source = MemorySource::new(vec![0xff, 0, 1, 0, 2, 0, 3, 0, 4]);
        assert_eq!(
            filter.preview(&source, 10),
            vec![vec!["1".to_string(), "2".to_string()], vec!["3".to_string(), "4".to_string()]]
        );
    }

    #[test]
    fn test_write_is_noop() {
        let filter = BinaryFilter::new();
        assert!(filter.write(&[], Path::new("/nonexistent/out.bin")).is_ok());
    }

    #[test]
    fn test_overflowing_layout_is_rejected_on_load() {
        let mut attributes = AttributeSet::new();
        BinaryFilter::new().save(&mut attributes);
        attributes.set("skipBytes", usize::MAX);

        let mut filter = BinaryFilter::new();
        let warnings = filter.load(&attributes);
        assert_eq!(warnings.len(), 1);
        assert_eq!(filter.settings().skip_bytes, 0);
        assert_eq!(filter.settings().vectors, 2);

        let rows = filter.preview(&MemorySource::new(vec![0; 16]), 5);
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn test_overflowing_layout_is_an_empty_selection() {
        let mut filter = BinaryFilter::with_settings(BinarySettings {
            vectors: usize::MAX,
            skip_bytes: usize::MAX,
            ..Default::default()
        });
        let source = MemorySource::new(vec![0; 16]);
        assert_eq!(filter.settings().record_size(), None);
        assert_eq!(filter.row_count(&source).unwrap().rows, 0);
        assert_eq!(filter.preview(&source, 5), empty_placeholder());
    }
}
