//! ASCII decoder
//!
//! Reads delimited or whitespace-separated text. Lines that are empty or
//! start with the comment character are ignored. The first remaining line
//! may be a header holding the column names. Column modes are detected from
//! the first selected data row.

use crate::column::{ColumnRef, ColumnValues, DEFAULT_DATETIME_FORMAT};
use crate::error::{Result, ResultExt};
use crate::import::attributes::AttributeSet;
use crate::import::progress::{ProgressReporter, RowProgress};
use crate::import::source::ByteSource;
use crate::import::window::{select_range, DecodeWindow};
use crate::import::{empty_placeholder, unavailable_placeholder, FileFilter, FilterKind, ImportOutcome};
use crate::sink::{DataSink, ImportCommit};
use crate::types::{ColumnMode, ImportMode, MISSING_VALUE};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsciiSettings {
    /// Lines starting with this are skipped; empty disables comments
    pub comment_character: String,
    /// `auto`, `TAB`, `SPACE` or a single character
    pub separating_character: String,
    /// The first non-comment line holds column names
    pub header: bool,
    /// Names for the selected columns, overriding the header
    pub vector_names: Vec<String>,
    pub skip_empty_parts: bool,
    /// Trim fields and collapse inner whitespace runs
    pub simplify_whitespaces: bool,
    pub remove_quotes: bool,
    pub create_index: bool,
    pub start_row: i64,
    pub end_row: i64,
    pub start_column: i64,
    pub end_column: i64,
    /// `chrono` format used to detect and parse date-time columns
    pub date_time_format: String,
}

impl Default for AsciiSettings {
    fn default() -> Self {
        Self {
            comment_character: "#".to_string(),
            separating_character: "auto".to_string(),
            header: true,
            vector_names: Vec::new(),
            skip_empty_parts: false,
            simplify_whitespaces: true,
            remove_quotes: false,
            create_index: false,
            start_row: 1,
            end_row: -1,
            start_column: 1,
            end_column: -1,
            date_time_format: DEFAULT_DATETIME_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Separator {
    Whitespace,
    Char(u8),
}

impl Separator {
    fn resolve(setting: &str, sample: &str) -> Self {
        match setting {
            "" | "auto" => Self::detect(sample),
            "TAB" => Separator::Char(b'\t'),
            "SPACE" | " " => Separator::Whitespace,
            other => match other.as_bytes() {
                [b] if b.is_ascii() => Separator::Char(*b),
                _ => {
                    tracing::warn!("Unsupported separator '{}', splitting on whitespace", other);
                    Separator::Whitespace
                }
            },
        }
    }

    fn detect(sample: &str) -> Self {
        [b'\t', b';', b',']
            .into_iter()
            .find(|&c| sample.as_bytes().contains(&c))
            .map_or(Separator::Whitespace, Separator::Char)
    }
}

/// Tokenized source content.
struct Table {
    names: Vec<String>,
    records: Vec<Vec<String>>,
    first_col: usize,
}

impl Table {
    fn field(&self, row: usize, col: usize) -> &str {
        self.records
            .get(row)
            .and_then(|r| r.get(self.first_col + col))
            .map_or("", String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AsciiFilter {
    settings: AsciiSettings,
    window: DecodeWindow,
}

impl AsciiFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: AsciiSettings) -> Self {
        Self {
            settings,
            window: DecodeWindow::default(),
        }
    }

    pub fn settings(&self) -> &AsciiSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut AsciiSettings {
        &mut self.settings
    }

    pub fn window(&self) -> DecodeWindow {
        self.window
    }

    fn read_text(source: &dyn ByteSource) -> io::Result<String> {
        let mut bytes = Vec::new();
        source.open()?.read_to_end(&mut bytes)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn content_lines<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let comment = self.settings.comment_character.as_str();
        text.lines()
            .filter(|line| {
                let trimmed = line.trim();
                !trimmed.is_empty() && (comment.is_empty() || !trimmed.starts_with(comment))
            })
            .collect()
    }

    fn tokenize(&self, lines: &[&str]) -> Vec<Vec<String>> {
        let Some(first) = lines.first() else {
            return Vec::new();
        };
        let separator = Separator::resolve(&self.settings.separating_character, first);
        tracing::debug!("Separator: {:?}", separator);

        let raw: Vec<Vec<String>> = match separator {
            Separator::Whitespace => lines
                .iter()
                .map(|line| {
                    line.split_whitespace()
                        .map(|t| {
                            if self.settings.remove_quotes {
                                t.trim_matches('"').to_string()
                            } else {
                                t.to_string()
                            }
                        })
                        .collect()
                })
                .collect(),
            Separator::Char(delimiter) => {
                let joined = lines.join("\n");
                csv::ReaderBuilder::new()
                    .delimiter(delimiter)
                    .has_headers(false)
                    .flexible(true)
                    .quoting(self.settings.remove_quotes)
                    .from_reader(joined.as_bytes())
                    .records()
                    .filter_map(|r| match r {
                        Ok(record) => Some(record.iter().map(str::to_string).collect()),
                        Err(e) => {
                            tracing::warn!("Skipping malformed line: {}", e);
                            None
                        }
                    })
                    .collect()
            }
        };

        raw.into_iter()
            .map(|fields: Vec<String>| {
                fields
                    .into_iter()
                    .map(|f| {
                        if self.settings.simplify_whitespaces {
                            f.split_whitespace().collect::<Vec<_>>().join(" ")
                        } else {
                            f
                        }
                    })
                    .filter(|f| !(self.settings.skip_empty_parts && f.is_empty()))
                    .collect()
            })
            .collect()
    }

    /// Tokenize the source and derive the decode window. `Ok(None)` is an
    /// empty selection.
    fn prepare(&mut self, source: &dyn ByteSource) -> io::Result<Option<Table>> {
        self.window = DecodeWindow::default();
        let text = Self::read_text(source)?;
        let lines = self.content_lines(&text);
        let mut records = self.tokenize(&lines);

        let header = if self.settings.header && !records.is_empty() {
            records.remove(0)
        } else {
            Vec::new()
        };
        let s = &self.settings;
        let total_cols = records.first().map_or(header.len(), Vec::len);

        let Some((first_row, rows)) = select_range(s.start_row, s.end_row, records.len()) else {
            tracing::warn!(
                "{}: start row {} is beyond the {} available rows",
                source.label(),
                s.start_row,
                records.len()
            );
            return Ok(None);
        };
        let Some((first_col, cols)) = select_range(s.start_column, s.end_column, total_cols) else {
            tracing::warn!(
                "{}: start column {} is beyond the {} available columns",
                source.label(),
                s.start_column,
                total_cols
            );
            return Ok(None);
        };
        if rows == 0 || cols == 0 {
            tracing::warn!("{}: window selects no data", source.label());
            return Ok(None);
        }

        let names = (0..cols)
            .map(|c| {
                s.vector_names
                    .get(c)
                    .or_else(|| header.get(first_col + c))
                    .filter(|n| !n.is_empty())
                    .cloned()
                    .unwrap_or_else(|| (first_col + c + 1).to_string())
            })
            .collect();
        records.drain(..first_row);
        records.truncate(rows);

        self.window = DecodeWindow {
            first_row,
            rows,
            cols: cols + usize::from(s.create_index),
        };
        tracing::debug!("{}: decode window {:?}", source.label(), self.window);
        Ok(Some(Table {
            names,
            records,
            first_col,
        }))
    }

    fn column_modes(&self, table: &Table) -> Vec<ColumnMode> {
        let cols = table.names.len();
        (0..cols)
            .map(|c| detect_mode(table.field(0, c), &self.settings.date_time_format))
            .collect()
    }
}

/// Most specific mode `field` parses as.
fn detect_mode(field: &str, format: &str) -> ColumnMode {
    let field = field.trim();
    if field.is_empty() {
        ColumnMode::Double
    } else if field.parse::<i32>().is_ok() {
        ColumnMode::Integer
    } else if field.parse::<i64>().is_ok() {
        ColumnMode::BigInt
    } else if field.parse::<f64>().is_ok() {
        ColumnMode::Double
    } else if parse_datetime(field, format).is_some() {
        ColumnMode::DateTime
    } else {
        ColumnMode::Text
    }
}

fn parse_datetime(field: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(field, format).ok().or_else(|| {
        NaiveDate::parse_from_str(field, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

/// Store `field` at `row` of a staging buffer according to its mode.
/// Unparsable values become the mode's empty value.
fn store(buffer: &mut ColumnValues, row: usize, field: &str, format: &str) {
    let trimmed = field.trim();
    let parsed = match buffer {
        ColumnValues::Double(v) => v.get_mut(row).map(|slot| {
            let value = trimmed.parse().ok();
            *slot = value.unwrap_or(MISSING_VALUE);
            value.is_some()
        }),
        ColumnValues::Integer(v) => v.get_mut(row).map(|slot| {
            let value = trimmed.parse().ok();
            *slot = value.unwrap_or(0);
            value.is_some()
        }),
        ColumnValues::BigInt(v) => v.get_mut(row).map(|slot| {
            let value = trimmed.parse().ok();
            *slot = value.unwrap_or(0);
            value.is_some()
        }),
        ColumnValues::Text(v) => v.get_mut(row).map(|slot| {
            *slot = field.to_string();
            true
        }),
        ColumnValues::DateTime(v) => v.get_mut(row).map(|slot| {
            *slot = parse_datetime(trimmed, format);
            slot.is_some()
        }),
    };
    if parsed == Some(false) && !trimmed.is_empty() {
        tracing::debug!(
            "Row {}: '{}' is not a valid {} value, stored as empty",
            row + 1,
            trimmed,
            buffer.mode()
        );
    }
}

impl FileFilter for AsciiFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Ascii
    }

    fn read_into(
        &mut self,
        source: &dyn ByteSource,
        sink: &mut dyn DataSink,
        mode: ImportMode,
        lines: Option<usize>,
        progress: &mut ProgressReporter<'_>,
    ) -> ImportOutcome {
        let table = match self.prepare(source) {
            Ok(Some(table)) => table,
            Ok(None) => {
                sink.clear();
                return ImportOutcome::Empty;
            }
            Err(e) => {
                tracing::warn!("Could not open {}: {}", source.label(), e);
                return ImportOutcome::SourceUnavailable(e.to_string());
            }
        };

        let window = self.window;
        let rows = window.rows_limited(lines);
        let index = usize::from(self.settings.create_index);
        let mut names = table.names.clone();
        let mut modes = self.column_modes(&table);
        if index == 1 {
            names.insert(0, "index".to_string());
            modes.insert(0, ColumnMode::Integer);
        }

        let mut buffers = Vec::new();
        let column_offset = sink.prepare_import(&mut buffers, mode, rows, window.cols, &names, &modes);
        let format = self.settings.date_time_format.as_str();
        let mut reporter = RowProgress::new(window.rows, progress);
        for row in 0..rows {
            if index == 1 {
                if let Some(column) = buffers.first_mut() {
                    column.set_value_at(row, (row + 1) as f64);
                }
            }
            for (c, buffer) in buffers.iter_mut().skip(index).enumerate() {
                store(buffer, row, table.field(row, c), format);
            }
            reporter.row_done(row + 1);
        }

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
        let table = match self.prepare(source) {
            Ok(Some(table)) => table,
            Ok(None) => return empty_placeholder(),
            Err(e) => return unavailable_placeholder(e),
        };
        let window = self.window;
        let cols = table.names.len();
        (0..window.rows_limited(Some(lines)))
            .map(|row| {
                let mut line = Vec::with_capacity(window.cols);
                if self.settings.create_index {
                    line.push((row + 1).to_string());
                }
                line.extend((0..cols).map(|c| table.field(row, c).to_string()));
                line
            })
            .collect()
    }

    fn write(&self, columns: &[ColumnRef], target: &Path) -> Result<()> {
        let delimiter = match self.settings.separating_character.as_str() {
            "SPACE" => b' ',
            s => match s.as_bytes() {
                [b] if b.is_ascii() => *b,
                _ => b'\t',
            },
        };
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(target)?;

        if self.settings.header {
            writer.write_record(columns.iter().map(|c| c.name()))?;
        }
        let rows = columns.iter().map(|c| c.row_count()).max().unwrap_or(0);
        for row in 0..rows {
            writer.write_record(columns.iter().map(|c| c.text_at(row)))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", target.display()))?;
        tracing::info!("Exported {} columns x {} rows to {}", columns.len(), rows, target.display());
        Ok(())
    }

    fn save(&self, attributes: &mut AttributeSet) {
        let s = &self.settings;
        attributes.set("commentCharacter", &s.comment_character);
        attributes.set("separatingCharacter", &s.separating_character);
        attributes.set_flag("header", s.header);
        attributes.set("vectorNames", s.vector_names.join(" "));
        attributes.set_flag("skipEmptyParts", s.skip_empty_parts);
        attributes.set_flag("simplifyWhitespaces", s.simplify_whitespaces);
        attributes.set_flag("removeQuotes", s.remove_quotes);
        attributes.set_flag("createIndex", s.create_index);
        attributes.set("startRow", s.start_row);
        attributes.set("endRow", s.end_row);
        attributes.set("startColumn", s.start_column);
        attributes.set("endColumn", s.end_column);
        attributes.set("dateTimeFormat", &s.date_time_format);
    }

    fn load(&mut self, attributes: &AttributeSet) -> Vec<String> {
        let d = AsciiSettings::default();
        let mut warnings = Vec::new();
        let w = &mut warnings;
        // Empty names and an empty comment character are legitimate values
        let vector_names = attributes
            .get("vectorNames")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let comment_character = match attributes.get("commentCharacter") {
            Some(c) => c.to_string(),
            None => attributes.read_string("commentCharacter", &d.comment_character, w),
        };
        self.settings = AsciiSettings {
            comment_character,
            separating_character: attributes.read_string("separatingCharacter", &d.separating_character, w),
            header: attributes.read_flag("header", d.header, w),
            vector_names,
            skip_empty_parts: attributes.read_flag("skipEmptyParts", d.skip_empty_parts, w),
            simplify_whitespaces: attributes.read_flag("simplifyWhitespaces", d.simplify_whitespaces, w),
            remove_quotes: attributes.read_flag("removeQuotes", d.remove_quotes, w),
            create_index: attributes.read_flag("createIndex", d.create_index, w),
            start_row: attributes.read("startRow", d.start_row, w),
            end_row: attributes.read("endRow", d.end_row, w),
            start_column: attributes.read("startColumn", d.start_column, w),
            end_column: attributes.read("endColumn", d.end_column, w),
            date_time_format: attributes.read_string("dateTimeFormat", &d.date_time_format, w),
        };
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::source::MemorySource;

    fn rows(v: &[&[&str]]) -> Vec<Vec<String>> {
        v.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_separator_detection() {
        assert_eq!(Separator::detect("a\tb,c"), Separator::Char(b'\t'));
        assert_eq!(Separator::detect("a;b"), Separator::Char(b';'));
        assert_eq!(Separator::detect("1,2"), Separator::Char(b','));
        assert_eq!(Separator::detect("1 2"), Separator::Whitespace);
        assert_eq!(Separator::resolve("TAB", "1,2"), Separator::Char(b'\t'));
        assert_eq!(Separator::resolve("SPACE", "1,2"), Separator::Whitespace);
    }

    #[test]
    fn test_mode_detection() {
        let fmt = DEFAULT_DATETIME_FORMAT;
        assert_eq!(detect_mode("12", fmt), ColumnMode::Integer);
        assert_eq!(detect_mode("12345678901", fmt), ColumnMode::BigInt);
        assert_eq!(detect_mode("1.5", fmt), ColumnMode::Double);
        assert_eq!(detect_mode("2024-01-02 03:04:05.000", fmt), ColumnMode::DateTime);
        assert_eq!(detect_mode("abc", fmt), ColumnMode::Text);
        assert_eq!(detect_mode("", fmt), ColumnMode::Double);
    }

    #[test]
    fn test_preview_skips_comments_and_header() {
        let source = MemorySource::new("# comment\nt,v\n1,2.5\n\n2,3.5\n");
        let mut filter = AsciiFilter::new();
        assert_eq!(filter.preview(&source, 10), rows(&[&["1", "2.5"], &["2", "3.5"]]));
    }

    #[test]
    fn test_column_window_and_index() {
        let source = MemorySource::new("1 2 3\n4 5 6\n7 8 9\n");
        let mut filter = AsciiFilter::with_settings(AsciiSettings {
            header: false,
            create_index: true,
            start_column: 2,
            end_column: 3,
            start_row: 2,
            ..Default::default()
        });
        assert_eq!(filter.preview(&source, 1), rows(&[&["1", "5", "6"]]));
        assert_eq!(filter.window().cols, 3);
        assert_eq!(filter.window().rows, 2);
    }

    #[test]
    fn test_quotes() {
        let source = MemorySource::new("\"a\",\"b\"\n");
        let mut filter = AsciiFilter::with_settings(AsciiSettings {
            header: false,
            remove_quotes: true,
            ..Default::default()
        });
        assert_eq!(filter.preview(&source, 5), rows(&[&["a", "b"]]));

        filter.settings_mut().remove_quotes = false;
        assert_eq!(filter.preview(&source, 5), rows(&[&["\"a\"", "\"b\""]]));
    }

    #[test]
    fn test_empty_selection_placeholder() {
        let source = MemorySource::new("x\n1\n");
        let mut filter = AsciiFilter::new();
        filter.settings_mut().start_row = 5;
        assert_eq!(filter.preview(&source, 5), empty_placeholder());
    }

    #[test]
    fn test_store_keeps_mode_of_first_row() {
        let mut ints = ColumnValues::Integer(vec![7; 3]);
        store(&mut ints, 0, "4", DEFAULT_DATETIME_FORMAT);
        store(&mut ints, 1, "2.5", DEFAULT_DATETIME_FORMAT);
        store(&mut ints, 2, " ", DEFAULT_DATETIME_FORMAT);
        assert_eq!(ints, ColumnValues::Integer(vec![4, 0, 0]));

        let mut doubles = ColumnValues::Double(vec![0.0; 2]);
        store(&mut doubles, 0, "n/a", DEFAULT_DATETIME_FORMAT);
        store(&mut doubles, 1, "1e3", DEFAULT_DATETIME_FORMAT);
        assert!(doubles.value_at(0).is_nan());
        assert_eq!(doubles.value_at(1), 1000.0);
    }

    #[test]
    fn test_later_row_of_other_type_imports_as_empty() {
        let source = MemorySource::new("n\n1\n2.5\n3\n");
        let mut sheet = crate::sink::Spreadsheet::new("mixed");
        let mut filter = AsciiFilter::new();

        let outcome = filter.read_into(&source, &mut sheet, ImportMode::Replace, None, &mut |_| {});
        assert_eq!(outcome.rows(), 3);
        let column = &sheet.columns()[0];
        assert_eq!(column.mode(), ColumnMode::Integer);
        assert_eq!(column.values(), ColumnValues::Integer(vec![1, 0, 3]));
    }
}
