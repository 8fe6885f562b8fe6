//! Spreadsheet - an ordered set of columns filled by imports.

use crate::column::{Column, ColumnRef, ColumnValues};
use crate::pipeline::node::OutputSource;
use crate::sink::{DataSink, ImportCommit};
use crate::types::{ColumnMode, ImportMode, PlotDesignation};

/// Column container that accepts imports.
///
/// `Replace` imports reuse existing columns by position so that filters
/// bound to them stay connected; surplus columns are dropped, which
/// disconnects anything bound to them.
pub struct Spreadsheet {
    name: String,
    columns: Vec<ColumnRef>,
    staged: Vec<(String, ColumnMode)>,
}

impl Spreadsheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            staged: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&ColumnRef> {
        self.columns.get(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ColumnRef> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Length of the longest column.
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.row_count()).max().unwrap_or(0)
    }

    pub fn add_column(&mut self, column: ColumnRef) {
        self.columns.push(column);
    }

    pub fn remove_column(&mut self, index: usize) -> Option<ColumnRef> {
        (index < self.columns.len()).then(|| self.columns.remove(index))
    }

    /// `base`, or `base 1`, `base 2`, ... if that name is taken.
    fn unique_name(base: &str, taken: &[String]) -> String {
        if !taken.iter().any(|n| n == base) {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{} {}", base, i))
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn staged_name(&self, index: usize) -> String {
        self.staged
            .get(index)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| (index + 1).to_string())
    }
}

impl DataSink for Spreadsheet {
    fn prepare_import(
        &mut self,
        buffers: &mut Vec<ColumnValues>,
        mode: ImportMode,
        rows: usize,
        cols: usize,
        names: &[String],
        modes: &[ColumnMode],
    ) -> usize {
        self.staged = (0..cols)
            .map(|i| {
                let name = names
                    .get(i)
                    .filter(|n| !n.is_empty())
                    .cloned()
                    .unwrap_or_else(|| (i + 1).to_string());
                (name, modes.get(i).copied().unwrap_or_default())
            })
            .collect();

        buffers.clear();
        buffers.extend(self.staged.iter().map(|&(_, m)| ColumnValues::new(m, rows)));

        let offset = match mode {
            ImportMode::Append => self.columns.len(),
            ImportMode::Prepend | ImportMode::Replace => 0,
        };
        tracing::debug!(
            "{}: prepared {} x {} import ({}), column offset {}",
            self.name,
            rows,
            cols,
            mode,
            offset
        );
        offset
    }

    fn finalize_import(&mut self, buffers: Vec<ColumnValues>, commit: ImportCommit) {
        if buffers.is_empty() || commit.end_column < commit.start_column {
            self.staged.clear();
            return;
        }

        let count = commit.end_column - commit.start_column + 1;
        let mut taken: Vec<String> = match commit.mode {
            ImportMode::Replace => Vec::new(),
            _ => self.columns.iter().map(|c| c.name()).collect(),
        };
        let staged: Vec<(String, ColumnValues)> = buffers
            .into_iter()
            .enumerate()
            .skip(commit.start_column)
            .take(count)
            .map(|(i, mut values)| {
                values.resize(commit.rows);
                let name = Self::unique_name(&self.staged_name(i), &taken);
                taken.push(name.clone());
                (name, values)
            })
            .collect();
        self.staged.clear();

        match commit.mode {
            ImportMode::Replace => {
                self.columns.truncate(staged.len());
                for (i, (name, values)) in staged.into_iter().enumerate() {
                    let designation = if i == 0 {
                        PlotDesignation::X
                    } else {
                        PlotDesignation::Y
                    };
                    let column = match self.columns.get(i) {
                        Some(existing) => {
                            existing.set_name(name);
                            existing.replace_values(values);
                            existing.clear_masks();
                            existing.clone()
                        }
                        None => {
                            let column = Column::with_values(name, values);
                            self.columns.push(column.clone());
                            column
                        }
                    };
                    column.set_comment(commit.source_label.as_str());
                    column.set_plot_designation(designation);
                }
            }
            ImportMode::Append | ImportMode::Prepend => {
                let created: Vec<ColumnRef> = staged
                    .into_iter()
                    .map(|(name, values)| {
                        let column = Column::with_values(name, values);
                        column.set_comment(commit.source_label.as_str());
                        column
                    })
                    .collect();
                let at = commit.column_offset.min(self.columns.len());
                self.columns.splice(at..at, created);
            }
        }

        tracing::info!(
            "{}: imported {} rows into {} columns from '{}' ({})",
            self.name,
            commit.rows,
            count,
            commit.source_label,
            commit.mode
        );
    }

    fn clear(&mut self) {
        tracing::debug!("{}: clearing {} columns", self.name, self.columns.len());
        for column in &self.columns {
            column.clear();
        }
    }
}

impl OutputSource for Spreadsheet {
    fn output_count(&self) -> usize {
        self.columns.len()
    }

    fn output(&self, port: usize) -> Option<ColumnRef> {
        self.columns.get(port).cloned()
    }
}

impl std::fmt::Debug for Spreadsheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spreadsheet")
            .field("name", &self.name)
            .field("columns", &self.columns.len())
            .finish()
    }
}
