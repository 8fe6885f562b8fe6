//! Observable, typed data columns.
//!
//! A [`Column`] owns an ordered sequence of typed values plus a name, a
//! comment, a plot designation and per-row mask bits. Every mutation is
//! bracketed by a pair of events (`…AboutToChange` before, `…Changed` after)
//! so observers can snapshot the old state before it is replaced.
//!
//! Observers register a callback with [`Column::subscribe`] and receive the
//! column together with the event. Callbacks run synchronously on the thread
//! performing the mutation; the column never holds a borrow of its own state
//! while notifying, so observers may read the column from inside a callback.
//!
//! Dropping the last handle to a column emits [`ColumnEvent::AboutToBeDestroyed`]
//! before any storage is released.

pub mod values;

pub use values::{ColumnValues, DEFAULT_DATETIME_FORMAT};

use crate::pipeline::id::{ColumnId, SubscriptionId};
use crate::types::{ColumnMode, PlotDesignation};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Shared handle to a column. Ownership lives with the data sink or filter
/// that created it; everything else should hold a `Weak`.
pub type ColumnRef = Rc<Column>;

/// Change notifications emitted by a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnEvent {
    DescriptionAboutToChange,
    DescriptionChanged,
    PlotDesignationAboutToChange,
    PlotDesignationChanged,
    ModeAboutToChange,
    ModeChanged,
    DataAboutToChange,
    DataChanged,
    RowsAboutToBeInserted { before: usize, count: usize },
    RowsInserted { before: usize, count: usize },
    RowsAboutToBeRemoved { first: usize, count: usize },
    RowsRemoved { first: usize, count: usize },
    MaskingAboutToChange,
    MaskingChanged,
    AboutToBeDestroyed,
}

type ObserverFn = Rc<RefCell<dyn FnMut(&Column, &ColumnEvent)>>;

struct Observer {
    id: SubscriptionId,
    callback: ObserverFn,
}

struct ColumnState {
    name: String,
    comment: String,
    designation: PlotDesignation,
    values: ColumnValues,
    masked: Vec<bool>,
}

/// An observable, typed column.
pub struct Column {
    id: ColumnId,
    state: RefCell<ColumnState>,
    observers: RefCell<Vec<Observer>>,
    next_subscription: Cell<u64>,
}

impl Column {
    /// Create an empty column of the given mode.
    pub fn new(name: impl Into<String>, mode: ColumnMode) -> ColumnRef {
        Self::with_values(name, ColumnValues::new(mode, 0))
    }

    /// Create a column holding `values`.
    pub fn with_values(name: impl Into<String>, values: ColumnValues) -> ColumnRef {
        let rows = values.len();
        Rc::new(Self {
            id: ColumnId::next(),
            state: RefCell::new(ColumnState {
                name: name.into(),
                comment: String::new(),
                designation: PlotDesignation::NoDesignation,
                values,
                masked: vec![false; rows],
            }),
            observers: RefCell::new(Vec::new()),
            next_subscription: Cell::new(1),
        })
    }

    // ── Observation ──

    /// Register a callback for every event this column emits.
    pub fn subscribe(&self, callback: impl FnMut(&Column, &ColumnEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        self.observers.borrow_mut().push(Observer {
            id,
            callback: Rc::new(RefCell::new(callback)),
        });
        id
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|o| o.id != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.observers.borrow().iter().any(|o| o.id == id)
    }

    fn emit(&self, event: ColumnEvent) {
        // Snapshot so callbacks may (un)subscribe while we iterate.
        let snapshot: Vec<(SubscriptionId, ObserverFn)> = self
            .observers
            .borrow()
            .iter()
            .map(|o| (o.id, o.callback.clone()))
            .collect();

        for (id, callback) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut f) => (&mut *f)(self, &event),
                Err(_) => tracing::warn!(
                    "Dropping recursive {:?} notification from column '{}'",
                    event,
                    self.name()
                ),
            }
        }
    }

    // ── Accessors ──

    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn name(&self) -> String {
        self.state.borrow().name.clone()
    }

    pub fn comment(&self) -> String {
        self.state.borrow().comment.clone()
    }

    pub fn plot_designation(&self) -> PlotDesignation {
        self.state.borrow().designation
    }

    pub fn mode(&self) -> ColumnMode {
        self.state.borrow().values.mode()
    }

    pub fn row_count(&self) -> usize {
        self.state.borrow().values.len()
    }

    /// Numeric value at `row` (`NaN` when missing or out of range).
    pub fn value_at(&self, row: usize) -> f64 {
        self.state.borrow().values.value_at(row)
    }

    pub fn text_at(&self, row: usize) -> String {
        self.state.borrow().values.text_at(row)
    }

    /// Run `f` with a borrow of the column's values.
    pub fn read_values<R>(&self, f: impl FnOnce(&ColumnValues) -> R) -> R {
        f(&self.state.borrow().values)
    }

    /// Clone of the current values.
    pub fn values(&self) -> ColumnValues {
        self.state.borrow().values.clone()
    }

    pub fn is_masked(&self, row: usize) -> bool {
        self.state.borrow().masked.get(row).copied().unwrap_or(false)
    }

    pub fn masked_rows(&self) -> Vec<usize> {
        self.state
            .borrow()
            .masked
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then_some(i))
            .collect()
    }

    // ── Bracketed mutations ──

    pub fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        if self.state.borrow().name == name {
            return;
        }
        self.emit(ColumnEvent::DescriptionAboutToChange);
        self.state.borrow_mut().name = name;
        self.emit(ColumnEvent::DescriptionChanged);
    }

    pub fn set_comment(&self, comment: impl Into<String>) {
        let comment = comment.into();
        if self.state.borrow().comment == comment {
            return;
        }
        self.emit(ColumnEvent::DescriptionAboutToChange);
        self.state.borrow_mut().comment = comment;
        self.emit(ColumnEvent::DescriptionChanged);
    }

    pub fn set_plot_designation(&self, designation: PlotDesignation) {
        if self.plot_designation() == designation {
            return;
        }
        self.emit(ColumnEvent::PlotDesignationAboutToChange);
        self.state.borrow_mut().designation = designation;
        self.emit(ColumnEvent::PlotDesignationChanged);
    }

    /// Change the column mode, converting the stored values.
    pub fn set_mode(&self, mode: ColumnMode) {
        if self.mode() == mode {
            return;
        }
        self.emit(ColumnEvent::ModeAboutToChange);
        self.emit(ColumnEvent::DataAboutToChange);
        {
            let mut state = self.state.borrow_mut();
            state.values = state.values.convert(mode);
        }
        self.emit(ColumnEvent::DataChanged);
        self.emit(ColumnEvent::ModeChanged);
    }

    /// Replace all values. A mode change is announced around the data change.
    pub fn replace_values(&self, values: ColumnValues) {
        let mode_changes = self.mode() != values.mode();
        if mode_changes {
            self.emit(ColumnEvent::ModeAboutToChange);
        }
        self.emit(ColumnEvent::DataAboutToChange);
        {
            let mut state = self.state.borrow_mut();
            let rows = values.len();
            state.values = values;
            state.masked.resize(rows, false);
        }
        self.emit(ColumnEvent::DataChanged);
        if mode_changes {
            self.emit(ColumnEvent::ModeChanged);
        }
    }

    /// Store a numeric value at `row`, growing the column if needed.
    pub fn set_value_at(&self, row: usize, value: f64) {
        self.emit(ColumnEvent::DataAboutToChange);
        {
            let mut state = self.state.borrow_mut();
            state.values.set_value_at(row, value);
            let rows = state.values.len();
            state.masked.resize(rows, false);
        }
        self.emit(ColumnEvent::DataChanged);
    }

    pub fn insert_rows(&self, before: usize, count: usize) {
        if count == 0 {
            return;
        }
        let before = before.min(self.row_count());
        self.emit(ColumnEvent::RowsAboutToBeInserted { before, count });
        {
            let mut state = self.state.borrow_mut();
            state.values.insert_rows(before, count);
            state
                .masked
                .splice(before..before, std::iter::repeat(false).take(count));
        }
        self.emit(ColumnEvent::RowsInserted { before, count });
    }

    pub fn remove_rows(&self, first: usize, count: usize) {
        let rows = self.row_count();
        if first >= rows || count == 0 {
            return;
        }
        let count = count.min(rows - first);
        self.emit(ColumnEvent::RowsAboutToBeRemoved { first, count });
        {
            let mut state = self.state.borrow_mut();
            state.values.remove_rows(first, count);
            state.masked.drain(first..first + count);
        }
        self.emit(ColumnEvent::RowsRemoved { first, count });
    }

    /// Grow or shrink to exactly `rows`.
    pub fn set_row_count(&self, rows: usize) {
        let current = self.row_count();
        if rows > current {
            self.insert_rows(current, rows - current);
        } else if rows < current {
            self.remove_rows(rows, current - rows);
        }
    }

    /// Remove every row.
    pub fn clear(&self) {
        self.remove_rows(0, self.row_count());
    }

    pub fn set_masked(&self, row: usize, masked: bool) {
        if row >= self.row_count() || self.is_masked(row) == masked {
            return;
        }
        self.emit(ColumnEvent::MaskingAboutToChange);
        self.state.borrow_mut().masked[row] = masked;
        self.emit(ColumnEvent::MaskingChanged);
    }

    pub fn clear_masks(&self) {
        if self.masked_rows().is_empty() {
            return;
        }
        self.emit(ColumnEvent::MaskingAboutToChange);
        self.state.borrow_mut().masked.iter_mut().for_each(|m| *m = false);
        self.emit(ColumnEvent::MaskingChanged);
    }

    /// Copy masking bits from another column.
    pub fn copy_masking_from(&self, other: &Column) {
        let source = other.state.borrow().masked.clone();
        if self.state.borrow().masked == source {
            return;
        }
        self.emit(ColumnEvent::MaskingAboutToChange);
        self.state.borrow_mut().masked = source;
        self.emit(ColumnEvent::MaskingChanged);
    }
}

impl Drop for Column {
    fn drop(&mut self) {
        self.emit(ColumnEvent::AboutToBeDestroyed);
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("name", &state.name)
            .field("mode", &state.values.mode())
            .field("rows", &state.values.len())
            .finish()
    }
}
