//! Port arity and the notices a filter receives on its input ports.

use crate::column::ColumnEvent;

/// Number of input ports a filter declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many ports, indexed `0..n`.
    Fixed(usize),
    /// Any non-negative port index is structurally valid.
    Unbounded,
}

impl Arity {
    /// Whether `port` is structurally valid for this arity.
    pub fn admits(self, port: usize) -> bool {
        match self {
            Arity::Fixed(n) => port < n,
            Arity::Unbounded => true,
        }
    }

    /// Legacy sentinel form: `-1` for unbounded.
    pub fn as_count(self) -> i64 {
        match self {
            Arity::Fixed(n) => n as i64,
            Arity::Unbounded => -1,
        }
    }
}

/// A notification delivered to a filter about one of its input ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputNotice {
    DescriptionAboutToChange,
    DescriptionChanged,
    PlotDesignationAboutToChange,
    PlotDesignationChanged,
    ModeAboutToChange,
    ModeChanged,
    DataAboutToChange,
    DataChanged,
    MaskingAboutToChange,
    MaskingChanged,
    RowsAboutToBeInserted { before: usize, count: usize },
    RowsInserted { before: usize, count: usize },
    RowsAboutToBeRemoved { first: usize, count: usize },
    RowsRemoved { first: usize, count: usize },
    /// The port is being unbound; the source is still attached.
    AboutToBeDisconnected,
}

impl InputNotice {
    /// Translate an upstream column event. Destruction has no direct
    /// counterpart; it is handled by disconnecting the port.
    pub fn from_column_event(event: &ColumnEvent) -> Option<Self> {
        Some(match *event {
            ColumnEvent::DescriptionAboutToChange => InputNotice::DescriptionAboutToChange,
            ColumnEvent::DescriptionChanged => InputNotice::DescriptionChanged,
            ColumnEvent::PlotDesignationAboutToChange => InputNotice::PlotDesignationAboutToChange,
            ColumnEvent::PlotDesignationChanged => InputNotice::PlotDesignationChanged,
            ColumnEvent::ModeAboutToChange => InputNotice::ModeAboutToChange,
            ColumnEvent::ModeChanged => InputNotice::ModeChanged,
            ColumnEvent::DataAboutToChange => InputNotice::DataAboutToChange,
            ColumnEvent::DataChanged => InputNotice::DataChanged,
            ColumnEvent::MaskingAboutToChange => InputNotice::MaskingAboutToChange,
            ColumnEvent::MaskingChanged => InputNotice::MaskingChanged,
            ColumnEvent::RowsAboutToBeInserted { before, count } => {
                InputNotice::RowsAboutToBeInserted { before, count }
            }
            ColumnEvent::RowsInserted { before, count } => InputNotice::RowsInserted { before, count },
            ColumnEvent::RowsAboutToBeRemoved { first, count } => {
                InputNotice::RowsAboutToBeRemoved { first, count }
            }
            ColumnEvent::RowsRemoved { first, count } => InputNotice::RowsRemoved { first, count },
            ColumnEvent::AboutToBeDestroyed => return None,
        })
    }

    /// Whether the notice means the input's values may now differ.
    pub fn invalidates_data(&self) -> bool {
        matches!(
            self,
            InputNotice::DataChanged
                | InputNotice::ModeChanged
                | InputNotice::RowsInserted { .. }
                | InputNotice::RowsRemoved { .. }
                | InputNotice::AboutToBeDisconnected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_admits() {
        assert!(Arity::Fixed(2).admits(1));
        assert!(!Arity::Fixed(2).admits(2));
        assert!(!Arity::Fixed(0).admits(0));
        assert!(Arity::Unbounded.admits(1_000_000));
        assert_eq!(Arity::Unbounded.as_count(), -1);
        assert_eq!(Arity::Fixed(3).as_count(), 3);
    }

    #[test]
    fn test_destruction_is_not_forwarded() {
        assert_eq!(
            InputNotice::from_column_event(&ColumnEvent::AboutToBeDestroyed),
            None
        );
        assert_eq!(
            InputNotice::from_column_event(&ColumnEvent::RowsRemoved { first: 1, count: 2 }),
            Some(InputNotice::RowsRemoved { first: 1, count: 2 })
        );
    }
}
