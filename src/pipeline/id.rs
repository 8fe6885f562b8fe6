//! Identity types for the column graph.
//!
//! Column ids are process-unique and never reused, so a filter can compare
//! a stored id against an incoming notification even after the column it
//! referred to has gone away.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_COLUMN_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a [`Column`](crate::column::Column).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(pub u64);

impl ColumnId {
    pub const INVALID: ColumnId = ColumnId(0);

    /// Allocate a fresh id.
    pub fn next() -> Self {
        ColumnId(NEXT_COLUMN_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Debug for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "ColumnId(INVALID)")
        } else {
            write!(f, "ColumnId({})", self.0)
        }
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Handle returned by a column subscription, used to unsubscribe.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_ids_are_unique() {
        let a = ColumnId::next();
        let b = ColumnId::next();
        assert_ne!(a, b);
        assert!(a.is_valid());
        assert!(!ColumnId::INVALID.is_valid());
    }

    #[test]
    fn test_column_id_debug() {
        assert_eq!(format!("{:?}", ColumnId::INVALID), "ColumnId(INVALID)");
        assert_eq!(format!("{:?}", ColumnId(7)), "ColumnId(7)");
    }
}
