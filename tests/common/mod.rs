//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use labflow_rs::ColumnRef;

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// All values of a column as `f64`
pub fn column_values(column: &ColumnRef) -> Vec<f64> {
    (0..column.row_count()).map(|row| column.value_at(row)).collect()
}

/// Names of the given columns, in order
pub fn column_names(columns: &[ColumnRef]) -> Vec<String> {
    columns.iter().map(|c| c.name()).collect()
}

/// Progress callback that discards every report
pub fn no_progress() -> impl FnMut(u8) {
    |_| {}
}
