//! Expression evaluation for computed columns
//!
//! Computed columns are described by an expression over the values of one
//! row of the filter's inputs. The graph only needs the [`Evaluator`]
//! contract; [`RhaiEvaluator`] is the built-in implementation.
//!
//! ## Variables
//!
//! - `x1`, `x2`, ... `xN` - value of input port 1..N for the current row
//! - `x` - alias for `x1`
//!
//! Missing values are `NaN`; use `is_missing(v)` to test for them.
//!
//! ## Example Expressions
//!
//! Sum of two inputs:
//! ```rhai
//! x1 + x2
//! ```
//!
//! Replace missing readings by zero:
//! ```rhai
//! if is_missing(x) { 0.0 } else { x }
//! ```

mod engine;

pub use engine::RhaiEvaluator;

use crate::error::Result;

/// Maps one row of input values to one output value.
pub trait Evaluator {
    fn evaluate(&self, variables: &[f64]) -> Result<f64>;
}

impl<F> Evaluator for F
where
    F: Fn(&[f64]) -> f64,
{
    fn evaluate(&self, variables: &[f64]) -> Result<f64> {
        Ok(self(variables))
    }
}
