//! DoubleToIntegerFilter - rounds a `Double` column into an `Integer` one.
//!
//! Only `Double` inputs are acceptable. Values are rounded half away from
//! zero and saturated to the `i32` range; missing values become `0`.

use crate::column::{Column, ColumnRef, ColumnValues};
use crate::pipeline::node::{Filter, InputContext};
use crate::pipeline::port::{Arity, InputNotice};
use crate::types::ColumnMode;

pub struct DoubleToIntegerFilter {
    output: ColumnRef,
}

impl DoubleToIntegerFilter {
    pub fn new() -> Self {
        Self {
            output: Column::new("integer", ColumnMode::Integer),
        }
    }
}

impl Default for DoubleToIntegerFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for DoubleToIntegerFilter {
    fn name(&self) -> &str {
        "DoubleToInteger"
    }

    fn input_count(&self) -> Arity {
        Arity::Fixed(1)
    }

    fn output_count(&self) -> usize {
        1
    }

    fn output(&self, port: usize) -> Option<ColumnRef> {
        (port == 0).then(|| self.output.clone())
    }

    fn is_input_acceptable(&self, _port: usize, column: &Column) -> bool {
        column.mode() == ColumnMode::Double
    }

    fn on_input(&mut self, ctx: &InputContext<'_>, notice: InputNotice) {
        match notice {
            InputNotice::AboutToBeDisconnected => {
                self.output.replace_values(ColumnValues::Integer(Vec::new()));
            }
            InputNotice::DescriptionChanged => self.output.set_name(ctx.source().name()),
            n if n.invalidates_data() => {
                let converted = ctx.source().read_values(|v| v.convert(ColumnMode::Integer));
                self.output.replace_values(converted);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::node::{FilterNode, OutputSource};

    #[test]
    fn test_rounds_input() {
        let node = FilterNode::new(DoubleToIntegerFilter::new());
        let input = Column::with_values("x", ColumnValues::Double(vec![0.4, 2.5, f64::NAN]));
        assert!(node.bind_input(0, Some(&input)));
        let out = node.output(0).unwrap();
        assert_eq!(out.values(), ColumnValues::Integer(vec![0, 3, 0]));
    }

    #[test]
    fn test_rejects_non_double_input() {
        let node = FilterNode::new(DoubleToIntegerFilter::new());
        let input = Column::with_values("x", ColumnValues::Integer(vec![1]));
        assert!(!node.bind_input(0, Some(&input)));
        assert!(node.input(0).is_none());
    }
}
