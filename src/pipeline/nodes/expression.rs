//! ExpressionFilter - a computed `Double` column.
//!
//! Accepts any number of numeric inputs. Whenever an input's data changes
//! the output is recomputed row by row: row `r` of the output is the
//! evaluator applied to row `r` of every input port, in port order. Unbound
//! ports, short inputs and masked rows contribute a missing value.

use crate::column::{Column, ColumnRef, ColumnValues};
use crate::pipeline::node::{Filter, InputContext};
use crate::pipeline::port::{Arity, InputNotice};
use crate::scripting::Evaluator;
use crate::types::{ColumnMode, MISSING_VALUE};

pub struct ExpressionFilter<E> {
    evaluator: E,
    output: ColumnRef,
}

impl<E: Evaluator + 'static> ExpressionFilter<E> {
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            output: Column::new("expression", ColumnMode::Double),
        }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    fn recompute(&self, ctx: &InputContext<'_>, skip: Option<usize>) {
        let width = ctx.input_slots();
        let columns: Vec<Vec<f64>> = (0..width)
            .map(|port| {
                if skip == Some(port) {
                    Vec::new()
                } else if port == ctx.port() {
                    numeric_values(ctx.source())
                } else {
                    ctx.input(port)
                        .map(|c| numeric_values(&c))
                        .unwrap_or_default()
                }
            })
            .collect();

        let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
        let mut variables = vec![MISSING_VALUE; width];
        let mut failures = 0usize;
        let values: Vec<f64> = (0..rows)
            .map(|row| {
                for (slot, column) in variables.iter_mut().zip(&columns) {
                    *slot = column.get(row).copied().unwrap_or(MISSING_VALUE);
                }
                match self.evaluator.evaluate(&variables) {
                    Ok(v) => v,
                    Err(e) => {
                        if failures == 0 {
                            tracing::warn!("Expression failed at row {}: {}", row, e);
                        }
                        failures += 1;
                        MISSING_VALUE
                    }
                }
            })
            .collect();

        if failures > 1 {
            tracing::warn!("Expression failed on {} of {} rows", failures, rows);
        }
        self.output.replace_values(ColumnValues::Double(values));
    }
}

fn numeric_values(column: &Column) -> Vec<f64> {
    let rows = column.row_count();
    (0..rows)
        .map(|r| {
            if column.is_masked(r) {
                MISSING_VALUE
            } else {
                column.value_at(r)
            }
        })
        .collect()
}

impl<E: Evaluator + 'static> Filter for ExpressionFilter<E> {
    fn name(&self) -> &str {
        "Expression"
    }

    fn input_count(&self) -> Arity {
        Arity::Unbounded
    }

    fn output_count(&self) -> usize {
        1
    }

    fn output(&self, port: usize) -> Option<ColumnRef> {
        (port == 0).then(|| self.output.clone())
    }

    fn input_label(&self, port: usize) -> String {
        format!("x{}", port + 1)
    }

    fn is_input_acceptable(&self, _port: usize, column: &Column) -> bool {
        column.mode().is_numeric()
    }

    fn on_input(&mut self, ctx: &InputContext<'_>, notice: InputNotice) {
        match notice {
            InputNotice::AboutToBeDisconnected => self.recompute(ctx, Some(ctx.port())),
            InputNotice::MaskingChanged => self.recompute(ctx, None),
            n if n.invalidates_data() => self.recompute(ctx, None),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::node::{FilterNode, OutputSource};

    fn sum(vars: &[f64]) -> f64 {
        vars.iter().sum()
    }

    #[test]
    fn test_recomputes_on_input_change() {
        let node = FilterNode::new(ExpressionFilter::new(sum as fn(&[f64]) -> f64));
        let a = Column::with_values("a", ColumnValues::Double(vec![1.0, 2.0]));
        let b = Column::with_values("b", ColumnValues::Integer(vec![10, 20]));
        node.bind_input(0, Some(&a));
        node.bind_input(1, Some(&b));

        let out = node.output(0).unwrap();
        assert_eq!(out.values(), ColumnValues::Double(vec![11.0, 22.0]));

        a.set_value_at(0, 5.0);
        assert_eq!(out.value_at(0), 15.0);
    }

    #[test]
    fn test_disconnect_drops_contribution() {
        let node = FilterNode::new(ExpressionFilter::new(|v: &[f64]| v.iter().filter(|x| !x.is_nan()).sum::<f64>()));
        let a = Column::with_values("a", ColumnValues::Double(vec![1.0]));
        let b = Column::with_values("b", ColumnValues::Double(vec![2.0]));
        node.bind_input(0, Some(&a));
        node.bind_input(1, Some(&b));
        assert_eq!(node.output(0).unwrap().value_at(0), 3.0);

        node.bind_input(1, None);
        assert_eq!(node.output(0).unwrap().value_at(0), 1.0);
    }

    #[test]
    fn test_labels_and_acceptance() {
        let node = FilterNode::new(ExpressionFilter::new(sum as fn(&[f64]) -> f64));
        assert_eq!(node.input_label(1), "x2");
        let text = Column::new("t", ColumnMode::Text);
        assert!(!node.bind_input(0, Some(&text)));
    }
}
