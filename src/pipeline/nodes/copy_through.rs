//! CopyThroughFilter - mirrors its single input.
//!
//! The output column follows the input's values, mode, name, comment,
//! plot designation and masking. Disconnecting the input empties the
//! output.

use crate::column::{Column, ColumnRef, ColumnValues};
use crate::pipeline::node::{Filter, InputContext};
use crate::pipeline::port::{Arity, InputNotice};
use crate::types::ColumnMode;

pub struct CopyThroughFilter {
    output: ColumnRef,
}

impl CopyThroughFilter {
    pub fn new() -> Self {
        Self {
            output: Column::new("copy", ColumnMode::Double),
        }
    }
}

impl Default for CopyThroughFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for CopyThroughFilter {
    fn name(&self) -> &str {
        "CopyThrough"
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

    fn on_input(&mut self, ctx: &InputContext<'_>, notice: InputNotice) {
        let source = ctx.source();
        match notice {
            InputNotice::AboutToBeDisconnected => {
                let mode = self.output.mode();
                self.output.replace_values(ColumnValues::new(mode, 0));
            }
            InputNotice::DescriptionChanged => {
                self.output.set_name(source.name());
                self.output.set_comment(source.comment());
            }
            InputNotice::PlotDesignationChanged => {
                self.output.set_plot_designation(source.plot_designation());
            }
            InputNotice::MaskingChanged => self.output.copy_masking_from(source),
            n if n.invalidates_data() => self.output.replace_values(source.values()),
            _ => {}
        }
    }
}
