//! Integration tests for port binding and notification forwarding

mod common;

use common::builders::{count_notices, RecordingFilter};
use common::column_values;
use labflow_rs::column::{Column, ColumnValues};
use labflow_rs::pipeline::nodes::{CopyThroughFilter, DoubleToIntegerFilter, ExpressionFilter};
use labflow_rs::pipeline::{Arity, FilterNode, InputNotice, OutputSource, PipelineError};
use labflow_rs::scripting::RhaiEvaluator;
use labflow_rs::sink::{DataSink, ImportCommit};
use labflow_rs::{ColumnMode, ImportMode, Spreadsheet};

fn double(name: &str, values: &[f64]) -> labflow_rs::ColumnRef {
    Column::with_values(name, ColumnValues::Double(values.to_vec()))
}

fn integer(name: &str, values: &[i32]) -> labflow_rs::ColumnRef {
    Column::with_values(name, ColumnValues::Integer(values.to_vec()))
}

#[test]
fn test_out_of_range_port_leaves_bindings_unchanged() {
    let (filter, log) = RecordingFilter::new(Arity::Fixed(2));
    let node = FilterNode::new(filter);
    let a = double("a", &[1.0]);
    let b = double("b", &[2.0]);
    assert!(node.bind_input(0, Some(&a)));
    let notices_before = log.borrow().len();

    for port in [2, 3, 100] {
        assert!(!node.bind_input(port, Some(&b)));
        assert!(!node.bind_input(port, None));
    }
    assert_eq!(
        node.try_bind_input(5, Some(&b)),
        Err(PipelineError::PortOutOfRange { port: 5, count: 2 })
    );

    assert_eq!(node.input_slots(), 1);
    assert_eq!(node.input(0).map(|c| c.id()), Some(a.id()));
    assert_eq!(log.borrow().len(), notices_before);
}

#[test]
fn test_unbounded_arity_accepts_any_port() {
    let (filter, _log) = RecordingFilter::new(Arity::Unbounded);
    let node = FilterNode::new(filter);
    let a = double("a", &[1.0]);

    assert!(node.bind_input(7, Some(&a)));
    assert_eq!(node.input_slots(), 8);
    assert_eq!(node.bound_input_count(), 1);
    assert!(node.bind_input(1000, Some(&a)));
    assert_eq!(node.input_slots(), 1001);
    assert_eq!(node.port_index_of(&a), Some(7));
}

#[test]
fn test_unbinding_highest_port_trims_unbound_tail() {
    let (filter, log) = RecordingFilter::new(Arity::Unbounded);
    let node = FilterNode::new(filter);
    let a = double("a", &[1.0]);
    let b = double("b", &[2.0]);
    let d = double("d", &[4.0]);
    node.bind_input(0, Some(&a));
    node.bind_input(1, Some(&b));
    node.bind_input(3, Some(&d));
    assert_eq!(node.input_slots(), 4);

    log.borrow_mut().clear();
    assert!(node.bind_input(3, None));

    assert_eq!(node.input_slots(), 2);
    assert!(node.input(0).is_some());
    assert!(node.input(1).is_some());
    assert_eq!(*log.borrow(), vec![(3, InputNotice::AboutToBeDisconnected)]);
    assert_eq!(d.observer_count(), 0);

    // Unbinding an unbound port never grows the array
    assert!(node.bind_input(9, None));
    assert_eq!(node.input_slots(), 2);

    node.bind_input(1, None);
    node.bind_input(0, None);
    assert_eq!(node.input_slots(), 0);
}

#[test]
fn test_rebinding_same_mode_emits_no_mode_pair() {
    let (filter, log) = RecordingFilter::new(Arity::Fixed(1));
    let node = FilterNode::new(filter);
    let x = double("x", &[1.0]);
    let y = double("y", &[2.0, 3.0]);
    node.bind_input(0, Some(&x));
    log.borrow_mut().clear();

    assert!(node.bind_input(0, Some(&y)));

    assert_eq!(count_notices(&log, InputNotice::ModeAboutToChange), 0);
    assert_eq!(count_notices(&log, InputNotice::ModeChanged), 0);
    assert_eq!(count_notices(&log, InputNotice::DataAboutToChange), 1);
    assert_eq!(count_notices(&log, InputNotice::DataChanged), 1);
}

#[test]
fn test_rebinding_different_mode_emits_one_mode_pair() {
    let (filter, log) = RecordingFilter::new(Arity::Fixed(1));
    let node = FilterNode::new(filter);
    let x = double("x", &[1.0]);
    let y = integer("y", &[2]);
    node.bind_input(0, Some(&x));
    log.borrow_mut().clear();

    assert!(node.bind_input(0, Some(&y)));

    assert_eq!(count_notices(&log, InputNotice::ModeAboutToChange), 1);
    assert_eq!(count_notices(&log, InputNotice::ModeChanged), 1);

    let notices: Vec<InputNotice> = log.borrow().iter().map(|(_, n)| *n).collect();
    let about = notices.iter().position(|n| *n == InputNotice::ModeAboutToChange);
    let changed = notices.iter().position(|n| *n == InputNotice::ModeChanged);
    assert!(about < changed);
    // Old column has been released, new one observed
    assert_eq!(x.observer_count(), 0);
    assert_eq!(y.observer_count(), 1);
}

#[test]
fn test_dropping_upstream_disconnects() {
    let (filter, log) = RecordingFilter::new(Arity::Unbounded);
    let node = FilterNode::new(filter);
    let a = double("a", &[1.0]);
    {
        let b = double("b", &[2.0]);
        node.bind_input(0, Some(&a));
        node.bind_input(1, Some(&b));
        log.borrow_mut().clear();
    }

    assert_eq!(*log.borrow(), vec![(1, InputNotice::AboutToBeDisconnected)]);
    assert_eq!(node.input_slots(), 1);
}

#[test]
fn test_chained_filters_propagate_changes() {
    let source = double("raw", &[1.4, 2.6]);
    let copy = FilterNode::new(CopyThroughFilter::new());
    let round = FilterNode::new(DoubleToIntegerFilter::new());
    assert!(copy.bind_input(0, Some(&source)));
    assert!(round.bind_outputs_of(&copy));

    let rounded = round.output(0).unwrap();
    assert_eq!(rounded.mode(), ColumnMode::Integer);
    assert_eq!(column_values(&rounded), vec![1.0, 3.0]);

    source.set_value_at(0, 7.7);
    assert_eq!(column_values(&rounded), vec![8.0, 3.0]);
}

#[test]
fn test_expression_over_imported_spreadsheet() {
    let mut sheet = Spreadsheet::new("measurements");
    let mut buffers = Vec::new();
    let names = vec!["t".to_string(), "v".to_string()];
    let modes = vec![ColumnMode::Double, ColumnMode::Double];
    sheet.prepare_import(&mut buffers, ImportMode::Replace, 3, 2, &names, &modes);
    for row in 0..3 {
        buffers[0].set_value_at(row, row as f64);
        buffers[1].set_value_at(row, (row * 10) as f64);
    }
    sheet.finalize_import(
        buffers,
        ImportCommit {
            column_offset: 0,
            start_column: 0,
            end_column: 1,
            rows: 3,
            source_label: "memory".to_string(),
            mode: ImportMode::Replace,
        },
    );

    let node = FilterNode::new(ExpressionFilter::new(RhaiEvaluator::new("x1 + x2").unwrap()));
    assert!(node.bind_outputs_of(&sheet));
    let sum = node.output(0).unwrap();
    assert_eq!(column_values(&sum), vec![0.0, 11.0, 22.0]);

    sheet.column(1).unwrap().set_value_at(2, 100.0);
    assert_eq!(column_values(&sum), vec![0.0, 11.0, 102.0]);

    sheet.column(0).unwrap().set_masked(0, true);
    assert!(sum.value_at(0).is_nan());
}

#[test]
fn test_expression_rejects_text_input() {
    let node = FilterNode::new(ExpressionFilter::new(RhaiEvaluator::new("x * 2").unwrap()));
    let text = Column::with_values("labels", ColumnValues::Text(vec!["a".to_string()]));

    assert!(matches!(
        node.try_bind_input(0, Some(&text)),
        Err(PipelineError::InputRejected { port: 0, .. })
    ));
    assert_eq!(node.input_slots(), 0);
}
