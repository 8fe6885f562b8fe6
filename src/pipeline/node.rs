//! Filter abstraction for the column graph.
//!
//! Two-layer design:
//! - **`Filter` trait** - what a concrete filter implements: its arity, its
//!   output columns, an acceptance predicate and a hook receiving
//!   [`InputNotice`]s for its input ports.
//! - **`FilterNode`** - the shared handle that owns a filter together with
//!   its input port bindings. It performs binding, subscribes to upstream
//!   columns and forwards their notifications to the filter.
//!
//! Input bindings are weak: a node never keeps an upstream column alive.
//! When an upstream column announces its destruction, every port bound to
//! it is disconnected before the column goes away.

use crate::column::{Column, ColumnEvent, ColumnRef};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::id::{ColumnId, SubscriptionId};
use crate::pipeline::port::{Arity, InputNotice};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Context passed to [`Filter::on_input`].
pub struct InputContext<'a> {
    port: usize,
    source: &'a Column,
    inputs: &'a [Option<InputBinding>],
}

impl<'a> InputContext<'a> {
    /// Port the notice concerns.
    pub fn port(&self) -> usize {
        self.port
    }

    /// Column the notice concerns. For `…AboutToChange` notices delivered
    /// during a rebind this is the outgoing column.
    pub fn source(&self) -> &'a Column {
        self.source
    }

    /// Currently bound column on `port`, if it is still alive.
    pub fn input(&self, port: usize) -> Option<ColumnRef> {
        self.inputs
            .get(port)
            .and_then(Option::as_ref)
            .and_then(|b| b.column.upgrade())
    }

    /// Length of the input slot array (highest bound port + 1).
    pub fn input_slots(&self) -> usize {
        self.inputs.len()
    }
}

/// Trait implemented by every filter in the column graph.
pub trait Filter: 'static {
    /// Human-readable name of this filter.
    fn name(&self) -> &str;

    /// Declared number of input ports.
    fn input_count(&self) -> Arity;

    /// Number of output columns.
    fn output_count(&self) -> usize;

    /// Output column on `port`.
    fn output(&self, port: usize) -> Option<ColumnRef>;

    /// Label of an input port.
    fn input_label(&self, port: usize) -> String {
        format!("In{}", port + 1)
    }

    /// Whether `column` may be bound to `port`.
    fn is_input_acceptable(&self, _port: usize, _column: &Column) -> bool {
        true
    }

    /// Called for every notice concerning one of the input ports.
    fn on_input(&mut self, _ctx: &InputContext<'_>, _notice: InputNotice) {}
}

/// Anything exposing output columns that can be bound in bulk.
pub trait OutputSource {
    fn output_count(&self) -> usize;
    fn output(&self, port: usize) -> Option<ColumnRef>;
}

struct InputBinding {
    id: ColumnId,
    column: Weak<Column>,
    subscription: SubscriptionId,
}

struct NodeState<F> {
    filter: F,
    inputs: Vec<Option<InputBinding>>,
}

impl<F: Filter> NodeState<F> {
    fn binding(&self, port: usize) -> Option<&InputBinding> {
        self.inputs.get(port).and_then(Option::as_ref)
    }

    fn deliver(&mut self, port: usize, source: &Column, notice: InputNotice) {
        tracing::trace!(
            "{}: port {} ({}) <- {:?}",
            self.filter.name(),
            port,
            source.name(),
            notice
        );
        let NodeState { filter, inputs } = self;
        filter.on_input(
            &InputContext {
                port,
                source,
                inputs,
            },
            notice,
        );
    }

    /// Notify, drop the binding on `port` and shrink the slot array.
    fn disconnect(&mut self, port: usize, old: &Column) {
        self.deliver(port, old, InputNotice::AboutToBeDisconnected);
        if let Some(binding) = self.inputs.get_mut(port).and_then(Option::take) {
            old.unsubscribe(binding.subscription);
        }
        self.trim();
    }

    fn trim(&mut self) {
        while matches!(self.inputs.last(), Some(None)) {
            self.inputs.pop();
        }
    }

    fn handle_column_event(&mut self, port: usize, column: &Column, event: &ColumnEvent) {
        if self.binding(port).map(|b| b.id) != Some(column.id()) {
            return;
        }
        match InputNotice::from_column_event(event) {
            Some(notice) => self.deliver(port, column, notice),
            None => {
                tracing::debug!(
                    "{}: input '{}' on port {} is being destroyed, disconnecting",
                    self.filter.name(),
                    column.name(),
                    port
                );
                self.disconnect(port, column);
            }
        }
    }
}

impl<F> Drop for NodeState<F> {
    fn drop(&mut self) {
        for binding in self.inputs.iter().flatten() {
            if let Some(column) = binding.column.upgrade() {
                column.unsubscribe(binding.subscription);
            }
        }
    }
}

/// Shared handle to a filter and its input bindings.
///
/// Cloning the handle shares the node. The node is single-threaded and not
/// reentrant: binding ports of a node from inside its own notification hook
/// is rejected with [`PipelineError::Reentrant`].
pub struct FilterNode<F: Filter> {
    state: Rc<RefCell<NodeState<F>>>,
}

impl<F: Filter> Clone for FilterNode<F> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<F: Filter> FilterNode<F> {
    pub fn new(filter: F) -> Self {
        Self {
            state: Rc::new(RefCell::new(NodeState {
                filter,
                inputs: Vec::new(),
            })),
        }
    }

    // ── Binding ──

    /// Bind `source` to input `port`, or unbind it with `None`.
    ///
    /// Returns `false` if the port is out of range or the column is not
    /// acceptable; existing bindings are left untouched in that case.
    pub fn bind_input(&self, port: usize, source: Option<&ColumnRef>) -> bool {
        match self.try_bind_input(port, source) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Binding rejected: {}", e);
                false
            }
        }
    }

    /// Like [`bind_input`](Self::bind_input) but reports why a binding was
    /// rejected.
    pub fn try_bind_input(&self, port: usize, source: Option<&ColumnRef>) -> PipelineResult<()> {
        let node = Rc::downgrade(&self.state);
        let mut guard = self
            .state
            .try_borrow_mut()
            .map_err(|_| PipelineError::Reentrant(std::any::type_name::<F>().to_string()))?;
        let st = &mut *guard;

        match st.filter.input_count() {
            Arity::Fixed(count) if port >= count => {
                return Err(PipelineError::PortOutOfRange { port, count });
            }
            _ => {}
        }
        if let Some(column) = source {
            if !st.filter.is_input_acceptable(port, column) {
                return Err(PipelineError::InputRejected {
                    port,
                    column: column.name(),
                });
            }
        }

        let old_id = st.binding(port).map(|b| b.id);
        if old_id == source.map(|c| c.id()) {
            return Ok(());
        }
        let old_column = st.binding(port).and_then(|b| b.column.upgrade());

        let Some(new) = source else {
            match old_column {
                Some(old) => st.disconnect(port, &old),
                None => {
                    // Upstream already gone; nothing left to notify.
                    if let Some(slot) = st.inputs.get_mut(port) {
                        *slot = None;
                    }
                    st.trim();
                }
            }
            return Ok(());
        };

        let mode_changes = old_column
            .as_ref()
            .is_some_and(|old| old.mode() != new.mode());

        if let Some(old) = &old_column {
            st.deliver(port, old, InputNotice::DescriptionAboutToChange);
            st.deliver(port, old, InputNotice::PlotDesignationAboutToChange);
            st.deliver(port, old, InputNotice::MaskingAboutToChange);
            st.deliver(port, old, InputNotice::DataAboutToChange);
            if mode_changes {
                st.deliver(port, old, InputNotice::ModeAboutToChange);
            }
        }

        if let Some(binding) = st.inputs.get_mut(port).and_then(Option::take) {
            if let Some(old) = &old_column {
                old.unsubscribe(binding.subscription);
            }
        }
        if port >= st.inputs.len() {
            st.inputs.resize_with(port + 1, || None);
        }
        let subscription = Self::subscribe(new, node, port);
        st.inputs[port] = Some(InputBinding {
            id: new.id(),
            column: Rc::downgrade(new),
            subscription,
        });

        if mode_changes {
            st.deliver(port, new, InputNotice::ModeChanged);
        }
        st.deliver(port, new, InputNotice::DataChanged);
        st.deliver(port, new, InputNotice::MaskingChanged);
        st.deliver(port, new, InputNotice::PlotDesignationChanged);
        st.deliver(port, new, InputNotice::DescriptionChanged);
        Ok(())
    }

    fn subscribe(column: &Column, node: Weak<RefCell<NodeState<F>>>, port: usize) -> SubscriptionId {
        column.subscribe(move |column, event| {
            let Some(state) = node.upgrade() else {
                return;
            };
            let Ok(mut st) = state.try_borrow_mut() else {
                tracing::warn!(
                    "Dropping {:?} from '{}': filter is already handling a notification",
                    event,
                    column.name()
                );
                return;
            };
            st.handle_column_event(port, column, event);
        })
    }

    /// Bind every output of `upstream` to the input with the same index.
    ///
    /// Returns `true` only if every binding succeeded; successful bindings
    /// stay in effect either way.
    pub fn bind_outputs_of(&self, upstream: &dyn OutputSource) -> bool {
        let outputs: Vec<Option<ColumnRef>> = (0..upstream.output_count())
            .map(|port| upstream.output(port))
            .collect();

        let mut all_bound = true;
        for (port, output) in outputs.iter().enumerate() {
            all_bound &= self.bind_input(port, output.as_ref());
        }
        all_bound
    }

    // ── Queries ──

    /// First input port bound to `column`.
    pub fn port_index_of(&self, column: &Column) -> Option<usize> {
        let st = self.state.borrow();
        st.inputs
            .iter()
            .position(|b| b.as_ref().is_some_and(|b| b.id == column.id()))
    }

    /// Column bound to `port`, if any and still alive.
    pub fn input(&self, port: usize) -> Option<ColumnRef> {
        self.state
            .borrow()
            .binding(port)
            .and_then(|b| b.column.upgrade())
    }

    /// Length of the input slot array (highest bound port + 1).
    pub fn input_slots(&self) -> usize {
        self.state.borrow().inputs.len()
    }

    /// Number of ports currently bound.
    pub fn bound_input_count(&self) -> usize {
        self.state.borrow().inputs.iter().flatten().count()
    }

    pub fn input_label(&self, port: usize) -> String {
        self.state.borrow().filter.input_label(port)
    }

    pub fn input_count(&self) -> Arity {
        self.state.borrow().filter.input_count()
    }

    pub fn name(&self) -> String {
        self.state.borrow().filter.name().to_string()
    }

    /// Run `f` with shared access to the filter.
    pub fn with_filter<R>(&self, f: impl FnOnce(&F) -> R) -> R {
        f(&self.state.borrow().filter)
    }

    /// Run `f` with exclusive access to the filter.
    pub fn with_filter_mut<R>(&self, f: impl FnOnce(&mut F) -> R) -> R {
        f(&mut self.state.borrow_mut().filter)
    }
}

impl<F: Filter> OutputSource for FilterNode<F> {
    fn output_count(&self) -> usize {
        self.state
            .try_borrow()
            .map(|st| st.filter.output_count())
            .unwrap_or(0)
    }

    fn output(&self, port: usize) -> Option<ColumnRef> {
        self.state
            .try_borrow()
            .ok()
            .and_then(|st| st.filter.output(port))
    }
}
