//! Column filter graph.
//!
//! Columns act as ports: a filter binds upstream columns to its input ports,
//! subscribes to their change notifications and maintains its own output
//! columns in response. Filters are chained by binding the outputs of one
//! node to the inputs of the next.
//!
//! # Architecture
//!
//! ```text
//! [Spreadsheet column] ──► [FilterNode<CopyThroughFilter>] ──► output column
//!                     └──► [FilterNode<ExpressionFilter>]  ──► output column
//! ```
//!
//! # Design
//!
//! - **Weak inputs** - a node never keeps an upstream column alive; a
//!   column's destruction disconnects every port bound to it.
//! - **Ordered notices** - rebinding a port delivers the about-to-change
//!   notices for the outgoing column, then the changed notices for the
//!   incoming one.
//! - **Trimmed slots** - the input slot array always ends with a bound port.

pub mod error;
pub mod id;
pub mod node;
pub mod nodes;
pub mod port;

pub use error::{PipelineError, PipelineResult};
pub use id::{ColumnId, SubscriptionId};
pub use node::{Filter, FilterNode, InputContext, OutputSource};
pub use port::{Arity, InputNotice};
