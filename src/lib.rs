//! # LabFlow-RS: Column Dataflow and Data Import
//!
//! The dataflow core of a scientific data-analysis application: typed,
//! observable columns, a filter graph in which columns act as ports, and
//! decoders that import binary and ASCII data into columns.
//!
//! ## Architecture
//!
//! - **Column**: typed data container announcing every change as an
//!   about-to-change / changed pair
//! - **Pipeline**: filters bind upstream columns to input ports, receive
//!   their notifications and maintain output columns
//! - **Import**: binary and ASCII decoders with row/column windowing that
//!   fill a data sink through a prepare/finalize protocol
//! - **Sink**: destinations of an import, e.g. a [`Spreadsheet`]
//! - **Scripting**: Rhai expressions for computed columns
//!
//! ## Configuration
//!
//! Configuration is stored in the platform-appropriate data directory under
//! `dev.labflow.labflow-rs`:
//!
//! - **Linux**: `~/.local/share/dev.labflow.labflow-rs/`
//! - **macOS**: `~/Library/Application Support/dev.labflow.labflow-rs/`
//! - **Windows**: `%APPDATA%\dev.labflow.labflow-rs\`
//!
//! ## Example
//!
//! ```ignore
//! use labflow_rs::{
//!     import::{BinaryFilter, FileFilter, FileSource},
//!     pipeline::{nodes::ExpressionFilter, FilterNode},
//!     scripting::RhaiEvaluator,
//!     ImportMode, Spreadsheet,
//! };
//!
//! let mut sheet = Spreadsheet::new("run 1");
//! let mut filter = BinaryFilter::new();
//! let outcome = filter.read_into(
//!     &FileSource::new("run1.bin"),
//!     &mut sheet,
//!     ImportMode::Replace,
//!     None,
//!     &mut |percent| println!("{}%", percent),
//! );
//!
//! let sum = FilterNode::new(ExpressionFilter::new(RhaiEvaluator::new("x1 + x2")?));
//! sum.bind_outputs_of(&sheet);
//! ```

pub mod column;
pub mod config;
pub mod error;
pub mod import;
pub mod pipeline;
pub mod scripting;
pub mod sink;
pub mod types;

// Re-export commonly used types
pub use column::{Column, ColumnEvent, ColumnRef, ColumnValues};
pub use config::{AppConfig, ImportProfile};
pub use error::{LabFlowError, Result, ResultExt};
pub use import::{FileFilter, FilterKind, ImportOutcome};
pub use pipeline::{Filter, FilterNode};
pub use sink::{DataSink, ImportCommit, Spreadsheet};
pub use types::{ByteOrder, ColumnMode, DataType, ImportMode, PlotDesignation, MISSING_VALUE};
