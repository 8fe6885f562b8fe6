//! Pipeline-specific error types.

use thiserror::Error;

/// Reasons a port binding can be rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Port {port} out of range (filter has {count} inputs)")]
    PortOutOfRange { port: usize, count: usize },

    #[error("Input '{column}' not acceptable on port {port}")]
    InputRejected { port: usize, column: String },

    #[error("Filter '{0}' is busy handling a notification")]
    Reentrant(String),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
