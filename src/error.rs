//! Error handling for LabFlow
//!
//! This module defines custom error types and a Result alias for use
//! throughout the crate. The import and binding operations report most
//! outcomes through return values; these errors cover I/O, configuration
//! and evaluator failures underneath them.

use thiserror::Error;

/// Main error type for LabFlow operations
#[derive(Error, Debug)]
pub enum LabFlowError {
    /// Errors related to expression evaluation
    #[error("Evaluator error: {0}")]
    Evaluator(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<LabFlowError>,
    },
}

impl LabFlowError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        LabFlowError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an evaluator error from a Rhai error
    pub fn from_rhai_error(err: Box<rhai::EvalAltResult>) -> Self {
        LabFlowError::Evaluator(err.to_string())
    }
}

impl From<toml::de::Error> for LabFlowError {
    fn from(err: toml::de::Error) -> Self {
        LabFlowError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for LabFlowError {
    fn from(err: toml::ser::Error) -> Self {
        LabFlowError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for LabFlowError {
    fn from(err: serde_json::Error) -> Self {
        LabFlowError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for LabFlowError {
    fn from(err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(e) => LabFlowError::Io(e),
            other => LabFlowError::Serialization(format!("{:?}", other)),
        }
    }
}

/// Result type alias for LabFlow operations
pub type Result<T> = std::result::Result<T, LabFlowError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| LabFlowError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| LabFlowError::from(e).with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, Box<rhai::EvalAltResult>> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| LabFlowError::from_rhai_error(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| LabFlowError::from_rhai_error(e).with_context(f()))
    }
}
