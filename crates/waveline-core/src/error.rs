//! Visualization pipeline error types

use std::any::Any;

use thiserror::Error;

/// Errors that can occur anywhere in the visualization pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VisualizationError {
    /// No spectral analyzer bound to the pipeline
    #[error("Spectral analyzer unavailable")]
    AnalyzerUnavailable,

    /// Zero-length samples or spectrum
    #[error("Empty input")]
    EmptyInput,

    /// Zero width or height requested
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// A worker job failed or panicked
    #[error("Compute failure: {0}")]
    ComputeFailure(String),
}

impl VisualizationError {
    /// Convert a caught panic payload into a `ComputeFailure`
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "worker panicked".to_string()
        };
        VisualizationError::ComputeFailure(message)
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, VisualizationError>;
