//! Error types for Trellis operations.
//!
//! This module provides the main error type [`TrellisError`]. Only
//! unrecoverable conditions end up here; structural problems in an otherwise
//! usable diagram are reported as [`Diagnostic`](crate::Diagnostic)s instead.

use std::io;

use thiserror::Error;

/// The main error type for Trellis operations.
///
/// # Diagnostic Variants
///
/// The `Input` variant keeps the source text next to the JSON error so that
/// front ends can point at the offending line and column.
#[derive(Debug, Error)]
pub enum TrellisError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Input { err: serde_json::Error, src: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Serialization error: {0}")]
    Serialize(serde_json::Error),
}

impl TrellisError {
    /// Create a new `Input` error with the associated source text.
    pub fn new_input_error(err: serde_json::Error, src: impl Into<String>) -> Self {
        Self::Input {
            err,
            src: src.into(),
        }
    }
}
