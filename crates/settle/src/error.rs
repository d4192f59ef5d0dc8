//! Error types for Settle operations.
//!
//! This module provides the main error type [`SettleError`] which wraps the
//! error conditions of every stage: reading input, building the graph,
//! validating the configuration, embedding, and export.

use std::{io, ops::Range};

use thiserror::Error;

use crate::{config::ConfigError, embedding::EmbedError, export, graph::GraphError};

/// The main error type for Settle operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the offending source and, when known, the byte
/// span of the error so that callers can render source snippets.
#[derive(Debug, Error)]
pub enum SettleError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{message}")]
    Parse {
        message: String,
        span: Option<Range<usize>>,
        src: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Embedding error: {0}")]
    Embed(#[from] EmbedError),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error + Send + Sync>),
}

impl From<export::Error> for SettleError {
    fn from(error: export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}

impl SettleError {
    /// Create a new `Parse` error with the associated source text.
    pub fn new_parse_error(
        message: impl Into<String>,
        span: Option<Range<usize>>,
        src: impl Into<String>,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            span,
            src: src.into(),
        }
    }
}
