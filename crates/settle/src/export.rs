//! Rendering of laid-out graphs.

pub mod svg;

use thiserror::Error;

/// Errors raised while rendering or writing an export.
#[derive(Debug, Error)]
pub enum Error {
    #[error("render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
