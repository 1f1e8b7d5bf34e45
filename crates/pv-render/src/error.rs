//! Error types for pv-render.

use thiserror::Error;

/// Errors raised while exporting a replay trace.
///
/// Drawing itself is infallible: a [`Canvas`][crate::Canvas] has no way to
/// refuse a call.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

/// Alias for `Result<T, RenderError>`.
pub type RenderResult<T> = Result<T, RenderError>;
