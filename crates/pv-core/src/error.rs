//! Core error type.
//!
//! Downstream crates wrap `CoreError` as one variant of their own enum via a
//! `From` impl, so `?` works across crate boundaries.

use thiserror::Error;

/// The error type for `pv-core` and a common base for the other crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid motion {letter:?} for the {model} action model")]
    InvalidMotion {
        letter: String,
        model:  &'static str,
    },

    #[error("cannot move forward from an undirected pose {0}")]
    UndirectedForward(crate::Pose),

    #[error("invalid heading {0:?}: expected one of E, N, W, S, N/A")]
    InvalidHeading(String),

    #[error("map error: {0}")]
    Map(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `pv-core`.
pub type CoreResult<T> = Result<T, CoreError>;
