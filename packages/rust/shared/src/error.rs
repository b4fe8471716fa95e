//! Error types for PersonaKit.
//!
//! Library crates use [`PersonaKitError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all PersonaKit operations.
#[derive(Debug, thiserror::Error)]
pub enum PersonaKitError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level HTTP failure (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The content source rejected the request or returned unusable data.
    #[error("content source error: {0}")]
    Source(String),

    /// The summarization service failed (quota, auth, empty response).
    #[error("summarization error: {0}")]
    Summarize(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (malformed subject identifier, bad URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Pipeline construction error.
    #[error("pipeline error: {0}")]
    Pipeline(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PersonaKitError>;

impl PersonaKitError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
