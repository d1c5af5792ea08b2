//! Error types for prompttree.
//!
//! Library crates use [`PromptTreeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all prompttree operations.
#[derive(Debug, thiserror::Error)]
pub enum PromptTreeError {
    /// Configuration loading or validation error (bad file, unknown scope/format).
    #[error("config error: {message}")]
    Config { message: String },

    /// A scope that needs a target name was requested without one.
    #[error("config error: scope '{scope}' requires a target name")]
    MissingTarget { scope: String },

    /// No entry blob exists at the requested path.
    #[error("entry not found: {path}")]
    NotFound { path: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Rendering an aggregated context failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Data validation error (malformed component listing, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PromptTreeError>;

impl PromptTreeError {
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

    /// Create a not-found error for an entry path.
    pub fn not_found(path: impl ToString) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a caller configuration mistake.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::MissingTarget { .. })
    }
}
