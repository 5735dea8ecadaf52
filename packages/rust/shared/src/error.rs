//! Error types for scrapechain.
//!
//! Library crates use [`ScrapechainError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! A stage exiting non-zero is *not* an error: it is reported as a
//! `StageOutcome::Failed` value so the runner can branch on it explicitly.

use std::path::PathBuf;

/// Top-level error type for all scrapechain operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrapechainError {
    /// Configuration loading or parsing error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Pipeline plan validation error (broken artifact binding, empty program, ...).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A stage program could not be started or waited on.
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// Reading the search term from the operator failed.
    #[error("prompt error: {0}")]
    Prompt(#[source] std::io::Error),

    /// The runner attempted a transition its state machine forbids.
    #[error("invalid pipeline state transition: {from} -> {to}")]
    State { from: String, to: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScrapechainError>;

impl ScrapechainError {
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

    /// Wrap a spawn/wait failure with the program name.
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}
