//! Typed error handling for deadcss.
//!
//! Skip conditions (no project root, ignored stylesheet, unknown extension)
//! are not errors and never show up here; they surface as `None` from the
//! detection entry points.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for deadcss operations.
#[derive(Error, Debug)]
pub enum DeadcssError {
    /// I/O error when reading/writing files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Fix operation errors
    #[error("Fix error: {message}")]
    Fix { message: String },

    /// Unexpected fault inside a detection pass
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DeadcssError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a fix error.
    pub fn fix(message: impl Into<String>) -> Self {
        Self::Fix {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Convenience type alias for deadcss results.
pub type DeadcssResult<T> = Result<T, DeadcssError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> DeadcssResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> DeadcssResult<T> {
        self.map_err(|e| DeadcssError::io(path, e))
    }
}
