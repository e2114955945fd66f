use std::path::{Path, PathBuf};

/// Crate-wide result alias.
pub type ArchilumeResult<T> = Result<T, ArchilumeError>;

/// Errors surfaced by the orchestration layer.
///
/// Only pre-flight problems and hard failures travel through this type. Per-view render problems
/// inside a batch are recorded in the batch report instead.
#[derive(thiserror::Error, Debug)]
pub enum ArchilumeError {
    /// Invalid user input (resolution, dates, coordinates, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// Quality preset name outside the closed set.
    #[error("unknown preset '{name}' (valid: {valid})")]
    UnknownPreset {
        /// Name as supplied by the caller.
        name: String,
        /// Comma-separated list of accepted names.
        valid: String,
    },

    /// A required input file or executable does not exist.
    #[error("{what} not found: {}", path.display())]
    NotFound {
        /// Human-readable kind of the missing thing.
        what: &'static str,
        /// Path that was checked.
        path: PathBuf,
    },

    /// An external tool could not be started or exited unsuccessfully.
    #[error("process error: {0}")]
    Process(String),

    /// Malformed input file content.
    #[error("parse error: {0}")]
    Parse(String),

    /// Image decode/encode failure.
    #[error("image error: {0}")]
    Image(String),

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Anything else, usually with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ArchilumeError {
    /// Build a [`ArchilumeError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ArchilumeError::NotFound`].
    pub fn not_found(what: &'static str, path: impl AsRef<Path>) -> Self {
        Self::NotFound {
            what,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Build a [`ArchilumeError::Process`].
    pub fn process(msg: impl Into<String>) -> Self {
        Self::Process(msg.into())
    }

    /// Build a [`ArchilumeError::Parse`].
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`ArchilumeError::Image`].
    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
