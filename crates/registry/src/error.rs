use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A registry line that could not be decoded into a descriptor.
///
/// Carries the offending line verbatim so it can be reported and preserved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed registry line ({reason}): {content}")]
pub struct ParseError {
    /// The raw line, without its terminator.
    pub content: String,
    /// Why decoding failed.
    pub reason: String,
}

impl ParseError {
    pub(crate) fn new(content: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An underlying I/O error on the registry or its temporary file.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A descriptor could not be serialized.
    #[error("failed to encode descriptor: {0}")]
    Encode(#[from] serde_json::Error),

    /// A line the caller required could not be decoded.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A removal targeted a line past the end of the file.
    #[error("line {index} is out of range (registry has {len} lines)")]
    LineOutOfRange { index: usize, len: usize },
}

impl RegistryError {
    /// Returns a closure that wraps an [`io::Error`] with the path it occurred on.
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
