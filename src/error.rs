use crate::mcp::errors;
use std::io;
use std::path::PathBuf;

/// Failure kinds surfaced by the document engines and the tool boundary.
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("{kind} index {index} is out of range ({count} available)")]
    IndexOutOfRange {
        kind: &'static str,
        index: i64,
        count: usize,
    },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl DocError {
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wire-level kind reported in `structuredContent.error.kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            DocError::FileNotFound(_) => errors::FILE_NOT_FOUND,
            DocError::InvalidDocument(_) => errors::INVALID_DOCUMENT,
            DocError::IndexOutOfRange { .. } => errors::INDEX_OUT_OF_RANGE,
            DocError::InvalidArgument(_) => errors::INVALID_ARGUMENT,
            DocError::Io { .. } => errors::IO_FAILURE,
        }
    }
}

pub type Result<T, E = DocError> = std::result::Result<T, E>;

/// Converts a caller-supplied rank into a position, rejecting negatives and
/// anything at or past `count`.
pub fn checked_index(kind: &'static str, index: i64, count: usize) -> Result<usize> {
    match usize::try_from(index) {
        Ok(position) if position < count => Ok(position),
        _ => Err(DocError::IndexOutOfRange { kind, index, count }),
    }
}
