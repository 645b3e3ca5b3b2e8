//! Error types for business definition resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort a pipeline run.
///
/// A reference to a missing definition file is not an error; see
/// [`Resolution::NotFound`](crate::Resolution::NotFound).
#[derive(Debug, Error)]
pub enum ResolveError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid document {path}: {message}")]
    InvalidDocument { path: PathBuf, message: String },

    #[error("invalid business definition {path}: {message}")]
    InvalidDefinition { path: PathBuf, message: String },

    #[error("cannot detect document kind of {path}: expected an OpenAPI or ODCS document")]
    UnknownDocumentKind { path: PathBuf },

    #[error("failed to serialize document: {message}")]
    Serialize { message: String },
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ResolveError::FileNotFound { .. }
            | ResolveError::ReadError { .. }
            | ResolveError::WriteError { .. } => 3,
            _ => 2,
        }
    }
}
