//! Error types for the local filesystem server.
//!
//! Core operations return [`FsResult<T>`]. The tool layer converts every
//! [`FsError`] into a `{"error": ...}` payload, so none of these ever reach
//! the transport as a fault.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for filesystem operations.
#[derive(Error, Debug)]
pub enum FsError {
    /// The path does not exist, or is not a regular file where one is required.
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    /// A directory was expected.
    #[error("directory not found: {0}")]
    NotADirectory(PathBuf),
    /// The destination exists and overwriting was not requested.
    #[error("destination already exists: {0}")]
    AlreadyExists(PathBuf),
    /// The file is not in a textual category.
    #[error("not a text file: {0}")]
    NotText(PathBuf),
    /// The operation is not available on this platform or for this file.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// The path or name is malformed.
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// An exclusion pattern failed to parse.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    /// An external media tool exited unsuccessfully.
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },
    /// Image decoding or encoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Any other I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type FsResult<T> = Result<T, FsError>;

impl FsError {
    /// Map an I/O error on `path` to the most specific variant.
    pub(crate) fn at(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(path.into()),
            std::io::ErrorKind::AlreadyExists => FsError::AlreadyExists(path.into()),
            _ => FsError::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::FsError;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn not_found_displays_path() {
        let err = FsError::NotFound(PathBuf::from("/missing/file"));
        assert_eq!(err.to_string(), "file not found: /missing/file");
    }

    #[test]
    fn already_exists_displays_path() {
        let err = FsError::AlreadyExists(PathBuf::from("/dst.txt"));
        assert_eq!(err.to_string(), "destination already exists: /dst.txt");
    }

    #[test]
    fn tool_error_names_the_tool() {
        let err = FsError::Tool {
            tool: "ffprobe".into(),
            message: "exit status 1".into(),
        };
        assert_eq!(err.to_string(), "ffprobe failed: exit status 1");
    }

    #[test]
    fn at_maps_io_kinds() {
        let err = FsError::at("/x", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(matches!(err, FsError::NotFound(_)));
        let err = FsError::at("/x", io::Error::new(io::ErrorKind::AlreadyExists, "here"));
        assert!(matches!(err, FsError::AlreadyExists(_)));
        let err = FsError::at("/x", io::Error::other("boom"));
        assert!(matches!(err, FsError::Io(_)));
    }
}
