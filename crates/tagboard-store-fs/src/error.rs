//! Error types for filesystem store operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during `FsStore` operations.
#[derive(Error, Debug)]
pub enum FsStoreError {
    /// Path is empty, absolute, or escapes the board root.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Directory traversal failed.
    #[error("Failed to walk {root}")]
    Walk {
        /// Board root being walked.
        root: PathBuf,
        /// Underlying traversal error.
        #[source]
        source: Box<walkdir::Error>,
    },

    /// I/O operation failed.
    #[error("I/O error on {path}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
