//! Error type shared by board operations.

use tagboard_core::TaskId;
use thiserror::Error;

/// Errors returned by [`Repository`](crate::repository::Repository) operations.
///
/// When an operation fails the in-memory board is left as it was before the
/// call.
#[derive(Debug, Error)]
pub enum BoardError {
    /// The destination list is unknown, virtual, or otherwise not addressable.
    #[error("invalid target list '{list}': {reason}")]
    InvalidTarget {
        /// Requested list name.
        list: String,
        /// Human-readable explanation.
        reason: String,
    },
    /// The task id does not name a task in the board.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The store failed to write a file.
    #[error("failed to persist {path}")]
    PersistenceError {
        /// Path of the file that could not be written.
        path: String,
        /// Underlying store error.
        #[source]
        source: anyhow::Error,
    },
    /// No valid order key could be produced.
    #[error("order conflict: {0}")]
    OrderConflict(String),
    /// A background board operation panicked or was cancelled.
    #[error("board operation interrupted: {0}")]
    Interrupted(String),
}

/// Convenience alias for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

impl BoardError {
    pub(crate) fn invalid_target(list: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            list: list.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn persistence(path: &str, source: impl Into<anyhow::Error>) -> Self {
        Self::PersistenceError {
            path: path.to_owned(),
            source: source.into(),
        }
    }
}
