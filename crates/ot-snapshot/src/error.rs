//! Error types for snapshot operations.

use thiserror::Error;

/// Errors that can occur while snapshotting or restoring options.
///
/// Decode failures are deliberately absent: a corrupt blob means "nothing
/// to restore" and is handled in place, never raised.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// I/O error on the snapshot directory or a backing store file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error in the file-backed store.
    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for snapshot operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;
