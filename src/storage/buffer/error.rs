//! Buffer pool errors.

use crate::storage::StorageError;

/// Errors from buffer pool operations.
#[derive(Debug)]
pub enum BufferPoolError {
    /// All frames are pinned; no page can be brought in or evicted.
    NoFreeFrames,

    /// Error from the underlying storage backend.
    Storage(StorageError),
}

impl std::fmt::Display for BufferPoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferPoolError::NoFreeFrames => {
                write!(f, "no free frames: all pages are pinned")
            }
            BufferPoolError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl std::error::Error for BufferPoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BufferPoolError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for BufferPoolError {
    fn from(e: StorageError) -> Self {
        BufferPoolError::Storage(e)
    }
}
