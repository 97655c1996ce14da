//! Heap file errors.

use crate::heap::page::SlotId;
use crate::storage::{BufferPoolError, PageId, StorageError};

/// Errors from heap file operations.
#[derive(Debug)]
pub enum HeapError {
    /// A heap file with this name already exists.
    FileExists(String),

    /// A scan filter parameter is invalid.
    BadScanParam(&'static str),

    /// The record does not fit in an empty page.
    RecordTooLarge { len: usize, max: usize },

    /// The scan reached the end of the page chain.
    EndOfFile,

    /// The page does not have room for the record.
    PageFull { required: usize, available: usize },

    /// The slot does not hold a record.
    SlotNotFound(SlotId),

    /// The handle has no current page.
    NoCurrentPage,

    /// The scan has no current record.
    NoCurrentRecord,

    /// `reset_scan` was called before `mark_scan`.
    ScanNotMarked,

    /// A page chain ended before the recorded last page.
    ChainBroken(PageId),

    /// On-disk data failed validation.
    Corrupted(String),

    /// Error from the buffer pool.
    Buffer(BufferPoolError),

    /// Error from the storage backend.
    Storage(StorageError),
}

impl std::fmt::Display for HeapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeapError::FileExists(name) => write!(f, "heap file already exists: {}", name),
            HeapError::BadScanParam(msg) => write!(f, "invalid scan parameter: {}", msg),
            HeapError::RecordTooLarge { len, max } => {
                write!(f, "record of {} bytes exceeds maximum of {} bytes", len, max)
            }
            HeapError::EndOfFile => write!(f, "end of file"),
            HeapError::PageFull {
                required,
                available,
            } => write!(
                f,
                "page full: {} bytes required, {} available",
                required, available
            ),
            HeapError::SlotNotFound(slot_id) => write!(f, "no record in slot {}", slot_id),
            HeapError::NoCurrentPage => write!(f, "no current page"),
            HeapError::NoCurrentRecord => write!(f, "no current record"),
            HeapError::ScanNotMarked => write!(f, "scan position was never marked"),
            HeapError::ChainBroken(page_id) => {
                write!(f, "page chain ends early at {}", page_id)
            }
            HeapError::Corrupted(msg) => write!(f, "corrupted heap file: {}", msg),
            HeapError::Buffer(e) => write!(f, "buffer pool error: {}", e),
            HeapError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl std::error::Error for HeapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HeapError::Buffer(e) => Some(e),
            HeapError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BufferPoolError> for HeapError {
    fn from(e: BufferPoolError) -> Self {
        HeapError::Buffer(e)
    }
}

impl From<StorageError> for HeapError {
    fn from(e: StorageError) -> Self {
        HeapError::Storage(e)
    }
}
