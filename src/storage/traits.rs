//! Storage trait definition.

use crate::storage::{PageId, StorageError};

/// Storage backend trait for page-based I/O.
///
/// Defines the interface for reading and writing fixed-size pages using
/// caller-owned buffers. Implementations:
/// - [`MemoryStorage`](crate::storage::MemoryStorage): in-memory, for testing
/// - [`FileStorage`](crate::storage::FileStorage): disk-backed, one file of pages
///
/// All operations are synchronous and complete or fail before returning.
/// This layer does no caching; caching is the buffer pool's job.
pub trait Storage {
    /// Reads a page into a caller-provided buffer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::PageNotFound` if the page has not been allocated.
    /// Returns `StorageError::InvalidBufferSize` if `buf.len() != PAGE_SIZE`.
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Writes a page from a caller-provided buffer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::PageNotFound` if the page has not been allocated.
    /// Returns `StorageError::InvalidBufferSize` if `buf.len() != PAGE_SIZE`.
    fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<(), StorageError>;

    /// Allocates a new page and returns its PageId.
    ///
    /// The new page is initialized to zeros.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::StorageFull` if the storage limit is reached.
    fn allocate_page(&self) -> Result<PageId, StorageError>;

    /// Returns the total number of allocated pages.
    fn page_count(&self) -> u64;

    /// Syncs all pending writes to durable storage.
    ///
    /// A no-op for `MemoryStorage`; `FileStorage` calls `sync_all()` on the
    /// underlying file.
    fn sync_all(&self) -> Result<(), StorageError>;
}
