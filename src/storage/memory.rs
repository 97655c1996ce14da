//! In-memory storage implementation for testing.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::storage::{PageId, Storage, StorageError, PAGE_SIZE};

/// In-memory storage implementation for testing.
///
/// Uses a `HashMap<PageId, Box<[u8; PAGE_SIZE]>>` behind a `Mutex`. Not
/// persistent; all data is lost when dropped.
pub struct MemoryStorage {
    /// Raw page data: PageId -> [u8; PAGE_SIZE]
    pages: Mutex<HashMap<PageId, Box<[u8; PAGE_SIZE]>>>,
    /// Next page ID to allocate
    next_page_id: Mutex<u64>,
    /// Optional maximum page count (for testing storage-full scenarios)
    max_pages: Option<u64>,
}

impl MemoryStorage {
    /// Creates a new empty memory storage.
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            next_page_id: Mutex::new(0),
            max_pages: None,
        }
    }

    /// Creates a new memory storage with a maximum page limit.
    ///
    /// Useful for testing `StorageFull` error scenarios.
    pub fn with_max_pages(max_pages: u64) -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            next_page_id: Mutex::new(0),
            max_pages: Some(max_pages),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<(), StorageError> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        let pages = self.pages.lock();
        let page = pages
            .get(&page_id)
            .ok_or(StorageError::PageNotFound(page_id))?;

        buf.copy_from_slice(&**page);
        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<(), StorageError> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        let mut pages = self.pages.lock();
        let page = pages
            .get_mut(&page_id)
            .ok_or(StorageError::PageNotFound(page_id))?;

        page.copy_from_slice(buf);
        Ok(())
    }

    fn allocate_page(&self) -> Result<PageId, StorageError> {
        let mut next_id = self.next_page_id.lock();

        if let Some(max) = self.max_pages {
            if *next_id >= max {
                return Err(StorageError::StorageFull);
            }
        }

        let page_id = PageId::new(*next_id);
        *next_id += 1;

        let mut pages = self.pages.lock();
        pages.insert(page_id, Box::new([0u8; PAGE_SIZE]));

        Ok(page_id)
    }

    fn page_count(&self) -> u64 {
        *self.next_page_id.lock()
    }

    fn sync_all(&self) -> Result<(), StorageError> {
        // No-op: data is already in memory.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_read() {
        let storage = MemoryStorage::new();

        let page_id = storage.allocate_page().unwrap();
        assert_eq!(page_id, PageId::new(0));

        let mut buf = [0u8; PAGE_SIZE];
        storage.read_page(page_id, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_and_read() {
        let storage = MemoryStorage::new();
        let page_id = storage.allocate_page().unwrap();

        let mut write_buf = [0u8; PAGE_SIZE];
        write_buf[0..4].copy_from_slice(&[1, 2, 3, 4]);
        storage.write_page(page_id, &write_buf).unwrap();

        let mut read_buf = [0u8; PAGE_SIZE];
        storage.read_page(page_id, &mut read_buf).unwrap();
        assert_eq!(&read_buf[0..4], &[1, 2, 3, 4]);
        assert_eq!(&read_buf[4..8], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_read_unallocated_page() {
        let storage = MemoryStorage::new();
        let mut buf = [0u8; PAGE_SIZE];
        let result = storage.read_page(PageId::new(0), &mut buf);
        assert!(matches!(result, Err(StorageError::PageNotFound(_))));
    }

    #[test]
    fn test_write_unallocated_page() {
        let storage = MemoryStorage::new();
        let buf = [0u8; PAGE_SIZE];
        let result = storage.write_page(PageId::new(0), &buf);
        assert!(matches!(result, Err(StorageError::PageNotFound(_))));
    }

    #[test]
    fn test_page_count() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.page_count(), 0);

        storage.allocate_page().unwrap();
        assert_eq!(storage.page_count(), 1);

        storage.allocate_page().unwrap();
        assert_eq!(storage.page_count(), 2);
    }

    #[test]
    fn test_storage_full() {
        let storage = MemoryStorage::with_max_pages(2);

        storage.allocate_page().unwrap();
        storage.allocate_page().unwrap();

        let result = storage.allocate_page();
        assert!(matches!(result, Err(StorageError::StorageFull)));
    }

    #[test]
    fn test_invalid_buffer_size() {
        let storage = MemoryStorage::new();
        let page_id = storage.allocate_page().unwrap();

        let mut buf = [0u8; 100];
        assert!(matches!(
            storage.read_page(page_id, &mut buf),
            Err(StorageError::InvalidBufferSize { expected: PAGE_SIZE, actual: 100 })
        ));
        assert!(matches!(
            storage.write_page(page_id, &buf),
            Err(StorageError::InvalidBufferSize { expected: PAGE_SIZE, actual: 100 })
        ));
    }
}
