//! File-backed storage implementation.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::storage::{PageId, Storage, StorageError, PAGE_SIZE};

/// File-backed storage implementation.
///
/// Stores pages as contiguous 8KB blocks in a single file:
///
/// ```text
/// +------------------+------------------+------------------+
/// | Page 0 (8KB)     | Page 1 (8KB)     | Page 2 (8KB)     | ...
/// +------------------+------------------+------------------+
/// ^ offset 0         ^ offset 8192      ^ offset 16384
/// ```
///
/// The file handle is wrapped in a mutex to serialize seeks against reads
/// and writes. Durability requires an explicit [`Storage::sync_all`].
pub struct FileStorage {
    /// Path to the storage file
    path: PathBuf,
    /// File handle; held exclusively for the storage's lifetime
    file: Mutex<File>,
    /// Number of pages currently in the file
    page_count: AtomicU64,
}

impl FileStorage {
    /// Creates a new storage file at the given path.
    ///
    /// Fails with an `AlreadyExists` I/O error if the file already exists;
    /// creation never overwrites.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;
        debug!(path = %path.display(), "created storage file");
        Ok(Self {
            path,
            file: Mutex::new(file),
            page_count: AtomicU64::new(0),
        })
    }

    /// Opens an existing storage file at the given path.
    ///
    /// The page count is derived from the file size.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file does not exist, and
    /// `StorageError::Corrupted` if its size is not a multiple of PAGE_SIZE.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let file_size = file.metadata()?.len();
        if file_size % PAGE_SIZE as u64 != 0 {
            return Err(StorageError::Corrupted(format!(
                "file size {} is not a multiple of page size {}",
                file_size, PAGE_SIZE
            )));
        }

        let page_count = file_size / PAGE_SIZE as u64;
        debug!(path = %path.display(), page_count, "opened storage file");

        Ok(Self {
            path,
            file: Mutex::new(file),
            page_count: AtomicU64::new(page_count),
        })
    }

    /// Removes the storage file at the given path.
    pub fn destroy(path: impl AsRef<Path>) -> Result<(), StorageError> {
        fs::remove_file(path.as_ref())?;
        Ok(())
    }

    /// Returns the path to the storage file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<(), StorageError> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        if page_id.page_num() >= self.page_count.load(Ordering::Acquire) {
            return Err(StorageError::PageNotFound(page_id));
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(page_id.byte_offset()))?;
        file.read_exact(buf)?;

        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<(), StorageError> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        if page_id.page_num() >= self.page_count.load(Ordering::Acquire) {
            return Err(StorageError::PageNotFound(page_id));
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(page_id.byte_offset()))?;
        file.write_all(buf)?;

        Ok(())
    }

    fn allocate_page(&self) -> Result<PageId, StorageError> {
        let mut file = self.file.lock();

        // Extend the file with one zeroed page at the current end.
        let page_num = self.page_count.load(Ordering::Acquire);
        let page_id = PageId::new(page_num);

        file.seek(SeekFrom::Start(page_id.byte_offset()))?;
        file.write_all(&[0u8; PAGE_SIZE])?;

        self.page_count.store(page_num + 1, Ordering::Release);

        Ok(page_id)
    }

    fn page_count(&self) -> u64 {
        self.page_count.load(Ordering::Acquire)
    }

    fn sync_all(&self) -> Result<(), StorageError> {
        let file = self.file.lock();
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_new_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let storage = FileStorage::create(&path).unwrap();
        assert_eq!(storage.page_count(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_create_refuses_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        FileStorage::create(&path).unwrap();
        let result = FileStorage::create(&path);
        assert!(matches!(
            result,
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::AlreadyExists
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.db");

        let result = FileStorage::open(&path);
        assert!(matches!(
            result,
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound
        ));
    }

    #[test]
    fn test_allocate_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let storage = FileStorage::create(&path).unwrap();
        let page_id = storage.allocate_page().unwrap();

        let mut buf = [0u8; PAGE_SIZE];
        storage.read_page(page_id, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let storage = FileStorage::create(&path).unwrap();
        let page_id = storage.allocate_page().unwrap();

        let mut write_buf = [0u8; PAGE_SIZE];
        write_buf[0..4].copy_from_slice(&[1, 2, 3, 4]);
        storage.write_page(page_id, &write_buf).unwrap();
        storage.sync_all().unwrap();

        let mut read_buf = [0u8; PAGE_SIZE];
        storage.read_page(page_id, &mut read_buf).unwrap();
        assert_eq!(&read_buf[0..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let storage = FileStorage::create(&path).unwrap();
            let page_id = storage.allocate_page().unwrap();

            let mut buf = [0u8; PAGE_SIZE];
            buf[0] = 42;
            storage.write_page(page_id, &buf).unwrap();
            storage.sync_all().unwrap();
        }

        {
            let storage = FileStorage::open(&path).unwrap();
            assert_eq!(storage.page_count(), 1);

            let mut buf = [0u8; PAGE_SIZE];
            storage.read_page(PageId::new(0), &mut buf).unwrap();
            assert_eq!(buf[0], 42);
        }
    }

    #[test]
    fn test_corrupted_file_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        // Create a file with a size that is not a page multiple
        fs::write(&path, vec![0u8; 100]).unwrap();

        let result = FileStorage::open(&path);
        assert!(matches!(result, Err(StorageError::Corrupted(_))));
    }

    #[test]
    fn test_read_unallocated_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let storage = FileStorage::create(&path).unwrap();
        let mut buf = [0u8; PAGE_SIZE];
        let result = storage.read_page(PageId::new(0), &mut buf);
        assert!(matches!(result, Err(StorageError::PageNotFound(_))));
    }

    #[test]
    fn test_destroy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let storage = FileStorage::create(&path).unwrap();
        drop(storage);

        FileStorage::destroy(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_multiple_pages() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let storage = FileStorage::create(&path).unwrap();

        let id0 = storage.allocate_page().unwrap();
        let id1 = storage.allocate_page().unwrap();
        let id2 = storage.allocate_page().unwrap();

        for (id, value) in [(id0, 10u8), (id1, 20u8), (id2, 30u8)] {
            let mut buf = [0u8; PAGE_SIZE];
            buf[0] = value;
            storage.write_page(id, &buf).unwrap();
        }

        let mut buf = [0u8; PAGE_SIZE];
        storage.read_page(id0, &mut buf).unwrap();
        assert_eq!(buf[0], 10);
        storage.read_page(id1, &mut buf).unwrap();
        assert_eq!(buf[0], 20);
        storage.read_page(id2, &mut buf).unwrap();
        assert_eq!(buf[0], 30);
    }
}
