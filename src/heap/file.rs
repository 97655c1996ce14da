//! Heap file lifecycle and the open-file handle.

use std::io;
use std::path::Path;

use tracing::debug;

use crate::heap::error::HeapError;
use crate::heap::header::FileHeader;
use crate::heap::page::{HeapPage, RecordId};
use crate::storage::{
    BufferPool, FileStorage, LruReplacer, PageId, PinnedPage, Replacer, Storage, StorageError,
};

/// Page holding the file header. Always the first page in storage.
pub(crate) const HEADER_PAGE_ID: PageId = PageId::new(0);

/// Frames used by the short-lived pool that formats a new file.
const FORMAT_POOL_SIZE: usize = 8;

/// Creates and formats a new heap file at `path`.
///
/// The file gets a header page and one empty data page. Fails with
/// [`HeapError::FileExists`] if a file is already present at `path`.
pub fn create_heap_file(path: impl AsRef<Path>) -> Result<(), HeapError> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let storage = match FileStorage::create(path) {
        Ok(s) => s,
        Err(StorageError::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(HeapError::FileExists(name));
        }
        Err(e) => return Err(e.into()),
    };

    let pool = BufferPool::new(
        storage,
        LruReplacer::new(FORMAT_POOL_SIZE),
        FORMAT_POOL_SIZE,
    );
    format_heap(&pool, &name)?;
    pool.flush_all()?;
    Ok(())
}

/// Formats empty storage as a heap file named `name`.
///
/// Allocates the header page and the first data page and links them.
/// Returns the header page id. The storage behind `pool` must not contain
/// any pages yet.
pub fn format_heap<S: Storage, R: Replacer>(
    pool: &BufferPool<S, R>,
    name: &str,
) -> Result<PageId, HeapError> {
    let header_page = pool.allocate_page()?;
    if header_page.page_id() != HEADER_PAGE_ID {
        return Err(HeapError::Corrupted(
            "cannot format: storage already contains pages".into(),
        ));
    }

    let data_page = pool.allocate_page()?;
    data_page.write(|buf| HeapPage::new(buf).init());

    let header = FileHeader::new(name, data_page.page_id());
    header_page.write(|buf| header.encode(buf));

    debug!(file = name, "formatted heap file");
    Ok(header_page.page_id())
}

/// Removes the heap file at `path`.
pub fn destroy_heap_file(path: impl AsRef<Path>) -> Result<(), HeapError> {
    FileStorage::destroy(path)?;
    Ok(())
}

/// An open heap file.
///
/// The handle keeps the header page pinned for its whole lifetime and at
/// most one data page pinned at a time (the "current" page, tracked
/// together with the current record position). Scans and inserts are built
/// on top of this handle.
pub struct HeapFile<S: Storage, R: Replacer> {
    pub(crate) pool: BufferPool<S, R>,
    // Declared before `header_page` so the data page unpins first on drop.
    pub(crate) cur: Option<PinnedPage<S, R>>,
    pub(crate) cur_rec: Option<RecordId>,
    header_page: PinnedPage<S, R>,
    pub(crate) header: FileHeader,
}

impl<S: Storage, R: Replacer> HeapFile<S, R> {
    /// Opens the heap file stored behind `pool`.
    ///
    /// Pins the header page and the first data page.
    pub fn open(pool: BufferPool<S, R>) -> Result<Self, HeapError> {
        let header_page = pool.pin_page(HEADER_PAGE_ID)?;
        let header = header_page.read(FileHeader::decode)?;
        let cur = pool.pin_page(header.first_page)?;

        debug!(
            file = %header.file_name,
            pages = header.page_count,
            records = header.record_count,
            "opened heap file"
        );

        Ok(Self {
            pool,
            cur: Some(cur),
            cur_rec: None,
            header_page,
            header,
        })
    }

    /// Returns the file's name.
    pub fn file_name(&self) -> &str {
        &self.header.file_name
    }

    /// Number of records in the file. Served from the cached header.
    pub fn record_count(&self) -> u32 {
        self.header.record_count
    }

    /// Number of data pages in the file's chain.
    pub fn page_count(&self) -> u32 {
        self.header.page_count
    }

    pub(crate) fn cur_page_id(&self) -> Option<PageId> {
        self.cur.as_ref().map(|p| p.page_id())
    }

    /// Fetches the record identified by `rid`.
    ///
    /// Repositions the current page to the record's page when necessary.
    pub fn get_record(&mut self, rid: RecordId) -> Result<Vec<u8>, HeapError> {
        if self.cur_page_id() != Some(rid.page_id) {
            // Release the old page before pinning the new one.
            self.cur = None;
            self.cur = Some(self.pool.pin_page(rid.page_id)?);
            self.cur_rec = Some(rid);
        }

        let cur = self.cur.as_ref().ok_or(HeapError::NoCurrentPage)?;
        cur.read(|buf| {
            HeapPage::new(buf)
                .read(rid.slot_id)
                .map(|rec| rec.to_vec())
                .ok_or(HeapError::SlotNotFound(rid.slot_id))
        })
    }

    /// Applies `f` to the cached header and writes it back to the header
    /// page.
    pub(crate) fn update_header(&mut self, f: impl FnOnce(&mut FileHeader)) {
        f(&mut self.header);
        let header = &self.header;
        self.header_page.write(|buf| header.encode(buf));
    }

    /// Closes the file, releasing its pins and flushing dirty pages.
    pub fn close(self) -> Result<(), HeapError> {
        let pool = self.pool.clone();
        drop(self);
        pool.flush_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use tempfile::tempdir;

    fn make_pool() -> BufferPool<MemoryStorage, LruReplacer> {
        BufferPool::new(MemoryStorage::new(), LruReplacer::new(16), 16)
    }

    #[test]
    fn test_format_and_open() {
        let pool = make_pool();
        format_heap(&pool, "test").unwrap();

        let file = HeapFile::open(pool).unwrap();
        assert_eq!(file.file_name(), "test");
        assert_eq!(file.record_count(), 0);
        assert_eq!(file.page_count(), 1);
        assert_eq!(file.cur_page_id(), Some(PageId::new(1)));
    }

    #[test]
    fn test_format_refuses_nonempty_storage() {
        let pool = make_pool();
        pool.allocate_page().unwrap();

        let result = format_heap(&pool, "test");
        assert!(matches!(result, Err(HeapError::Corrupted(_))));
    }

    #[test]
    fn test_create_refuses_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.heap");

        create_heap_file(&path).unwrap();
        let result = create_heap_file(&path);
        assert!(matches!(result, Err(HeapError::FileExists(_))));
    }

    #[test]
    fn test_create_and_destroy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.heap");

        create_heap_file(&path).unwrap();
        assert!(path.exists());
        destroy_heap_file(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_get_record_repositions() {
        let pool = make_pool();
        format_heap(&pool, "test").unwrap();

        // Write a record into the first data page directly.
        let slot_id = {
            let page = pool.pin_page(PageId::new(1)).unwrap();
            page.write(|buf| HeapPage::new(buf).insert(b"payload").unwrap())
        };

        let mut file = HeapFile::open(pool).unwrap();
        let rid = RecordId::new(PageId::new(1), slot_id);
        assert_eq!(file.get_record(rid).unwrap(), b"payload");

        let missing = RecordId::new(PageId::new(1), 17);
        assert!(matches!(
            file.get_record(missing),
            Err(HeapError::SlotNotFound(17))
        ));
    }

    #[test]
    fn test_close_flushes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.heap");
        create_heap_file(&path).unwrap();

        let storage = FileStorage::open(&path).unwrap();
        let pool = BufferPool::new(storage, LruReplacer::new(8), 8);
        let file = HeapFile::open(pool).unwrap();
        assert_eq!(file.file_name(), "data.heap");
        file.close().unwrap();
    }
}
