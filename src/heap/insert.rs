//! Record insertion: appends to the tail of the page chain.

use tracing::error;

use crate::heap::error::HeapError;
use crate::heap::file::HeapFile;
use crate::heap::page::{HeapPage, RecordId, MAX_RECORD_SIZE};
use crate::storage::{PageId, Replacer, Storage};

/// An insertion cursor over a heap file.
///
/// Insertions always target the chain's tail page. When the tail has no
/// room, a fresh page is allocated, linked after the old tail, and becomes
/// the new tail.
pub struct InsertFileScan<S: Storage, R: Replacer> {
    file: HeapFile<S, R>,
}

impl<S: Storage, R: Replacer> InsertFileScan<S, R> {
    pub fn new(file: HeapFile<S, R>) -> Self {
        Self { file }
    }

    /// Inserts a record and returns its id.
    ///
    /// Rejects records larger than [`MAX_RECORD_SIZE`] before any I/O.
    pub fn insert_record(&mut self, record: &[u8]) -> Result<RecordId, HeapError> {
        if record.len() > MAX_RECORD_SIZE {
            return Err(HeapError::RecordTooLarge {
                len: record.len(),
                max: MAX_RECORD_SIZE,
            });
        }

        // Reposition to the tail page.
        if self.file.cur_page_id() != Some(self.file.header.last_page) {
            let tail = self.file.header.last_page;
            self.file.cur = None;
            self.file.cur = Some(self.file.pool.pin_page(tail)?);
            self.file.cur_rec = None;
        }

        let (tail_id, attempt) = {
            let cur = self.file.cur.as_ref().ok_or(HeapError::NoCurrentPage)?;
            (
                cur.page_id(),
                cur.write(|buf| HeapPage::new(buf).insert(record)),
            )
        };

        let rid = match attempt {
            Ok(slot_id) => RecordId::new(tail_id, slot_id),
            Err(HeapError::PageFull { .. }) => self.extend_chain(tail_id, record)?,
            Err(e) => return Err(e),
        };

        self.file.cur_rec = Some(rid);
        self.file.update_header(|h| h.record_count += 1);
        Ok(rid)
    }

    /// Allocates a new tail page, links it after `tail_id`, and inserts the
    /// record there.
    fn extend_chain(&mut self, tail_id: PageId, record: &[u8]) -> Result<RecordId, HeapError> {
        let new_page = self.file.pool.allocate_page()?;
        let new_id = new_page.page_id();
        new_page.write(|buf| HeapPage::new(buf).init());

        // Forward-link the old tail to the new page.
        {
            let cur = self.file.cur.as_ref().ok_or(HeapError::NoCurrentPage)?;
            cur.write(|buf| HeapPage::new(buf).set_next_page(Some(new_id)));
        }

        // Swap the cursor to the new tail; the old tail unpins dirty.
        self.file.cur = Some(new_page);
        self.file.cur_rec = None;
        self.file.update_header(|h| {
            h.last_page = new_id;
            h.page_count += 1;
        });

        let slot_id = {
            let cur = self.file.cur.as_ref().ok_or(HeapError::NoCurrentPage)?;
            cur.write(|buf| HeapPage::new(buf).insert(record))
        }
        .map_err(|e| {
            // A record below MAX_RECORD_SIZE must fit in a freshly
            // initialized page.
            error!(
                old_tail = %tail_id,
                new_tail = %new_id,
                "insert into freshly allocated page failed: {}",
                e
            );
            e
        })?;

        Ok(RecordId::new(new_id, slot_id))
    }

    /// Number of records in the file.
    pub fn record_count(&self) -> u32 {
        self.file.record_count()
    }

    /// Returns the underlying file handle.
    pub fn into_file(self) -> HeapFile<S, R> {
        self.file
    }

    /// Closes the underlying file.
    pub fn close(self) -> Result<(), HeapError> {
        self.file.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::file::format_heap;
    use crate::storage::{BufferPool, LruReplacer, MemoryStorage, PageId};

    fn new_insert() -> InsertFileScan<MemoryStorage, LruReplacer> {
        let pool = BufferPool::new(MemoryStorage::new(), LruReplacer::new(16), 16);
        format_heap(&pool, "insert_test").unwrap();
        InsertFileScan::new(HeapFile::open(pool).unwrap())
    }

    #[test]
    fn test_insert_returns_rid() {
        let mut insert = new_insert();

        let rid = insert.insert_record(b"hello").unwrap();
        assert_eq!(rid.page_id, PageId::new(1));
        assert_eq!(insert.record_count(), 1);
    }

    #[test]
    fn test_insert_then_get() {
        let mut insert = new_insert();

        let rid = insert.insert_record(b"payload").unwrap();
        let mut file = insert.into_file();
        assert_eq!(file.get_record(rid).unwrap(), b"payload");
    }

    #[test]
    fn test_record_too_large() {
        let mut insert = new_insert();

        let oversized = vec![0u8; MAX_RECORD_SIZE + 1];
        let err = insert.insert_record(&oversized).unwrap_err();
        assert!(matches!(err, HeapError::RecordTooLarge { .. }));
        assert_eq!(insert.record_count(), 0);
    }

    #[test]
    fn test_max_size_record() {
        let mut insert = new_insert();

        let record = vec![5u8; MAX_RECORD_SIZE];
        let rid = insert.insert_record(&record).unwrap();
        let mut file = insert.into_file();
        assert_eq!(file.get_record(rid).unwrap(), record);
    }

    #[test]
    fn test_overflow_extends_chain() {
        let mut insert = new_insert();

        let record = vec![1u8; 1000];
        let mut rids = Vec::new();
        // 8 kB pages hold at most 8 such records.
        for _ in 0..20 {
            rids.push(insert.insert_record(&record).unwrap());
        }

        let mut file = insert.into_file();
        assert!(file.page_count() > 1);
        assert_eq!(file.record_count(), 20);
        // The chain grew; later records live on later pages.
        assert!(rids.last().unwrap().page_id > rids[0].page_id);
        for rid in &rids {
            assert_eq!(file.get_record(*rid).unwrap(), record);
        }
    }
}
