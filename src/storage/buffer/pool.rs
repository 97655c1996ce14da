//! Buffer pool implementation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use super::error::BufferPoolError;
use super::frame::{Frame, FrameId, FrameMetadata};
use super::guard::PinnedPage;
use super::replacer::Replacer;
use crate::storage::{PageId, Storage};

/// A fixed-size cache of pages layered over a [`Storage`] backend.
///
/// Pinning a page brings it into a frame (reading from storage on a miss)
/// and hands back a [`PinnedPage`] guard. While any guard for a page is
/// alive the page cannot be evicted. When the last guard drops, the frame
/// becomes an eviction candidate in the pool's [`Replacer`].
///
/// The pool is cheaply cloneable; clones share the same frames and state.
pub struct BufferPool<S: Storage, R: Replacer> {
    inner: Arc<PoolInner<S, R>>,
}

impl<S: Storage, R: Replacer> Clone for BufferPool<S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Mutable pool state, protected by a single mutex.
///
/// Frame data itself lives outside this lock (each frame carries its own
/// `RwLock`), so page contents can be read or written without blocking
/// pin/unpin traffic.
pub(super) struct PoolState<R: Replacer> {
    /// Maps resident pages to their frames.
    pub(super) page_table: HashMap<PageId, FrameId>,
    /// Per-frame bookkeeping, indexed by FrameId.
    pub(super) frame_metadata: Vec<FrameMetadata>,
    /// Frames that have never held a page (or were explicitly freed).
    pub(super) free_list: Vec<FrameId>,
    /// Eviction policy over fully unpinned frames.
    pub(super) replacer: R,
}

pub(super) struct PoolInner<S: Storage, R: Replacer> {
    pub(super) storage: S,
    pub(super) frames: Vec<Frame>,
    pub(super) state: Mutex<PoolState<R>>,
    pool_size: usize,
}

impl<S: Storage, R: Replacer> BufferPool<S, R> {
    /// Creates a buffer pool with `pool_size` frames over `storage`.
    ///
    /// # Panics
    ///
    /// Panics if `pool_size` is zero.
    pub fn new(storage: S, replacer: R, pool_size: usize) -> Self {
        assert!(pool_size > 0, "buffer pool must have at least one frame");

        let frames = (0..pool_size).map(|_| Frame::new()).collect();
        let frame_metadata = (0..pool_size).map(|_| FrameMetadata::new()).collect();
        // Reversed so frames are handed out in ascending order.
        let free_list = (0..pool_size).rev().collect();

        Self {
            inner: Arc::new(PoolInner {
                storage,
                frames,
                state: Mutex::new(PoolState {
                    page_table: HashMap::with_capacity(pool_size),
                    frame_metadata,
                    free_list,
                    replacer,
                }),
                pool_size,
            }),
        }
    }

    /// Pins a page, reading it from storage if it is not resident.
    ///
    /// The returned guard keeps the page resident until it is dropped.
    pub fn pin_page(&self, page_id: PageId) -> Result<PinnedPage<S, R>, BufferPoolError> {
        let frame_id = self.inner.get_or_allocate_frame(page_id)?;
        Ok(PinnedPage::new(Arc::clone(&self.inner), frame_id, page_id))
    }

    /// Allocates a fresh page in storage and pins it.
    ///
    /// The new page's contents are zeroed.
    pub fn allocate_page(&self) -> Result<PinnedPage<S, R>, BufferPoolError> {
        let page_id = self.inner.storage.allocate_page()?;
        self.pin_page(page_id)
    }

    /// Writes all dirty frames back to storage and syncs it.
    pub fn flush_all(&self) -> Result<(), BufferPoolError> {
        let mut state = self.inner.state.lock();

        for frame_id in 0..self.inner.pool_size {
            let meta = &state.frame_metadata[frame_id];
            if !meta.is_dirty {
                continue;
            }
            let page_id = match meta.page_id {
                Some(id) => id,
                None => continue,
            };

            let data = self.inner.frames[frame_id].data.read();
            self.inner.storage.write_page(page_id, &data[..])?;
            drop(data);

            state.frame_metadata[frame_id].is_dirty = false;
        }

        self.inner.storage.sync_all()?;
        Ok(())
    }

    /// Returns the number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.inner.pool_size
    }

    /// Returns the number of pages currently resident.
    pub fn cached_pages(&self) -> usize {
        self.inner.state.lock().page_table.len()
    }

    /// Returns a reference to the underlying storage backend.
    pub fn storage(&self) -> &S {
        &self.inner.storage
    }
}

impl<S: Storage, R: Replacer> PoolInner<S, R> {
    /// Finds the frame holding `page_id`, or brings the page in.
    fn get_or_allocate_frame(&self, page_id: PageId) -> Result<FrameId, BufferPoolError> {
        let mut state = self.state.lock();

        // Cache hit: bump the pin count.
        if let Some(&frame_id) = state.page_table.get(&page_id) {
            if state.frame_metadata[frame_id].pin_count == 0 {
                state.replacer.pin(frame_id);
            }
            state.frame_metadata[frame_id].pin_count += 1;
            return Ok(frame_id);
        }

        // Cache miss: claim a frame and read the page into it.
        let frame_id = self.claim_frame(&mut state)?;

        {
            let mut data = self.frames[frame_id].data.write();
            if let Err(e) = self.storage.read_page(page_id, &mut data[..]) {
                // The frame was never installed in the page table; put it
                // back on the free list.
                state.free_list.push(frame_id);
                return Err(e.into());
            }
        }

        let meta = &mut state.frame_metadata[frame_id];
        meta.page_id = Some(page_id);
        meta.pin_count = 1;
        meta.is_dirty = false;
        state.page_table.insert(page_id, frame_id);

        Ok(frame_id)
    }

    /// Takes a frame from the free list or evicts one.
    ///
    /// Dirty victims are written back before the frame is reused.
    fn claim_frame(&self, state: &mut PoolState<R>) -> Result<FrameId, BufferPoolError> {
        if let Some(frame_id) = state.free_list.pop() {
            return Ok(frame_id);
        }

        let frame_id = state.replacer.evict().ok_or(BufferPoolError::NoFreeFrames)?;

        let meta = &state.frame_metadata[frame_id];
        if meta.is_dirty {
            let page_id = meta.page_id.ok_or_else(|| {
                BufferPoolError::Storage(crate::storage::StorageError::Corrupted(
                    "dirty frame has no page".into(),
                ))
            })?;
            let data = self.frames[frame_id].data.read();
            self.storage.write_page(page_id, &data[..])?;
        }

        if let Some(old_page) = state.frame_metadata[frame_id].page_id {
            state.page_table.remove(&old_page);
        }
        state.frame_metadata[frame_id].reset();

        Ok(frame_id)
    }

    /// Releases one pin on a frame, marking it dirty if requested.
    ///
    /// Unpinning a frame with no outstanding pins is tolerated and logged.
    pub(super) fn unpin(&self, frame_id: FrameId, dirty: bool) {
        let mut state = self.state.lock();
        let meta = &mut state.frame_metadata[frame_id];

        if meta.pin_count == 0 {
            warn!(frame_id, "unpin of a frame that is not pinned");
            return;
        }

        meta.pin_count -= 1;
        if dirty {
            meta.is_dirty = true;
        }

        if meta.pin_count == 0 {
            state.replacer.unpin(frame_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LruReplacer, MemoryStorage, StorageError, PAGE_SIZE};

    fn make_pool(pool_size: usize) -> BufferPool<MemoryStorage, LruReplacer> {
        BufferPool::new(MemoryStorage::new(), LruReplacer::new(pool_size), pool_size)
    }

    #[test]
    fn test_allocate_and_pin() {
        let pool = make_pool(4);

        let page = pool.allocate_page().unwrap();
        assert_eq!(page.page_id(), PageId::new(0));
        page.read(|data| assert!(data.iter().all(|&b| b == 0)));
    }

    #[test]
    fn test_write_survives_eviction() {
        let pool = make_pool(1);

        let first_id = {
            let page = pool.allocate_page().unwrap();
            page.write(|data| data[0] = 7);
            page.page_id()
        };

        // A single frame forces eviction of the first page.
        {
            let page = pool.allocate_page().unwrap();
            assert_ne!(page.page_id(), first_id);
        }

        let page = pool.pin_page(first_id).unwrap();
        page.read(|data| assert_eq!(data[0], 7));
    }

    #[test]
    fn test_no_free_frames_when_all_pinned() {
        let pool = make_pool(2);

        let _a = pool.allocate_page().unwrap();
        let _b = pool.allocate_page().unwrap();

        let result = pool.allocate_page();
        assert!(matches!(result, Err(BufferPoolError::NoFreeFrames)));
    }

    #[test]
    fn test_pin_count_shared_frame() {
        let pool = make_pool(2);

        let page_id = pool.allocate_page().unwrap().page_id();

        let a = pool.pin_page(page_id).unwrap();
        let b = pool.pin_page(page_id).unwrap();
        drop(a);

        // Dropping one of two guards leaves the page pinned.
        b.read(|data| assert!(data.iter().all(|&v| v == 0)));
        drop(b);

        assert_eq!(pool.cached_pages(), 1);
    }

    #[test]
    fn test_pin_missing_page() {
        let pool = make_pool(2);

        let result = pool.pin_page(PageId::new(99));
        assert!(matches!(
            result,
            Err(BufferPoolError::Storage(StorageError::PageNotFound(_)))
        ));
        // The failed pin must not leak its frame.
        assert_eq!(pool.cached_pages(), 0);
        let _a = pool.allocate_page().unwrap();
        let _b = pool.allocate_page().unwrap();
    }

    #[test]
    fn test_flush_all_writes_dirty_pages() {
        let pool = make_pool(4);

        let page_id = {
            let page = pool.allocate_page().unwrap();
            page.write(|data| data[10] = 99);
            page.page_id()
        };

        pool.flush_all().unwrap();

        let mut buf = [0u8; PAGE_SIZE];
        pool.storage().read_page(page_id, &mut buf).unwrap();
        assert_eq!(buf[10], 99);
    }

    #[test]
    fn test_cached_pages() {
        let pool = make_pool(4);

        assert_eq!(pool.cached_pages(), 0);
        let _a = pool.allocate_page().unwrap();
        let _b = pool.allocate_page().unwrap();
        assert_eq!(pool.cached_pages(), 2);
    }

    #[test]
    fn test_clone_shares_frames() {
        let pool = make_pool(4);
        let clone = pool.clone();

        let page_id = {
            let page = pool.allocate_page().unwrap();
            page.write(|data| data[0] = 5);
            page.page_id()
        };

        let page = clone.pin_page(page_id).unwrap();
        page.read(|data| assert_eq!(data[0], 5));
    }

    #[test]
    #[should_panic]
    fn test_zero_size_pool_panics() {
        make_pool(0);
    }
}
