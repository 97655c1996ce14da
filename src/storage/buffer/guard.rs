//! Pinned page guard.

use std::cell::Cell;
use std::sync::Arc;

use super::frame::FrameId;
use super::pool::PoolInner;
use super::replacer::Replacer;
use crate::storage::{PageId, Storage};

/// A pinned page checked out of a [`BufferPool`](super::BufferPool).
///
/// While the guard is alive the page stays resident in its frame. Dropping
/// the guard releases exactly one pin; if the guard was marked dirty, the
/// frame is flagged for write-back.
pub struct PinnedPage<S: Storage, R: Replacer> {
    inner: Arc<PoolInner<S, R>>,
    frame_id: FrameId,
    page_id: PageId,
    dirty: Cell<bool>,
}

impl<S: Storage, R: Replacer> PinnedPage<S, R> {
    pub(super) fn new(inner: Arc<PoolInner<S, R>>, frame_id: FrameId, page_id: PageId) -> Self {
        Self {
            inner,
            frame_id,
            page_id,
            dirty: Cell::new(false),
        }
    }

    /// Returns the id of the pinned page.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Whether this guard will mark its frame dirty on release.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Marks the page dirty without writing through this guard.
    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    /// Runs `f` with shared access to the page bytes.
    pub fn read<T>(&self, f: impl FnOnce(&[u8]) -> T) -> T {
        let data = self.inner.frames[self.frame_id].data.read();
        f(&data[..])
    }

    /// Runs `f` with exclusive access to the page bytes and marks the page
    /// dirty.
    pub fn write<T>(&self, f: impl FnOnce(&mut [u8]) -> T) -> T {
        let mut data = self.inner.frames[self.frame_id].data.write();
        self.dirty.set(true);
        f(&mut data[..])
    }
}

impl<S: Storage, R: Replacer> Drop for PinnedPage<S, R> {
    fn drop(&mut self) {
        self.inner.unpin(self.frame_id, self.dirty.get());
    }
}
