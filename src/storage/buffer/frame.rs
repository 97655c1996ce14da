//! Buffer pool frame management.

use parking_lot::RwLock;

use crate::storage::{PageId, PAGE_SIZE};

/// Index into the pool's frame array.
pub(super) type FrameId = usize;

/// A frame in the buffer pool holding one page's data.
///
/// The page bytes are behind their own `RwLock` so that frame contents can
/// be accessed without holding the pool's state lock.
pub(super) struct Frame {
    /// The page data buffer.
    pub(super) data: RwLock<Box<[u8; PAGE_SIZE]>>,
}

impl Frame {
    pub(super) fn new() -> Self {
        Self {
            data: RwLock::new(Box::new([0u8; PAGE_SIZE])),
        }
    }
}

/// Bookkeeping for one frame, protected by the pool's state lock.
#[derive(Debug)]
pub(super) struct FrameMetadata {
    /// The page currently held by this frame, or None if the frame is free.
    pub(super) page_id: Option<PageId>,
    /// Number of outstanding pins; the frame is evictable only at zero.
    pub(super) pin_count: u32,
    /// Whether the frame was modified since it was last written back.
    pub(super) is_dirty: bool,
}

impl FrameMetadata {
    pub(super) fn new() -> Self {
        Self {
            page_id: None,
            pin_count: 0,
            is_dirty: false,
        }
    }

    /// Resets the metadata after eviction.
    pub(super) fn reset(&mut self) {
        self.page_id = None;
        self.pin_count = 0;
        self.is_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_new_is_zeroed() {
        let frame = Frame::new();
        let data = frame.data.read();
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_frame_metadata_reset() {
        let mut meta = FrameMetadata::new();
        meta.page_id = Some(PageId::new(3));
        meta.pin_count = 2;
        meta.is_dirty = true;

        meta.reset();
        assert_eq!(meta.page_id, None);
        assert_eq!(meta.pin_count, 0);
        assert!(!meta.is_dirty);
    }
}
