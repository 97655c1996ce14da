//! Page identifier and size constants.

/// 8KB page size (aligned with OS page size).
pub const PAGE_SIZE: usize = 8192;

/// Unique identifier for a page within a storage backend.
///
/// A `PageId` is the page's ordinal within its file; it never changes for
/// the lifetime of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u64);

impl PageId {
    /// Creates a new PageId from a page number.
    pub const fn new(page_num: u64) -> Self {
        Self(page_num)
    }

    /// Returns the page number.
    pub const fn page_num(&self) -> u64 {
        self.0
    }

    /// Calculates the byte offset for this page in a storage file.
    pub const fn byte_offset(&self) -> u64 {
        self.0 * PAGE_SIZE as u64
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
