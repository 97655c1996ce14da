//! Buffer pool: an in-memory cache of pages with a pin/unpin protocol.
//!
//! The pool maintains a fixed array of frames and maps pages to frames on
//! demand. Callers check pages out as [`PinnedPage`] guards; a pinned page
//! is guaranteed resident and is released exactly once, when its guard is
//! dropped. Dirty frames are written back on eviction or via
//! [`BufferPool::flush_all`].

mod error;
mod frame;
mod guard;
mod pool;
mod replacer;

pub use error::BufferPoolError;
pub use guard::PinnedPage;
pub use pool::BufferPool;
pub use replacer::{LruReplacer, Replacer};
