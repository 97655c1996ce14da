//! Storage layer for page-based I/O.
//!
//! All persistent data is stored in fixed-size pages. The [`Storage`] trait
//! abstracts the backend (a single on-disk file or an in-memory map); the
//! [`BufferPool`] caches pages in memory and hands out pinned guards.
//!
//! ```text
//! +-------------------+
//! |   Heap layer      |
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! |   BufferPool      |
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! |  Storage (trait)  |
//! +-------------------+
//!       /      \
//!      v        v
//! +--------------+ +-------------+
//! | MemoryStorage| | FileStorage |
//! +--------------+ +-------------+
//! ```

pub mod buffer;
mod error;
mod file;
mod memory;
mod page;
mod traits;

pub use buffer::{BufferPool, BufferPoolError, LruReplacer, PinnedPage, Replacer};
pub use error::StorageError;
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use page::{PageId, PAGE_SIZE};
pub use traits::Storage;
