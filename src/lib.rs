//! Heap-file storage: unordered collections of variable-length records
//! stored across singly linked chains of slotted pages, on top of a paged
//! buffer cache.
//!
//! - [`storage`]: page I/O backends and the buffer pool (pin/unpin, dirty
//!   write-back, replacement).
//! - [`heap`]: heap files themselves: creation, handles, sequential scans
//!   with optional attribute filtering, and chain-extending insertion.

pub mod heap;
pub mod storage;
