//! Heap files: unordered collections of variable-length records stored on
//! singly linked chains of slotted pages.
//!
//! A heap file consists of a header page and a chain of data pages:
//!
//! ```text
//! +-------------+     +-----------+     +-----------+     +-----------+
//! | header page | --> | data page | --> | data page | --> | tail page |
//! | first/last  |     |           |     |           |     | next=none |
//! | counts      |     +-----------+     +-----------+     +-----------+
//! +-------------+
//! ```
//!
//! [`HeapFile`] is the open-file handle: it keeps the header page pinned and
//! tracks a single current data page. [`HeapFileScan`] walks the chain with
//! an optional [`Predicate`] filter; [`InsertFileScan`] appends at the tail,
//! extending the chain when it fills up.

mod error;
mod file;
mod header;
mod insert;
mod page;
mod scan;

pub use error::HeapError;
pub use file::{create_heap_file, destroy_heap_file, format_heap, HeapFile};
pub use header::{FileHeader, MAX_FILE_NAME};
pub use insert::InsertFileScan;
pub use page::{
    HeapPage, PageHeader, RecordId, SlotId, MAX_RECORD_SIZE, PAGE_HEADER_SIZE, SLOT_SIZE,
};
pub use scan::{AttrType, CompOp, HeapFileScan, Predicate};
