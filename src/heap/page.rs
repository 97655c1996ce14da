//! Slotted page layout for heap file records.
//!
//! Each data page stores variable-length records behind a slot directory:
//!
//! ```text
//! +--------+------------------+---------------->    <----------------+
//! | header | slot 0 | slot 1 |   free space       | rec 1 | rec 0    |
//! +--------+------------------+---------------->    <----------------+
//! 0        16                 free_start    free_end          PAGE_SIZE
//! ```
//!
//! The slot directory grows forward from the header; record bytes grow
//! backward from the end of the page. Deleting a record compacts the data
//! area and threads its slot onto a free list for reuse, so slot ids of
//! surviving records are stable.

use crate::heap::error::HeapError;
use crate::storage::{PageId, PAGE_SIZE};

/// Size of the page header in bytes.
pub const PAGE_HEADER_SIZE: usize = 16;

/// Size of one slot directory entry in bytes.
pub const SLOT_SIZE: usize = 4;

/// Largest record that fits in an otherwise empty page.
pub const MAX_RECORD_SIZE: usize = PAGE_SIZE - PAGE_HEADER_SIZE - SLOT_SIZE;

/// Index of a slot within a page.
pub type SlotId = u16;

/// Sentinel for "no slot" in the free-slot list.
const NO_SLOT: u16 = u16::MAX;

/// Sentinel offset marking a slot as free.
const FREE_OFFSET: u16 = u16::MAX;

/// Sentinel page number for "no next page" in the chain link.
const NO_PAGE: u64 = u64::MAX;

/// Identifies a record by its page and slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot_id: SlotId,
}

impl RecordId {
    pub fn new(page_id: PageId, slot_id: SlotId) -> Self {
        Self { page_id, slot_id }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.page_id, self.slot_id)
    }
}

/// Decoded page header.
///
/// Serialized little-endian at the front of every data page:
/// next page (8 bytes, `u64::MAX` = none), slot count (2), free-space start
/// (2), free-space end (2), free-slot list head (2, `u16::MAX` = none).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Next page in the file's chain.
    pub next_page: Option<PageId>,
    /// Number of slots in the directory, live or free.
    pub slot_count: u16,
    /// Offset where the slot directory ends.
    pub free_start: u16,
    /// Offset where record data begins.
    pub free_end: u16,
    /// Head of the free-slot list.
    pub first_free_slot: u16,
}

impl PageHeader {
    fn empty() -> Self {
        Self {
            next_page: None,
            slot_count: 0,
            free_start: PAGE_HEADER_SIZE as u16,
            free_end: PAGE_SIZE as u16,
            first_free_slot: NO_SLOT,
        }
    }

    fn decode(buf: &[u8]) -> Self {
        let next_raw = u64::from_le_bytes(buf[0..8].try_into().unwrap());
        Self {
            next_page: if next_raw == NO_PAGE {
                None
            } else {
                Some(PageId::new(next_raw))
            },
            slot_count: u16::from_le_bytes(buf[8..10].try_into().unwrap()),
            free_start: u16::from_le_bytes(buf[10..12].try_into().unwrap()),
            free_end: u16::from_le_bytes(buf[12..14].try_into().unwrap()),
            first_free_slot: u16::from_le_bytes(buf[14..16].try_into().unwrap()),
        }
    }

    fn encode(&self, buf: &mut [u8]) {
        let next_raw = self.next_page.map_or(NO_PAGE, |p| p.page_num());
        buf[0..8].copy_from_slice(&next_raw.to_le_bytes());
        buf[8..10].copy_from_slice(&self.slot_count.to_le_bytes());
        buf[10..12].copy_from_slice(&self.free_start.to_le_bytes());
        buf[12..14].copy_from_slice(&self.free_end.to_le_bytes());
        buf[14..16].copy_from_slice(&self.first_free_slot.to_le_bytes());
    }
}

/// One slot directory entry.
///
/// A live slot stores the record's offset and length. A free slot stores
/// `FREE_OFFSET` and the index of the next free slot in `length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SlotEntry {
    offset: u16,
    length: u16,
}

impl SlotEntry {
    fn record(offset: u16, length: u16) -> Self {
        Self { offset, length }
    }

    fn free(next: u16) -> Self {
        Self {
            offset: FREE_OFFSET,
            length: next,
        }
    }

    fn is_free(&self) -> bool {
        self.offset == FREE_OFFSET
    }

    fn next_free(&self) -> u16 {
        self.length
    }

    fn read_from(buf: &[u8]) -> Self {
        Self {
            offset: u16::from_le_bytes(buf[0..2].try_into().unwrap()),
            length: u16::from_le_bytes(buf[2..4].try_into().unwrap()),
        }
    }

    fn write_to(&self, buf: &mut [u8]) {
        buf[0..2].copy_from_slice(&self.offset.to_le_bytes());
        buf[2..4].copy_from_slice(&self.length.to_le_bytes());
    }
}

/// View of a data page's bytes as a slotted page.
///
/// Generic over the byte container so it works against both owned buffers
/// and slices borrowed from a pinned buffer frame.
pub struct HeapPage<T> {
    data: T,
}

impl<T: AsRef<[u8]>> HeapPage<T> {
    /// Wraps a page buffer.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is not exactly `PAGE_SIZE` bytes.
    pub fn new(data: T) -> Self {
        assert_eq!(data.as_ref().len(), PAGE_SIZE, "page buffer size mismatch");
        Self { data }
    }

    pub fn header(&self) -> PageHeader {
        PageHeader::decode(self.data.as_ref())
    }

    /// Returns the next page in the chain, if any.
    pub fn next_page(&self) -> Option<PageId> {
        self.header().next_page
    }

    fn slot(&self, slot_id: SlotId) -> Option<SlotEntry> {
        let header = self.header();
        if slot_id >= header.slot_count {
            return None;
        }
        let pos = PAGE_HEADER_SIZE + slot_id as usize * SLOT_SIZE;
        Some(SlotEntry::read_from(&self.data.as_ref()[pos..pos + SLOT_SIZE]))
    }

    /// Returns the record in `slot_id`, or `None` if the slot is absent or
    /// free.
    pub fn read(&self, slot_id: SlotId) -> Option<&[u8]> {
        let slot = self.slot(slot_id)?;
        if slot.is_free() {
            return None;
        }
        let start = slot.offset as usize;
        Some(&self.data.as_ref()[start..start + slot.length as usize])
    }

    /// Free bytes between the slot directory and the record area.
    pub fn free_space(&self) -> usize {
        let header = self.header();
        (header.free_end - header.free_start) as usize
    }

    /// Whether a record of `len` bytes fits in this page.
    pub fn can_insert(&self, len: usize) -> bool {
        len + self.slot_overhead() <= self.free_space()
    }

    /// Bytes of slot directory growth the next insert needs.
    fn slot_overhead(&self) -> usize {
        if self.header().first_free_slot == NO_SLOT {
            SLOT_SIZE
        } else {
            0
        }
    }

    /// Number of live records in the page.
    pub fn record_count(&self) -> usize {
        let header = self.header();
        (0..header.slot_count)
            .filter(|&id| self.slot(id).is_some_and(|s| !s.is_free()))
            .count()
    }

    /// First live slot in the page.
    pub fn first_slot(&self) -> Option<SlotId> {
        let header = self.header();
        (0..header.slot_count).find(|&id| self.slot(id).is_some_and(|s| !s.is_free()))
    }

    /// First live slot after `slot_id`.
    pub fn next_slot(&self, slot_id: SlotId) -> Option<SlotId> {
        let header = self.header();
        (slot_id + 1..header.slot_count).find(|&id| self.slot(id).is_some_and(|s| !s.is_free()))
    }

    /// Iterates over live records in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &[u8])> + '_ {
        let header = self.header();
        (0..header.slot_count).filter_map(move |id| self.read(id).map(|rec| (id, rec)))
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> HeapPage<T> {
    /// Formats the buffer as an empty page.
    pub fn init(&mut self) {
        self.data.as_mut()[..PAGE_HEADER_SIZE].fill(0);
        self.set_header(PageHeader::empty());
    }

    fn set_header(&mut self, header: PageHeader) {
        header.encode(self.data.as_mut());
    }

    fn set_slot(&mut self, slot_id: SlotId, slot: SlotEntry) {
        let pos = PAGE_HEADER_SIZE + slot_id as usize * SLOT_SIZE;
        slot.write_to(&mut self.data.as_mut()[pos..pos + SLOT_SIZE]);
    }

    /// Sets the next page link in the chain.
    pub fn set_next_page(&mut self, next_page: Option<PageId>) {
        let mut header = self.header();
        header.next_page = next_page;
        self.set_header(header);
    }

    /// Inserts a record, reusing a free slot when one is available.
    pub fn insert(&mut self, record: &[u8]) -> Result<SlotId, HeapError> {
        let required = record.len() + self.slot_overhead();
        let available = self.free_space();
        if required > available {
            return Err(HeapError::PageFull {
                required,
                available,
            });
        }

        let mut header = self.header();

        let slot_id = if header.first_free_slot != NO_SLOT {
            let slot_id = header.first_free_slot;
            // `slot` returns Some for every id below slot_count.
            let entry = self.slot(slot_id).ok_or_else(|| {
                HeapError::Corrupted(format!("free-slot list points past directory: {}", slot_id))
            })?;
            header.first_free_slot = entry.next_free();
            slot_id
        } else {
            let slot_id = header.slot_count;
            header.slot_count += 1;
            header.free_start += SLOT_SIZE as u16;
            slot_id
        };

        header.free_end -= record.len() as u16;
        let offset = header.free_end;
        self.data.as_mut()[offset as usize..offset as usize + record.len()]
            .copy_from_slice(record);

        self.set_header(header);
        self.set_slot(slot_id, SlotEntry::record(offset, record.len() as u16));

        Ok(slot_id)
    }

    /// Deletes the record in `slot_id`, compacting the data area.
    pub fn delete(&mut self, slot_id: SlotId) -> Result<(), HeapError> {
        let slot = match self.slot(slot_id) {
            Some(s) if !s.is_free() => s,
            _ => return Err(HeapError::SlotNotFound(slot_id)),
        };

        let mut header = self.header();
        let off = slot.offset as usize;
        let len = slot.length as usize;
        let free_end = header.free_end as usize;

        // Shift records stored below the deleted one up over its bytes.
        self.data.as_mut().copy_within(free_end..off, free_end + len);

        // Fix up offsets of the records that moved.
        for id in 0..header.slot_count {
            if id == slot_id {
                continue;
            }
            if let Some(other) = self.slot(id) {
                if !other.is_free() && other.offset < slot.offset {
                    self.set_slot(
                        id,
                        SlotEntry::record(other.offset + len as u16, other.length),
                    );
                }
            }
        }

        self.set_slot(slot_id, SlotEntry::free(header.first_free_slot));
        header.first_free_slot = slot_id;
        header.free_end += len as u16;
        self.set_header(header);

        Ok(())
    }
}
