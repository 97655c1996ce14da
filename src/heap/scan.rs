//! Sequential scan over a heap file's page chain.

use std::cmp::Ordering;

use crate::heap::error::HeapError;
use crate::heap::file::HeapFile;
use crate::heap::page::{HeapPage, RecordId, SlotId};
use crate::storage::{PageId, Replacer, Storage};

/// Interpretation of the filtered attribute bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    /// Raw bytes, compared lexically.
    String,
    /// Native-endian 4-byte signed integer.
    Integer,
    /// Native-endian 4-byte float.
    Float,
}

/// Comparison operator applied to the attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Lt,
    Lte,
    Eq,
    Gte,
    Gt,
    Ne,
}

impl CompOp {
    fn eval(self, ord: Ordering) -> bool {
        match self {
            CompOp::Lt => ord == Ordering::Less,
            CompOp::Lte => ord != Ordering::Greater,
            CompOp::Eq => ord == Ordering::Equal,
            CompOp::Gte => ord != Ordering::Less,
            CompOp::Gt => ord == Ordering::Greater,
            CompOp::Ne => ord != Ordering::Equal,
        }
    }
}

/// A single-attribute filter: compares `length` bytes at `offset` of each
/// record against a stored value.
#[derive(Debug, Clone)]
pub struct Predicate {
    offset: usize,
    length: usize,
    ty: AttrType,
    op: CompOp,
    value: Vec<u8>,
}

impl Predicate {
    /// Builds a validated filter.
    ///
    /// Integer and float attributes must be exactly 4 bytes, and `value`
    /// must match `length`.
    pub fn new(
        offset: usize,
        length: usize,
        ty: AttrType,
        op: CompOp,
        value: Vec<u8>,
    ) -> Result<Self, HeapError> {
        if length == 0 {
            return Err(HeapError::BadScanParam("filter length must be at least 1"));
        }
        if matches!(ty, AttrType::Integer | AttrType::Float) && length != 4 {
            return Err(HeapError::BadScanParam(
                "integer and float filters must be 4 bytes",
            ));
        }
        if value.len() != length {
            return Err(HeapError::BadScanParam(
                "filter value does not match filter length",
            ));
        }
        Ok(Self {
            offset,
            length,
            ty,
            op,
            value,
        })
    }

    /// Integer-attribute filter at `offset`.
    pub fn integer(offset: usize, op: CompOp, value: i32) -> Self {
        Self {
            offset,
            length: 4,
            ty: AttrType::Integer,
            op,
            value: value.to_ne_bytes().to_vec(),
        }
    }

    /// Float-attribute filter at `offset`.
    pub fn float(offset: usize, op: CompOp, value: f32) -> Self {
        Self {
            offset,
            length: 4,
            ty: AttrType::Float,
            op,
            value: value.to_ne_bytes().to_vec(),
        }
    }

    /// Whether a record satisfies this filter.
    ///
    /// Records too short to contain the attribute simply do not match.
    pub fn matches(&self, record: &[u8]) -> bool {
        let end = match self.offset.checked_add(self.length) {
            Some(end) if end <= record.len() => end,
            _ => return false,
        };
        let attr = &record[self.offset..end];

        match self.ty {
            AttrType::Integer => {
                let a = i32::from_ne_bytes(attr.try_into().unwrap());
                let b = i32::from_ne_bytes(self.value[..].try_into().unwrap());
                self.op.eval(a.cmp(&b))
            }
            AttrType::Float => {
                let a = f32::from_ne_bytes(attr.try_into().unwrap());
                let b = f32::from_ne_bytes(self.value[..].try_into().unwrap());
                // Compared directly so NaN never matches an ordering test.
                match self.op {
                    CompOp::Lt => a < b,
                    CompOp::Lte => a <= b,
                    CompOp::Eq => a == b,
                    CompOp::Gte => a >= b,
                    CompOp::Gt => a > b,
                    CompOp::Ne => a != b,
                }
            }
            AttrType::String => self.op.eval(attr.cmp(&self.value[..])),
        }
    }
}

/// A sequential scan cursor over a heap file.
///
/// The cursor walks the page chain in order, visiting live slots in slot
/// order within each page. Deleting at the cursor does not advance it, so
/// the next [`scan_next`](Self::scan_next) continues against the page's
/// remaining slots.
pub struct HeapFileScan<S: Storage, R: Replacer> {
    file: HeapFile<S, R>,
    predicate: Option<Predicate>,
    mark: Option<(PageId, Option<RecordId>)>,
}

enum Step {
    Matched(SlotId),
    EndOfPage(Option<PageId>),
}

impl<S: Storage, R: Replacer> HeapFileScan<S, R> {
    pub fn new(file: HeapFile<S, R>) -> Self {
        Self {
            file,
            predicate: None,
            mark: None,
        }
    }

    /// Sets the filter for subsequent [`scan_next`](Self::scan_next) calls.
    ///
    /// `None` clears the filter; every record matches.
    pub fn start_scan(&mut self, predicate: Option<Predicate>) {
        self.predicate = predicate;
    }

    /// Advances to the next matching record and returns its id.
    ///
    /// Pages with no matching records are skipped by following the chain.
    /// Returns [`HeapError::EndOfFile`] once the chain is exhausted.
    pub fn scan_next(&mut self) -> Result<RecordId, HeapError> {
        loop {
            let (page_id, step) = {
                let cur = self.file.cur.as_ref().ok_or(HeapError::NoCurrentPage)?;
                let page_id = cur.page_id();
                let prev_slot = match self.file.cur_rec {
                    Some(rid) if rid.page_id == page_id => Some(rid.slot_id),
                    _ => None,
                };
                let predicate = self.predicate.as_ref();

                let step = cur.read(|buf| {
                    let page = HeapPage::new(buf);
                    let mut slot = match prev_slot {
                        Some(s) => page.next_slot(s),
                        None => page.first_slot(),
                    };
                    while let Some(s) = slot {
                        if let Some(rec) = page.read(s) {
                            if predicate.map_or(true, |p| p.matches(rec)) {
                                return Step::Matched(s);
                            }
                        }
                        slot = page.next_slot(s);
                    }
                    Step::EndOfPage(page.next_page())
                });
                (page_id, step)
            };

            match step {
                Step::Matched(slot_id) => {
                    let rid = RecordId::new(page_id, slot_id);
                    self.file.cur_rec = Some(rid);
                    return Ok(rid);
                }
                Step::EndOfPage(next) => {
                    if page_id == self.file.header.last_page {
                        return Err(HeapError::EndOfFile);
                    }
                    let next = next.ok_or(HeapError::ChainBroken(page_id))?;
                    // Release before pinning the successor.
                    self.file.cur = None;
                    self.file.cur = Some(self.file.pool.pin_page(next)?);
                    self.file.cur_rec = None;
                }
            }
        }
    }

    /// Returns the record at the cursor position.
    pub fn get_record(&self) -> Result<Vec<u8>, HeapError> {
        let rid = self.file.cur_rec.ok_or(HeapError::NoCurrentRecord)?;
        let cur = self.file.cur.as_ref().ok_or(HeapError::NoCurrentPage)?;
        cur.read(|buf| {
            HeapPage::new(buf)
                .read(rid.slot_id)
                .map(|rec| rec.to_vec())
                .ok_or(HeapError::SlotNotFound(rid.slot_id))
        })
    }

    /// Deletes the record at the cursor position.
    ///
    /// The cursor is not advanced; the next [`scan_next`](Self::scan_next)
    /// continues from the deleted position.
    pub fn delete_record(&mut self) -> Result<(), HeapError> {
        let rid = self.file.cur_rec.ok_or(HeapError::NoCurrentRecord)?;
        {
            let cur = self.file.cur.as_ref().ok_or(HeapError::NoCurrentPage)?;
            cur.write(|buf| HeapPage::new(buf).delete(rid.slot_id))?;
        }
        self.file
            .update_header(|h| h.record_count = h.record_count.saturating_sub(1));
        Ok(())
    }

    /// Marks the current page dirty without going through a write.
    ///
    /// For callers that mutate a fetched record in place.
    pub fn mark_dirty(&self) -> Result<(), HeapError> {
        let cur = self.file.cur.as_ref().ok_or(HeapError::NoCurrentPage)?;
        cur.mark_dirty();
        Ok(())
    }

    /// Snapshots the cursor position for a later
    /// [`reset_scan`](Self::reset_scan).
    pub fn mark_scan(&mut self) -> Result<(), HeapError> {
        let page_id = self.file.cur_page_id().ok_or(HeapError::NoCurrentPage)?;
        self.mark = Some((page_id, self.file.cur_rec));
        Ok(())
    }

    /// Restores the cursor to the marked position.
    ///
    /// Repins the marked page only when it differs from the current one.
    pub fn reset_scan(&mut self) -> Result<(), HeapError> {
        let (page_id, rid) = self.mark.ok_or(HeapError::ScanNotMarked)?;
        if self.file.cur_page_id() != Some(page_id) {
            self.file.cur = None;
            self.file.cur = Some(self.file.pool.pin_page(page_id)?);
        }
        self.file.cur_rec = rid;
        Ok(())
    }

    /// Releases the current page and clears the cursor. Idempotent.
    pub fn end_scan(&mut self) {
        self.file.cur = None;
        self.file.cur_rec = None;
        self.predicate = None;
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
