//! Heap file header.

use crate::heap::error::HeapError;
use crate::storage::PageId;

/// Maximum length of a heap file name, in bytes.
pub const MAX_FILE_NAME: usize = 64;

/// Magic value at the start of every header page.
const HEADER_MAGIC: u32 = 0x4845_4150; // "HEAP"

/// Metadata for one heap file, stored on its header page.
///
/// Serialized little-endian: magic (4 bytes), name length (2), reserved (2),
/// name bytes (64), first page (8), last page (8), page count (4), record
/// count (4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// File name, truncated to `MAX_FILE_NAME` bytes.
    pub file_name: String,
    /// First data page in the chain.
    pub first_page: PageId,
    /// Last data page in the chain.
    pub last_page: PageId,
    /// Number of data pages in the chain.
    pub page_count: u32,
    /// Number of live records across all data pages.
    pub record_count: u32,
}

impl FileHeader {
    /// Creates a header for a file with a single data page.
    pub fn new(file_name: &str, data_page: PageId) -> Self {
        let mut name = file_name.to_string();
        if name.len() > MAX_FILE_NAME {
            // Truncate on a char boundary.
            let mut end = MAX_FILE_NAME;
            while !name.is_char_boundary(end) {
                end -= 1;
            }
            name.truncate(end);
        }
        Self {
            file_name: name,
            first_page: data_page,
            last_page: data_page,
            page_count: 1,
            record_count: 0,
        }
    }

    pub fn encode(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&HEADER_MAGIC.to_le_bytes());
        let name = self.file_name.as_bytes();
        buf[4..6].copy_from_slice(&(name.len() as u16).to_le_bytes());
        buf[6..8].copy_from_slice(&0u16.to_le_bytes());
        buf[8..8 + MAX_FILE_NAME].fill(0);
        buf[8..8 + name.len()].copy_from_slice(name);
        buf[72..80].copy_from_slice(&self.first_page.page_num().to_le_bytes());
        buf[80..88].copy_from_slice(&self.last_page.page_num().to_le_bytes());
        buf[88..92].copy_from_slice(&self.page_count.to_le_bytes());
        buf[92..96].copy_from_slice(&self.record_count.to_le_bytes());
    }

    pub fn decode(buf: &[u8]) -> Result<Self, HeapError> {
        let magic = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        if magic != HEADER_MAGIC {
            return Err(HeapError::Corrupted(format!(
                "bad header magic: {:#010x}",
                magic
            )));
        }

        let name_len = u16::from_le_bytes(buf[4..6].try_into().unwrap()) as usize;
        if name_len > MAX_FILE_NAME {
            return Err(HeapError::Corrupted(format!(
                "header name length {} exceeds maximum {}",
                name_len, MAX_FILE_NAME
            )));
        }
        let file_name = std::str::from_utf8(&buf[8..8 + name_len])
            .map_err(|_| HeapError::Corrupted("header name is not valid UTF-8".into()))?
            .to_string();

        Ok(Self {
            file_name,
            first_page: PageId::new(u64::from_le_bytes(buf[72..80].try_into().unwrap())),
            last_page: PageId::new(u64::from_le_bytes(buf[80..88].try_into().unwrap())),
            page_count: u32::from_le_bytes(buf[88..92].try_into().unwrap()),
            record_count: u32::from_le_bytes(buf[92..96].try_into().unwrap()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PAGE_SIZE;

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut header = FileHeader::new("employees", PageId::new(1));
        header.last_page = PageId::new(5);
        header.page_count = 4;
        header.record_count = 123;

        let mut buf = vec![0u8; PAGE_SIZE];
        header.encode(&mut buf);
        let decoded = FileHeader::decode(&buf).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_bad_magic() {
        let buf = vec![0u8; PAGE_SIZE];
        assert!(matches!(
            FileHeader::decode(&buf),
            Err(HeapError::Corrupted(_))
        ));
    }

    #[test]
    fn test_name_truncation() {
        let long = "x".repeat(200);
        let header = FileHeader::new(&long, PageId::new(1));
        assert_eq!(header.file_name.len(), MAX_FILE_NAME);

        let mut buf = vec![0u8; PAGE_SIZE];
        header.encode(&mut buf);
        let decoded = FileHeader::decode(&buf).unwrap();
        assert_eq!(decoded.file_name, header.file_name);
    }
}
