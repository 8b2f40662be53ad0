//! Parsing of a single b-tree page's header and cell pointer array. Knows
//! nothing about page reconciliation, overflow, or cell contents beyond their
//! byte ranges within the page.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Seek, SeekFrom};

use crate::PageNum;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    IndexInterior,
    TableInterior,
    IndexLeaf,
    TableLeaf,
}

#[derive(Debug)]
pub struct BtreeHeader {
    pub kind: PageKind,
    pub type_byte: u8,
    pub num_cells: u16,
    pub rightmost_pointer: Option<PageNum>,
}

impl BtreeHeader {
    /// `base` is 100 on page 1 (past the file header), 0 otherwise.
    pub fn parse(page: &[u8], base: usize, page_number: PageNum) -> Result<BtreeHeader, crate::Error> {
        let mut c = Cursor::new(page);
        c.seek(SeekFrom::Start(base as u64)).unwrap();

        let type_byte = c.read_u8().unwrap();
        let kind = match type_byte {
            0x02 => PageKind::IndexInterior,
            0x05 => PageKind::TableInterior,
            0x0a => PageKind::IndexLeaf,
            0x0d => PageKind::TableLeaf,
            _ => return Err(crate::Error::InvalidPageType(page_number, type_byte)),
        };

        let freeblock_start = c.read_u16::<BigEndian>().unwrap();
        if freeblock_start != 0 {
            return Err(crate::Error::UnexpectedFreeblock(page_number));
        }

        let num_cells = c.read_u16::<BigEndian>().unwrap();
        let _cell_content_start = c.read_u16::<BigEndian>().unwrap();
        let _fragmented_free_bytes = c.read_u8().unwrap();

        let rightmost_pointer = match kind {
            PageKind::IndexInterior | PageKind::TableInterior => {
                Some(c.read_u32::<BigEndian>().unwrap())
            }
            PageKind::IndexLeaf | PageKind::TableLeaf => None,
        };

        Ok(BtreeHeader {
            kind,
            type_byte,
            num_cells,
            rightmost_pointer,
        })
    }

    /// Length in bytes of this page's b-tree header (not counting the 100-byte
    /// file header on page 1).
    pub fn header_len(&self) -> usize {
        match self.kind {
            PageKind::IndexInterior | PageKind::TableInterior => 12,
            PageKind::IndexLeaf | PageKind::TableLeaf => 8,
        }
    }
}

/// Returns the starting offset of each cell on the page, in cell pointer
/// array order (SQLite stores cells back-to-front from the end of the page,
/// but the pointer array itself is in key order for leaf/interior pages).
///
/// Deliberately does not derive a cell's length from the distance to the
/// next pointer in the array: that distance only matches physical layout for
/// pages whose cells happen to have been appended in ascending key order. A
/// valid, freeblock-free page built by out-of-order inserts has a
/// non-monotonic pointer array, so that subtraction can underflow or produce
/// a length that swallows a neighboring cell. Callers instead determine how
/// many bytes a cell occupies from its own declared payload size (see
/// `overflow::local_payload_size`), starting from the returned offset.
pub fn cell_starts(page: &[u8], base: usize, header: &BtreeHeader) -> Vec<usize> {
    let mut c = Cursor::new(page);
    c.seek(SeekFrom::Start((base + header.header_len()) as u64))
        .unwrap();

    (0..header.num_cells)
        .map(|_| c.read_u16::<BigEndian>().unwrap() as usize)
        .collect()
}
