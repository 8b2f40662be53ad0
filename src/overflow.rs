//! Reassembles a payload that spilled across SQLite's forward-linked
//! overflow page chain (each overflow page begins with a 4-byte big-endian
//! pointer to the next one, or zero to mark the end of the chain), and
//! computes how much of a cell's payload SQLite keeps on the originating
//! page versus in that chain.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

use crate::{Error, PageNum};

/// How many bytes of a `payload_len`-byte payload SQLite stores on the
/// originating page before spilling the remainder into the overflow chain,
/// per the file format's fixed threshold formula (never inferred from
/// neighboring cell pointers). `page_size` is `U`; `is_table` selects the
/// table-tree vs index-tree value of `X`.
pub fn local_payload_size(page_size: usize, payload_len: usize, is_table: bool) -> usize {
    let u = page_size as i64;
    let p = payload_len as i64;
    let x = if is_table {
        u - 35
    } else {
        (64 * (u - 12)) / 255 - 23
    };
    if p <= x {
        return payload_len;
    }
    let m = (32 * (u - 12)) / 255 - 23;
    let k = m + (p - m).rem_euclid(u - 4);
    (if k <= x { k } else { m }) as usize
}

/// Accumulates payload bytes across a chain of overflow pages.
pub struct Assembly {
    buf: Vec<u8>,
    remaining: usize,
}

impl Assembly {
    /// `initial` is the portion of the payload already read off the
    /// originating cell. `total_len` is the full payload size the cell
    /// declared.
    pub fn new(initial: &[u8], total_len: usize) -> Assembly {
        let mut buf = Vec::with_capacity(total_len);
        buf.extend_from_slice(initial);
        Assembly {
            remaining: total_len - initial.len(),
            buf,
        }
    }

    /// Consumes one overflow page. Returns how many payload bytes it added
    /// (so the caller can charge them against a buffer budget) and either
    /// the next page to schedule, or `None` once the payload is complete.
    pub fn feed(
        &mut self,
        page_number: PageNum,
        page: &[u8],
    ) -> Result<(usize, Option<PageNum>), Error> {
        let mut c = Cursor::new(page);
        let next = c
            .read_u32::<BigEndian>()
            .map_err(|_| Error::UnreconciledPage(page_number))?;

        let usable = page.len() - 4;
        let take = usable.min(self.remaining);
        self.buf.extend_from_slice(&page[4..4 + take]);
        self.remaining -= take;

        if self.remaining == 0 {
            Ok((take, None))
        } else if next == 0 {
            Err(Error::UnreconciledPage(page_number))
        } else {
            Ok((take, Some(next)))
        }
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.buf
    }
}
