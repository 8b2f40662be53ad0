//! Fixture builders for constructing minimal, valid SQLite byte sequences by
//! hand, since no `.db` binaries ship with this crate.

pub const PAGE_LEAF_TABLE: u8 = 0x0d;
pub const PAGE_INTERIOR_TABLE: u8 = 0x05;
pub const PAGE_LEAF_INDEX: u8 = 0x0a;

/// Encodes `value` as a SQLite varint (minimal big-endian base-128 groups,
/// continuation bit set on every byte but the last).
pub fn write_varint(value: i64) -> Vec<u8> {
    let mut v = value as u64;
    let mut groups = vec![(v & 0x7f) as u8];
    v >>= 7;
    while v > 0 {
        groups.push(((v & 0x7f) as u8) | 0x80);
        v >>= 7;
    }
    groups.reverse();
    groups
}

/// Builds a record's bytes from `(serial_type, value_bytes)` pairs, in the
/// header-then-body layout `record.rs` decodes.
pub fn record_bytes(values: &[(i64, Vec<u8>)]) -> Vec<u8> {
    let mut header = vec![];
    let mut body = vec![];
    for (serial_type, bytes) in values {
        header.extend(write_varint(*serial_type));
        body.extend_from_slice(bytes);
    }
    let header_len = write_varint(header.len() as i64 + 1);
    let mut out = header_len;
    out.extend(header);
    out.extend(body);
    out
}

/// A table-leaf cell whose payload fits entirely on the page: no overflow.
pub fn leaf_cell(row_id: i64, payload: &[u8]) -> Vec<u8> {
    let mut cell = write_varint(payload.len() as i64);
    cell.extend(write_varint(row_id));
    cell.extend_from_slice(payload);
    cell
}

/// Splits `payload` the way SQLite's overflow-threshold formula would for a
/// table b-tree cell on a `page_size`-byte page, returning `(on_page, spilled)`.
pub fn split_for_overflow(page_size: usize, payload: &[u8]) -> (&[u8], &[u8]) {
    let local_len = sqlite_stream::overflow::local_payload_size(page_size, payload.len(), true);
    payload.split_at(local_len)
}

/// A table-leaf cell whose full payload is `payload`, but only as much of it
/// as the overflow-threshold formula keeps on-page is stored here; the rest
/// must be written into an overflow chain starting at `overflow_page` (see
/// `split_for_overflow` to compute that remainder).
pub fn leaf_cell_with_overflow(
    row_id: i64,
    payload_len: usize,
    initial: &[u8],
    overflow_page: u32,
) -> Vec<u8> {
    let mut cell = write_varint(payload_len as i64);
    cell.extend(write_varint(row_id));
    cell.extend_from_slice(initial);
    cell.extend_from_slice(&overflow_page.to_be_bytes());
    cell
}

/// An index cell's payload framing: a varint length followed by the raw
/// payload bytes, with no separate rowid (unlike table cells).
pub fn index_payload_cell(payload: &[u8]) -> Vec<u8> {
    let mut cell = write_varint(payload.len() as i64);
    cell.extend_from_slice(payload);
    cell
}

/// A table-interior cell: a 4-byte child pointer followed by an integer key.
pub fn interior_cell(child_page: u32, key: i64) -> Vec<u8> {
    let mut cell = child_page.to_be_bytes().to_vec();
    cell.extend(write_varint(key));
    cell
}

/// Lays `cells` onto a fresh page of `page_size` bytes as a leaf page (table
/// or index, selected by `type_byte`), starting the b-tree header at `base`
/// (100 on page 1, 0 otherwise).
pub fn leaf_page(page_size: usize, base: usize, type_byte: u8, cells: &[Vec<u8>]) -> Vec<u8> {
    let mut page = vec![0_u8; page_size];
    page[base] = type_byte;
    page[base + 3..base + 5].copy_from_slice(&(cells.len() as u16).to_be_bytes());

    let mut cursor = page_size;
    let mut pointers = Vec::with_capacity(cells.len());
    for cell in cells {
        cursor -= cell.len();
        page[cursor..cursor + cell.len()].copy_from_slice(cell);
        pointers.push(cursor as u16);
    }
    page[base + 5..base + 7].copy_from_slice(&(cursor as u16).to_be_bytes());

    let array_start = base + 8;
    for (i, ptr) in pointers.iter().enumerate() {
        let off = array_start + i * 2;
        page[off..off + 2].copy_from_slice(&ptr.to_be_bytes());
    }
    page
}

/// Lays `cells` onto a fresh interior page, with `rightmost` as the page
/// header's rightmost-child pointer.
pub fn interior_page(
    page_size: usize,
    base: usize,
    type_byte: u8,
    cells: &[Vec<u8>],
    rightmost: u32,
) -> Vec<u8> {
    let mut page = vec![0_u8; page_size];
    page[base] = type_byte;
    page[base + 3..base + 5].copy_from_slice(&(cells.len() as u16).to_be_bytes());
    page[base + 8..base + 12].copy_from_slice(&rightmost.to_be_bytes());

    let mut cursor = page_size;
    let mut pointers = Vec::with_capacity(cells.len());
    for cell in cells {
        cursor -= cell.len();
        page[cursor..cursor + cell.len()].copy_from_slice(cell);
        pointers.push(cursor as u16);
    }
    page[base + 5..base + 7].copy_from_slice(&(cursor as u16).to_be_bytes());

    let array_start = base + 12;
    for (i, ptr) in pointers.iter().enumerate() {
        let off = array_start + i * 2;
        page[off..off + 2].copy_from_slice(&ptr.to_be_bytes());
    }
    page
}

/// An overflow page: a 4-byte big-endian forward pointer (0 to end the
/// chain) followed by payload bytes filling the rest of the page.
pub fn overflow_page(page_size: usize, next: u32, payload: &[u8]) -> Vec<u8> {
    let mut page = vec![0_u8; page_size];
    page[0..4].copy_from_slice(&next.to_be_bytes());
    page[4..4 + payload.len()].copy_from_slice(payload);
    page
}

/// Builds page 1's file header in place, leaving the rest of the page (the
/// `sqlite_schema` b-tree page) for the caller to fill in starting at byte
/// 100.
pub fn file_header_page(page_size: usize, num_pages: u32, first_freelist_trunk: u32) -> Vec<u8> {
    let mut page = vec![0_u8; page_size];
    page[0..16].copy_from_slice(b"SQLite format 3\0");
    page[16..18].copy_from_slice(&(page_size as u16).to_be_bytes());
    page[28..32].copy_from_slice(&num_pages.to_be_bytes());
    page[32..36].copy_from_slice(&first_freelist_trunk.to_be_bytes());
    page[56..60].copy_from_slice(&1_u32.to_be_bytes()); // UTF-8
    page
}

pub fn text_value(s: &str) -> (i64, Vec<u8>) {
    (13 + 2 * s.len() as i64, s.as_bytes().to_vec())
}

pub fn int_value(n: u8) -> (i64, Vec<u8>) {
    (1, vec![n])
}

pub fn null_value() -> (i64, Vec<u8>) {
    (0, vec![])
}

/// One `sqlite_schema` row declaring a table.
pub fn schema_table_row(name: &str, root_page: i64, sql: &str) -> Vec<u8> {
    record_bytes(&[
        (13 + 2 * 5, b"table".to_vec()),
        (13 + 2 * name.len() as i64, name.as_bytes().to_vec()),
        (13 + 2 * name.len() as i64, name.as_bytes().to_vec()),
        (1, vec![root_page as u8]),
        (13 + 2 * sql.len() as i64, sql.as_bytes().to_vec()),
    ])
}

/// One `sqlite_schema` row declaring an index.
pub fn schema_index_row(name: &str, tbl_name: &str, root_page: i64) -> Vec<u8> {
    record_bytes(&[
        (13 + 2 * 5, b"index".to_vec()),
        (13 + 2 * name.len() as i64, name.as_bytes().to_vec()),
        (
            13 + 2 * tbl_name.len() as i64,
            tbl_name.as_bytes().to_vec(),
        ),
        (1, vec![root_page as u8]),
        (0, vec![]),
    ])
}

/// A freelist trunk page: next-trunk pointer, leaf count, then the leaf
/// pointer array.
pub fn freelist_trunk_page(page_size: usize, next_trunk: u32, leaves: &[u32]) -> Vec<u8> {
    let mut page = vec![0_u8; page_size];
    page[0..4].copy_from_slice(&next_trunk.to_be_bytes());
    page[4..8].copy_from_slice(&(leaves.len() as u32).to_be_bytes());
    for (i, leaf) in leaves.iter().enumerate() {
        let off = 8 + i * 4;
        page[off..off + 4].copy_from_slice(&leaf.to_be_bytes());
    }
    page
}
