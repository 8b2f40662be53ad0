//! Decoding the SQLite record format: a varint header of serial types
//! followed by the column values it describes.

use crate::serial_type::{self, Error};
use crate::sql_value::SqlValue;
use crate::varint;

/// Iterates over `(serial_type, raw_value_bytes)` pairs in a record payload.
pub struct ValueIterator<'a> {
    payload: &'a [u8],
    header_offset: usize,
    header_len: usize,
    value_offset: usize,
}

impl<'a> ValueIterator<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        let (header_len, header_len_size) = varint::read_varint(payload);
        ValueIterator {
            payload,
            header_offset: header_len_size,
            header_len: header_len as usize,
            value_offset: header_len as usize,
        }
    }
}

impl<'a> Iterator for ValueIterator<'a> {
    type Item = (i64, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.header_offset >= self.header_len {
            return None;
        }
        let (serial_type, consumed) = varint::read_varint(&self.payload[self.header_offset..]);
        self.header_offset += consumed;
        let len = serial_type::value_len(serial_type);
        let start = self.value_offset;
        self.value_offset += len;
        Some((serial_type, &self.payload[start..self.value_offset]))
    }
}

/// Decodes a full record payload into a row of values.
///
/// If `rowid_alias_index` names the table's INTEGER PRIMARY KEY column, the
/// stored (and typically NULL) value at that position is replaced with
/// `rowid`, per SQLite's rowid-alias rule.
pub fn decode_row(
    payload: &[u8],
    rowid: i64,
    rowid_alias_index: Option<usize>,
) -> Result<Vec<SqlValue>, Error> {
    let mut row = Vec::new();
    for (i, (serial_type, raw)) in ValueIterator::new(payload).enumerate() {
        if Some(i) == rowid_alias_index {
            row.push(SqlValue::Int(rowid));
        } else {
            row.push(serial_type::value_for(serial_type, raw)?);
        }
    }
    Ok(row)
}
