//! SQLite's variable-length integer encoding: big-endian, 7 bits per byte for
//! up to eight bytes, with a ninth byte contributing all 8 bits if needed.

/// Reads one varint from the start of `buf`, returning the decoded value and
/// the number of bytes it occupied (between 1 and 9).
///
/// Panics if `buf` is shorter than the varint it encodes; callers only call
/// this on byte ranges already known to hold a complete record or cell.
pub fn read_varint(buf: &[u8]) -> (i64, usize) {
    let mut result: u64 = 0;
    for (i, &byte) in buf.iter().enumerate().take(8) {
        result = (result << 7) | (byte & 0x7f) as u64;
        if byte & 0x80 == 0 {
            return (result as i64, i + 1);
        }
    }
    result = (result << 8) | buf[8] as u64;
    (result as i64, 9)
}
