//! Serial types are how SQLite records describe each column's on-disk shape.
//! See <https://www.sqlite.org/fileformat.html#record_format>.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Read;

use crate::sql_value::SqlValue;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("error reading value bytes: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid serial type code {0}")]
    InvalidSerialTypeCode(i64),
    #[error("value bytes were not valid UTF-8: {0}")]
    InvalidStringEncoding(#[from] std::string::FromUtf8Error),
}

/// The number of payload bytes a column of this serial type occupies.
///
/// # Panics
///
/// Does not panic.
pub fn value_len(serial_type: i64) -> usize {
    match serial_type {
        0 | 8 | 9 => 0,
        1 => 1,
        2 => 2,
        3 => 3,
        4 => 4,
        5 => 6,
        6 | 7 => 8,
        x if x >= 12 => ((x - 12 - (x % 2)) / 2) as usize,
        _ => 0,
    }
}

/// Decodes the bytes of a single column value per the serial type table.
///
/// # Arguments
/// * `serial_type` - the serial type code from the record header.
/// * `data` - exactly `value_len(serial_type)` bytes of column data.
///
/// # Panics
///
/// Does not panic.
pub fn value_for(serial_type: i64, data: &[u8]) -> Result<SqlValue, Error> {
    use SqlValue::*;

    let mut c = std::io::Cursor::new(data);
    match serial_type {
        0 => Ok(Null()),
        1 => Ok(Int(c.read_i8()? as i64)),
        2 => Ok(Int(c.read_i16::<BigEndian>()? as i64)),
        3 => {
            let mut bytes = [0_u8; 4];
            c.read_exact(&mut bytes[1..])?;
            bytes[0] = if bytes[1] & 0x80 != 0 { 0xff } else { 0 };
            Ok(Int(i32::from_be_bytes(bytes) as i64))
        }
        4 => Ok(Int(c.read_i32::<BigEndian>()? as i64)),
        5 => {
            let mut bytes = [0_u8; 8];
            c.read_exact(&mut bytes[2..])?;
            let sign = if bytes[2] & 0x80 != 0 { 0xff } else { 0 };
            bytes[0] = sign;
            bytes[1] = sign;
            Ok(Int(i64::from_be_bytes(bytes)))
        }
        6 => Ok(Int(c.read_i64::<BigEndian>()?)),
        7 => Ok(Real(c.read_f64::<BigEndian>()?)),
        8 => Ok(Int(0)),
        9 => Ok(Int(1)),
        10 | 11 => Err(Error::InvalidSerialTypeCode(serial_type)),
        x if x >= 12 && x % 2 == 0 => {
            // even: BLOB of (x-12)/2 bytes.
            let mut buf = vec![0_u8; ((x - 12) / 2) as usize];
            c.read_exact(&mut buf)?;
            Ok(Blob(buf))
        }
        x if x >= 13 => {
            // odd: text of (x-13)/2 bytes, in the database's text encoding.
            let mut buf = vec![0_u8; ((x - 13) / 2) as usize];
            c.read_exact(&mut buf)?;
            Ok(Text(String::from_utf8(buf)?))
        }
        _ => Err(Error::InvalidSerialTypeCode(serial_type)),
    }
}
