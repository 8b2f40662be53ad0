//! Parsing of the 100-byte SQLite file header that begins page 1.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::PageNum;

/// Length, in bytes, of the file header at the start of page 1.
pub const HEADER_BYTES: usize = 100;

const MAGIC: &[u8; 16] = b"SQLite format 3\0";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("file does not begin with the SQLite magic string")]
    WrongMagic,
    #[error("unsupported page size {0}")]
    UnsupportedPageSize(u32),
    #[error("reserved space per page must be zero, found {0}")]
    ReservedSpaceNonZero(u8),
    #[error("unsupported text encoding {0}")]
    UnsupportedEncoding(u32),
}

/// The subset of the 100-byte file header this decoder needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub page_size: u32,
    pub num_pages: u32,
    pub first_freelist_trunk: PageNum,
    pub incremental_vacuum: bool,
    pub text_encoding: u32,
}

impl FileHeader {
    /// Parses the file header out of the first 100 bytes of the file.
    pub fn parse(bytes: &[u8; HEADER_BYTES]) -> Result<FileHeader, Error> {
        let mut c = Cursor::new(&bytes[..]);

        let mut magic = [0_u8; 16];
        c.read_exact(&mut magic).map_err(|_| Error::WrongMagic)?;
        if &magic != MAGIC {
            return Err(Error::WrongMagic);
        }

        let page_size_field = c.read_u16::<BigEndian>().unwrap();
        let page_size = match page_size_field {
            1 => 65536,
            512 | 1024 | 2048 | 4096 | 8192 | 16384 | 32768 => page_size_field as u32,
            other => return Err(Error::UnsupportedPageSize(other as u32)),
        };

        c.set_position(20);
        let reserved_space = c.read_u8().unwrap();
        if reserved_space != 0 {
            return Err(Error::ReservedSpaceNonZero(reserved_space));
        }

        c.set_position(28);
        let num_pages = c.read_u32::<BigEndian>().unwrap();

        c.set_position(32);
        let first_freelist_trunk = c.read_u32::<BigEndian>().unwrap();

        c.set_position(52);
        let incremental_vacuum = c.read_u32::<BigEndian>().unwrap() != 0;

        c.set_position(56);
        let text_encoding = c.read_u32::<BigEndian>().unwrap();
        if text_encoding != 1 && text_encoding != 0 {
            return Err(Error::UnsupportedEncoding(text_encoding));
        }

        Ok(FileHeader {
            page_size,
            num_pages,
            first_freelist_trunk,
            incremental_vacuum,
            text_encoding,
        })
    }
}
