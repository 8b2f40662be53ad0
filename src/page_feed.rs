//! Reads the file header, then yields pages in physical file order, skipping
//! pointer-map pages and the lock-byte page (neither carries b-tree content).

use crate::chunk_reader::ChunkReader;
use crate::header::{FileHeader, HEADER_BYTES};
use crate::{Error, PageNum};

pub struct PageFeed<I> {
    reader: ChunkReader<I>,
    pub header: FileHeader,
    next_page: PageNum,
    pointer_map_interval: Option<u32>,
    lock_byte_page: PageNum,
    pending_first_page: Option<Vec<u8>>,
}

impl<I: Iterator<Item = Vec<u8>>> PageFeed<I> {
    /// Consumes the header and prepares to stream the remaining pages.
    pub fn open(chunks: I) -> Result<Self, Error> {
        let mut reader = ChunkReader::new(chunks);
        let header_bytes = reader.get(HEADER_BYTES)?;
        let mut header_buf = [0_u8; HEADER_BYTES];
        header_buf.copy_from_slice(&header_bytes);
        let header =
            FileHeader::parse(&header_buf).map_err(|e| Error::MalformedHeader(e.to_string()))?;

        if (header.page_size as usize) < HEADER_BYTES {
            return Err(Error::MalformedHeader(format!(
                "page size {} is smaller than the file header",
                header.page_size
            )));
        }
        let rest_of_page1 = reader.get(header.page_size as usize - HEADER_BYTES)?;
        let mut page1 = header_bytes;
        page1.extend_from_slice(&rest_of_page1);

        let pointer_map_interval = if header.incremental_vacuum {
            // ceil(page_size / 5) usable pointer-map entries per pointer-map page.
            Some((header.page_size + 4) / 5)
        } else {
            None
        };
        let lock_byte_page = ((1_u64 << 30) / header.page_size as u64) as u32 + 1;

        Ok(PageFeed {
            reader,
            header,
            next_page: 2,
            pointer_map_interval,
            lock_byte_page,
            pending_first_page: Some(page1),
        })
    }

    fn is_skippable(&self, page_number: PageNum) -> bool {
        if page_number == self.lock_byte_page {
            return true;
        }
        if let Some(interval) = self.pointer_map_interval {
            // Page 2 is always the first pointer-map page; they recur every `interval` pages.
            if page_number >= 2 && (page_number - 2) % interval == 0 {
                return true;
            }
        }
        false
    }

    /// Verifies no bytes remain after the last page declared by the header.
    pub fn finish(&mut self) -> Result<(), Error> {
        self.reader.drain()
    }
}

impl<I: Iterator<Item = Vec<u8>>> Iterator for PageFeed<I> {
    type Item = Result<(PageNum, Vec<u8>), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(page1) = self.pending_first_page.take() {
            return Some(Ok((1, page1)));
        }
        loop {
            if self.next_page > self.header.num_pages {
                return None;
            }
            let page_number = self.next_page;
            self.next_page += 1;
            let bytes = match self.reader.get(self.header.page_size as usize) {
                Ok(bytes) => bytes,
                Err(e) => return Some(Err(e)),
            };
            if self.is_skippable(page_number) {
                continue;
            }
            return Some(Ok((page_number, bytes)));
        }
    }
}
