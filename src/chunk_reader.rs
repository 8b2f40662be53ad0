//! Turns an arbitrary sequence of byte chunks (which need not align with
//! pages, records, or any other structure) into an exact-byte reader.

use crate::Error;

pub struct ChunkReader<I> {
    chunks: I,
    current: Vec<u8>,
    pos: usize,
}

impl<I: Iterator<Item = Vec<u8>>> ChunkReader<I> {
    pub fn new(chunks: I) -> Self {
        ChunkReader {
            chunks,
            current: Vec::new(),
            pos: 0,
        }
    }

    /// Advances to the next non-empty chunk if the current one is exhausted.
    /// Returns `false` once the underlying sequence has no more chunks.
    fn refill(&mut self) -> bool {
        while self.pos >= self.current.len() {
            match self.chunks.next() {
                Some(chunk) => {
                    self.current = chunk;
                    self.pos = 0;
                }
                None => return false,
            }
        }
        true
    }

    /// Reads exactly `n` bytes, re-chunking across input slice boundaries as
    /// needed. Fails with `Error::UnexpectedEndOfStream` if the sequence runs
    /// out first.
    pub fn get(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            if !self.refill() {
                return Err(Error::UnexpectedEndOfStream {
                    expected: n - out.len(),
                });
            }
            let available = self.current.len() - self.pos;
            let need = n - out.len();
            let take = available.min(need);
            out.extend_from_slice(&self.current[self.pos..self.pos + take]);
            self.pos += take;
        }
        Ok(out)
    }

    /// Verifies no further bytes remain anywhere in the chunk sequence.
    pub fn drain(&mut self) -> Result<(), Error> {
        if self.refill() {
            return Err(Error::ExtraBytes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_across_chunk_boundaries() {
        let chunks = vec![vec![1, 2], vec![3], vec![4, 5, 6]];
        let mut r = ChunkReader::new(chunks.into_iter());
        assert_eq!(r.get(3).unwrap(), vec![1, 2, 3]);
        assert_eq!(r.get(2).unwrap(), vec![4, 5]);
        assert_eq!(r.get(1).unwrap(), vec![6]);
        assert!(r.drain().is_ok());
    }

    #[test]
    fn reads_across_many_tiny_chunks() {
        let chunks: Vec<Vec<u8>> = (0_u8..10).map(|b| vec![b]).collect();
        let mut r = ChunkReader::new(chunks.into_iter());
        assert_eq!(r.get(10).unwrap(), (0_u8..10).collect::<Vec<u8>>());
    }

    #[test]
    fn errors_on_truncated_input() {
        let chunks = vec![vec![1, 2]];
        let mut r = ChunkReader::new(chunks.into_iter());
        match r.get(5) {
            Err(Error::UnexpectedEndOfStream { expected }) => assert_eq!(expected, 3),
            other => panic!("expected UnexpectedEndOfStream, got {:?}", other),
        }
    }

    #[test]
    fn drain_errors_if_bytes_remain() {
        let chunks = vec![vec![1, 2, 3]];
        let mut r = ChunkReader::new(chunks.into_iter());
        r.get(1).unwrap();
        assert!(matches!(r.drain(), Err(Error::ExtraBytes)));
    }

    #[test]
    fn skips_empty_chunks() {
        let chunks = vec![vec![], vec![1], vec![], vec![2]];
        let mut r = ChunkReader::new(chunks.into_iter());
        assert_eq!(r.get(2).unwrap(), vec![1, 2]);
    }
}
