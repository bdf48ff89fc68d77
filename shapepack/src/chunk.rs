//! Byte chunk, the unit of allocation for the segmented buffer used by both
//! the streaming reader and the buffered writer (spec §4.B).

/// Default chunk size. Chosen to comfortably hold a handful of typical
/// MessagePack object payloads without forcing a second chunk for the
/// common case.
pub(crate) const CHUNK_SIZE: usize = 8192;

/// A linear byte region with a start cursor (consumed-to position) and an
/// end cursor (written-to position). Reading advances `start`; writing
/// advances `end`. When both coincide the chunk is logically empty and its
/// cursors reset to zero so it can be reused without reallocating.
///
/// Chunks are normally `CHUNK_SIZE` bytes, but `with_capacity` allows a
/// single oversized chunk when a bulk write needs more contiguous space
/// than the default affords (`get_span` falls back to this).
pub struct Chunk {
    data: Box<[u8]>,
    start: usize,
    end: usize,
}

impl Chunk {
    #[inline]
    pub fn new() -> Chunk {
        Chunk::with_capacity(CHUNK_SIZE)
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Chunk {
        Chunk {
            data: vec![0u8; capacity].into_boxed_slice(),
            start: 0,
            end: 0,
        }
    }

    #[inline]
    pub fn total_capacity(&self) -> usize {
        self.data.len()
    }

    /// Free capacity remaining for writes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len() - self.end
    }

    /// Bytes available for reads.
    #[inline]
    pub fn remaining_data(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The readable part of the chunk.
    #[inline]
    pub fn readable_slice(&self) -> &[u8] {
        &self.data[self.start..self.end]
    }

    /// The writable (unused) part of the chunk.
    #[inline]
    pub fn writeable_slice(&mut self) -> &mut [u8] {
        &mut self.data[self.end..]
    }

    /// Append bytes at the end cursor. Callers check `capacity()` first.
    #[inline]
    pub fn write(&mut self, slice: &[u8]) {
        let end = self.end + slice.len();
        self.data[self.end..end].copy_from_slice(slice);
        self.end = end;
    }

    /// Mark `count` bytes, already written directly into `writeable_slice`,
    /// as committed. Pairs with `get_span`/`advance` at the buffer layer.
    #[inline]
    pub fn expand(&mut self, count: usize) {
        let new_end = self.end + count;
        assert!(new_end <= self.data.len(), "attempted to expand beyond chunk size");
        self.end = new_end;
    }

    /// Consume and return `count` bytes from the start cursor.
    #[inline]
    pub fn read(&mut self, count: usize) -> &[u8] {
        let orig_start = self.start;
        self.advance(count);
        &self.data[orig_start..orig_start + count]
    }

    /// Advance the start cursor by `count`, as if a read had happened.
    #[inline]
    pub fn advance(&mut self, count: usize) {
        assert!(self.start + count <= self.end, "attempted to advance past chunk edge");
        self.start += count;
        self.reset_if_drained();
    }

    #[inline]
    fn reset_if_drained(&mut self) {
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Chunk::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chunk_is_empty() {
        let chunk = Chunk::new();
        assert_eq!(chunk.capacity(), CHUNK_SIZE);
        assert_eq!(chunk.remaining_data(), 0);
        assert!(chunk.is_empty());
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut chunk = Chunk::new();
        chunk.write(&[1, 2, 3, 4]);
        assert_eq!(chunk.remaining_data(), 4);
        assert_eq!(chunk.read(2), &[1, 2]);
        assert_eq!(chunk.read(2), &[3, 4]);
        assert!(chunk.is_empty());
    }

    #[test]
    #[should_panic(expected = "attempted to advance past chunk edge")]
    fn read_past_end_panics() {
        let mut chunk = Chunk::new();
        chunk.write(&[1, 2]);
        chunk.read(3);
    }

    #[test]
    fn expand_tracks_directly_written_bytes() {
        let mut chunk = Chunk::new();
        chunk.writeable_slice()[..3].copy_from_slice(&[9, 9, 9]);
        chunk.expand(3);
        assert_eq!(chunk.readable_slice(), &[9, 9, 9]);
    }

    #[test]
    fn oversized_chunk_holds_more_than_default() {
        let mut chunk = Chunk::with_capacity(CHUNK_SIZE * 2);
        assert_eq!(chunk.capacity(), CHUNK_SIZE * 2);
        chunk.write(&vec![7u8; CHUNK_SIZE + 10]);
        assert_eq!(chunk.remaining_data(), CHUNK_SIZE + 10);
    }
}
