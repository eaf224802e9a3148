/// Granularity of the received-range tracking, one bit per block.
pub const BLOCK_SIZE: u32 = 16384;

/// A bitmap of which fixed-size blocks of a piece have been written.
///
/// Each bit represents one [`BLOCK_SIZE`] block, numbered from the
/// high bit of the first byte. The last block of a piece may be
/// shorter than `BLOCK_SIZE`; it still gets one bit.
#[derive(Debug, Clone)]
pub struct ChunkField {
    bits: Vec<u8>,
    block_count: usize,
}

impl ChunkField {
    /// Creates an empty field for a piece of `piece_length` bytes.
    pub fn new(piece_length: u64) -> Self {
        let block_count = piece_length.div_ceil(BLOCK_SIZE as u64) as usize;
        Self {
            bits: vec![0; block_count.div_ceil(8)],
            block_count,
        }
    }

    /// Returns true if the block at the given index has been written.
    pub fn has(&self, index: usize) -> bool {
        if index >= self.block_count {
            return false;
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8);
        (self.bits[byte_index] >> bit_index) & 1 == 1
    }

    /// Marks the block at the given index as written. Returns true if
    /// the bit was newly set.
    pub fn set(&mut self, index: usize) -> bool {
        if index >= self.block_count {
            return false;
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8);
        let newly = (self.bits[byte_index] >> bit_index) & 1 == 0;
        self.bits[byte_index] |= 1 << bit_index;
        newly
    }

    /// Clears every bit; used when a piece is evicted.
    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    /// Number of blocks that have been written.
    pub fn count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Total number of blocks in the piece.
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&b| b == 0)
    }

    /// True once every block of the piece has been written.
    pub fn is_complete(&self) -> bool {
        self.count() == self.block_count
    }
}
