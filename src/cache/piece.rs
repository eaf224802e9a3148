use bytes::Bytes;
use sha1::{Digest, Sha1};

use super::chunks::{ChunkField, BLOCK_SIZE};
use super::memory::{Pool, SharedPool};
use crate::storage::{PieceStorage, StorageError};

/// Per-piece record owned by the pool.
///
/// `index`, `length` and `hash` are fixed at open; everything else
/// cycles with the bound/unbound lifecycle. The record itself is
/// allocated once and never reallocated, only reset.
#[derive(Debug)]
pub(crate) struct Piece {
    pub(crate) index: u32,
    pub(crate) length: u64,
    pub(crate) hash: [u8; 20],
    pub(crate) size: u64,
    pub(crate) position: Option<usize>,
    pub(crate) active: bool,
    pub(crate) completed: bool,
    pub(crate) chunks: ChunkField,
}

impl Piece {
    pub(crate) fn new(index: u32, length: u64, hash: [u8; 20]) -> Self {
        Self {
            index,
            length,
            hash,
            size: 0,
            position: None,
            active: false,
            completed: false,
            chunks: ChunkField::new(length),
        }
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.position.is_some()
    }

    /// Returns the record to the fully unbound state.
    pub(crate) fn reset(&mut self) {
        self.chunks.clear();
        self.position = None;
        self.completed = false;
        self.active = false;
        self.size = 0;
    }
}

impl Pool {
    pub(crate) fn write_at(
        &mut self,
        index: u32,
        offset: u64,
        data: &[u8],
    ) -> Result<usize, StorageError> {
        let piece = self
            .pieces
            .get(index as usize)
            .ok_or(StorageError::InvalidPieceIndex(index))?;

        let end = offset + data.len() as u64;
        if end > piece.length {
            return Err(StorageError::InvalidBlockOffset {
                piece: index,
                offset,
            });
        }
        if data.is_empty() {
            return Ok(0);
        }

        let position = match piece.position {
            Some(position) => position,
            None => self.bind(index)?,
        };

        let start = offset as usize;
        self.buffers[position][start..start + data.len()].copy_from_slice(data);

        // Only whole blocks count towards `size`; the engine delivers
        // block-aligned chunks, so partial coverage happens at the
        // piece tail at most.
        const BS: u64 = BLOCK_SIZE as u64;
        let piece = &mut self.pieces[index as usize];
        for block in offset / BS..end.div_ceil(BS) {
            let block_start = block * BS;
            let block_len = (piece.length - block_start).min(BS);
            let covered = offset <= block_start && block_start + block_len <= end;
            if covered && piece.chunks.set(block as usize) {
                piece.size += block_len;
            }
        }

        Ok(data.len())
    }

    pub(crate) fn read_at(
        &self,
        index: u32,
        offset: u64,
        length: usize,
    ) -> Result<Bytes, StorageError> {
        let piece = self
            .pieces
            .get(index as usize)
            .ok_or(StorageError::InvalidPieceIndex(index))?;

        let Some(position) = piece.position else {
            return Err(StorageError::NotResident(index));
        };

        if offset + length as u64 > piece.length {
            return Err(StorageError::InvalidBlockOffset {
                piece: index,
                offset,
            });
        }

        let start = offset as usize;
        Ok(Bytes::copy_from_slice(
            &self.buffers[position][start..start + length],
        ))
    }

    pub(crate) fn verify(&self, index: u32) -> Result<bool, StorageError> {
        let piece = self
            .pieces
            .get(index as usize)
            .ok_or(StorageError::InvalidPieceIndex(index))?;

        let Some(position) = piece.position else {
            return Err(StorageError::NotResident(index));
        };

        let mut hasher = Sha1::new();
        hasher.update(&self.buffers[position][..piece.length as usize]);
        Ok(hasher.finalize().as_slice() == piece.hash)
    }
}

/// Engine-facing handle for byte-range I/O against one piece.
///
/// Cheap to clone; every method acquires the cache-wide lock for its
/// full duration. Once the transfer is stopped the handle outlives
/// the pool and all I/O returns [`StorageError::Closed`].
#[derive(Clone)]
pub struct PieceHandle {
    state: SharedPool,
    index: u32,
}

impl PieceHandle {
    pub(crate) fn new(state: SharedPool, index: u32) -> Self {
        Self { state, index }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Expected length of this piece; 0 once the transfer is stopped.
    pub fn length(&self) -> u64 {
        self.state
            .lock()
            .as_ref()
            .and_then(|p| p.pieces.get(self.index as usize))
            .map_or(0, |p| p.length)
    }

    /// True while the piece holds a buffer slot.
    pub fn is_resident(&self) -> bool {
        self.state
            .lock()
            .as_ref()
            .and_then(|p| p.pieces.get(self.index as usize))
            .is_some_and(|p| p.is_bound())
    }

    /// Bytes accounted as written so far; resets to 0 on eviction.
    pub fn bytes_written(&self) -> u64 {
        self.state
            .lock()
            .as_ref()
            .and_then(|p| p.pieces.get(self.index as usize))
            .map_or(0, |p| p.size)
    }

    /// True if the block at `block` has been written.
    pub fn has_block(&self, block: usize) -> bool {
        self.state
            .lock()
            .as_ref()
            .and_then(|p| p.pieces.get(self.index as usize))
            .is_some_and(|p| p.chunks.has(block))
    }

    /// True once every block of the piece has been written.
    pub fn has_all_blocks(&self) -> bool {
        self.state
            .lock()
            .as_ref()
            .and_then(|p| p.pieces.get(self.index as usize))
            .is_some_and(|p| p.chunks.is_complete())
    }

    /// Copies `data` into the bound buffer, claiming a free slot on
    /// the first write. Fails with [`StorageError::NoFreeSlot`] when
    /// the pool is exhausted and with
    /// [`StorageError::InvalidBlockOffset`] when the range falls
    /// outside the piece.
    pub fn write_at(&self, offset: u64, data: &[u8]) -> Result<usize, StorageError> {
        let mut state = self.state.lock();
        let pool = state.as_mut().ok_or(StorageError::Closed)?;
        pool.write_at(self.index, offset, data)
    }

    /// Copies `length` bytes starting at `offset` out of the bound
    /// buffer.
    pub fn read_at(&self, offset: u64, length: usize) -> Result<Bytes, StorageError> {
        let state = self.state.lock();
        let pool = state.as_ref().ok_or(StorageError::Closed)?;
        pool.read_at(self.index, offset, length)
    }

    /// Checks the resident bytes against the piece's expected digest.
    pub fn verify(&self) -> Result<bool, StorageError> {
        let state = self.state.lock();
        let pool = state.as_ref().ok_or(StorageError::Closed)?;
        pool.verify(self.index)
    }

    pub fn mark_complete(&self) -> Result<(), StorageError> {
        self.set_completed(true)
    }

    pub fn mark_not_complete(&self) -> Result<(), StorageError> {
        self.set_completed(false)
    }

    pub fn is_complete(&self) -> bool {
        self.state
            .lock()
            .as_ref()
            .and_then(|p| p.pieces.get(self.index as usize))
            .is_some_and(|p| p.completed)
    }

    fn set_completed(&self, completed: bool) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        let pool = state.as_mut().ok_or(StorageError::Closed)?;
        let piece = pool
            .pieces
            .get_mut(self.index as usize)
            .ok_or(StorageError::InvalidPieceIndex(self.index))?;

        piece.completed = completed;
        Ok(())
    }
}

impl PieceStorage for PieceHandle {
    fn write_at(&self, offset: u64, data: &[u8]) -> Result<usize, StorageError> {
        PieceHandle::write_at(self, offset, data)
    }

    fn read_at(&self, offset: u64, length: usize) -> Result<Bytes, StorageError> {
        PieceHandle::read_at(self, offset, length)
    }

    fn verify(&self) -> Result<bool, StorageError> {
        PieceHandle::verify(self)
    }

    fn mark_complete(&self) -> Result<(), StorageError> {
        PieceHandle::mark_complete(self)
    }

    fn mark_not_complete(&self) -> Result<(), StorageError> {
        PieceHandle::mark_not_complete(self)
    }

    fn is_complete(&self) -> bool {
        PieceHandle::is_complete(self)
    }
}
