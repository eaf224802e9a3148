use std::sync::Arc;

use bytes::Bytes;

use super::error::StorageError;
use crate::cache::CacheInfo;
use crate::metainfo::TransferInfo;

/// Opens transfers against some storage medium.
///
/// One backend serves many transfers over its lifetime; each open
/// sizes and allocates the per-transfer state.
pub trait StorageBackend {
    type Transfer: TransferStorage;

    fn open_transfer(&self, info: &TransferInfo) -> Result<Arc<Self::Transfer>, StorageError>;
}

/// Per-transfer storage handle.
///
/// Piece lookup is speculative by contract: the engine may probe
/// indices it is not sure about, so an out-of-range index is `None`
/// rather than an error. `close` is idempotent.
pub trait TransferStorage {
    type Piece: PieceStorage;

    fn piece(&self, index: u32) -> Option<Self::Piece>;

    fn info(&self) -> CacheInfo;

    fn close(&self) -> Result<(), StorageError>;
}

/// Byte-range I/O against a single piece.
///
/// Something external drives these methods as bytes arrive off the
/// wire: writes fill the piece's buffer and advance its completion
/// tracking, `verify` checks the content digest once everything is
/// in, and the completion flag is toggled by the engine after it has
/// decided the piece is good.
pub trait PieceStorage {
    fn write_at(&self, offset: u64, data: &[u8]) -> Result<usize, StorageError>;

    fn read_at(&self, offset: u64, length: usize) -> Result<Bytes, StorageError>;

    fn verify(&self) -> Result<bool, StorageError>;

    fn mark_complete(&self) -> Result<(), StorageError>;

    fn mark_not_complete(&self) -> Result<(), StorageError>;

    fn is_complete(&self) -> bool;
}
