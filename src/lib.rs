//! rmem - In-memory piece storage for BitTorrent engines
//!
//! This library provides a bounded-capacity, fixed-buffer memory cache
//! that a transfer engine can plug in as a storage backend. Piece data
//! lives in a small fixed pool of reusable byte buffers that is
//! multiplexed over the much larger set of pieces a transfer has over
//! its lifetime.
//!
//! # Modules
//!
//! - [`metainfo`] - Transfer descriptor consumed when a transfer is opened
//! - [`storage`] - The storage-plugin contract and error types
//! - [`cache`] - The buffer-slot pool, eviction engine and monitor loop

pub mod cache;
pub mod metainfo;
pub mod storage;

pub use cache::{
    BufferSlot, CacheInfo, ChunkField, MemoryCache, MemoryStorage, PieceHandle, BLOCK_SIZE,
};
pub use metainfo::{PieceInfo, TransferInfo};
pub use storage::{PieceStorage, StorageBackend, StorageError, TransferStorage};
