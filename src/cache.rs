//! The buffer-slot pool and eviction engine.
//!
//! This module is the heart of the crate: a fixed pool of
//! piece-length byte buffers multiplexed over a transfer's much
//! larger piece set, with demand-driven eviction.
//!
//! # Overview
//!
//! - [`MemoryStorage`] - The backend: capacity configuration and open
//! - [`MemoryCache`] - Per-transfer pool owner: binding, eviction,
//!   reconciliation, statistics, teardown
//! - [`PieceHandle`] - Engine-facing byte-range I/O for one piece
//! - [`BufferSlot`] - Slot-state record pairing a buffer with the
//!   piece currently bound to it
//! - [`ChunkField`] - Bitmap of 16 KiB blocks written into a piece
//!
//! # Pool sizing
//!
//! The pool holds `min(ceil(capacity / piece_length) + 2,
//! piece_count)` buffers. The `+ 2` headroom absorbs writes that are
//! in flight while the pool briefly sits at the capacity-implied
//! count. Slots are allocated zero-filled when the transfer is opened
//! and never resized afterwards.
//!
//! # Eviction
//!
//! Eviction is demand-driven, not LRU: the engine either asks for one
//! index to go away ([`MemoryCache::remove_piece`], which grants a
//! short grace delay so in-flight reads can finish) or reconciles the
//! whole pool against the set of pieces it still wants resident
//! ([`MemoryCache::sync_pieces`]). Piece 0 is pinned and survives
//! both paths.
//!
//! # Examples
//!
//! ```no_run
//! use rmem::cache::MemoryStorage;
//! use rmem::metainfo::{PieceInfo, TransferInfo};
//!
//! # async fn example() -> Result<(), rmem::StorageError> {
//! let backend = MemoryStorage::new(64 * 1024 * 1024);
//! let info = TransferInfo::new(
//!     2 * 1024 * 1024,
//!     (0..100)
//!         .map(|i| PieceInfo::new(i, [0u8; 20], 2 * 1024 * 1024))
//!         .collect(),
//! );
//!
//! let cache = backend.open_transfer(&info)?;
//! let stats = cache.info();
//! assert_eq!(stats.items, 0);
//!
//! cache.close()?;
//! # Ok(())
//! # }
//! ```

mod chunks;
mod memory;
mod monitor;
mod piece;
mod slot;

pub use chunks::{ChunkField, BLOCK_SIZE};
pub use memory::{CacheInfo, MemoryCache, MemoryStorage, DEFAULT_CAPACITY};
pub use piece::PieceHandle;
pub use slot::BufferSlot;
