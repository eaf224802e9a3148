//! The storage-plugin contract.
//!
//! A transfer engine talks to storage through three seams: a
//! [`StorageBackend`] opens a transfer, the resulting
//! [`TransferStorage`] hands out per-piece handles and aggregate
//! statistics, and each [`PieceStorage`] does byte-range I/O against
//! one piece. The in-memory implementation lives in [`crate::cache`];
//! the contract itself carries no I/O of its own.
//!
//! # Examples
//!
//! ```no_run
//! use rmem::{MemoryStorage, StorageBackend, TransferStorage, PieceStorage};
//! use rmem::metainfo::{PieceInfo, TransferInfo};
//!
//! # async fn example() -> Result<(), rmem::StorageError> {
//! let backend = MemoryStorage::new(64 * 1024 * 1024);
//!
//! let info = TransferInfo::new(
//!     16384,
//!     vec![PieceInfo::new(0, [0u8; 20], 16384)],
//! );
//!
//! let transfer = backend.open_transfer(&info)?;
//!
//! if let Some(piece) = transfer.piece(0) {
//!     piece.write_at(0, &[1u8; 16384])?;
//! }
//!
//! transfer.close()?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod error;

pub use backend::{PieceStorage, StorageBackend, TransferStorage};
pub use error::StorageError;
