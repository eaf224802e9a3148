use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid transfer metadata: {0}")]
    InvalidMetadata(&'static str),

    #[error("invalid piece index: {0}")]
    InvalidPieceIndex(u32),

    #[error("invalid block offset: piece {piece}, offset {offset}")]
    InvalidBlockOffset { piece: u32, offset: u64 },

    #[error("no free buffer slot for piece {0}")]
    NoFreeSlot(u32),

    #[error("piece {0} has no resident buffer")]
    NotResident(u32),

    #[error("piece hash mismatch for piece {0}")]
    HashMismatch(u32),

    #[error("storage is closed")]
    Closed,
}
