//! Transfer metadata consumed when a transfer is opened.
//!
//! A [`TransferInfo`] carries the fixed facts a storage backend needs
//! to size its pool: the nominal piece length and one [`PieceInfo`]
//! per piece with its expected length and content digest. The last
//! piece of a transfer is usually shorter than the nominal length.

/// Metadata for one piece: fixed identity, expected size and digest.
#[derive(Debug, Clone)]
pub struct PieceInfo {
    pub index: u32,
    pub length: u64,
    pub hash: [u8; 20],
}

impl PieceInfo {
    pub fn new(index: u32, hash: [u8; 20], length: u64) -> Self {
        Self {
            index,
            length,
            hash,
        }
    }
}

/// Descriptor for a whole transfer, used once at open.
#[derive(Debug, Clone)]
pub struct TransferInfo {
    piece_length: u64,
    pieces: Vec<PieceInfo>,
}

impl TransferInfo {
    pub fn new(piece_length: u64, pieces: Vec<PieceInfo>) -> Self {
        Self {
            piece_length,
            pieces,
        }
    }

    /// Builds a descriptor for `total_length` bytes split into pieces
    /// of `piece_length`, with the final piece truncated. Hashes are
    /// taken in index order.
    pub fn from_total_length(piece_length: u64, total_length: u64, hashes: Vec<[u8; 20]>) -> Self {
        let piece_count = total_length.div_ceil(piece_length) as usize;
        let pieces = hashes
            .into_iter()
            .take(piece_count)
            .enumerate()
            .map(|(i, hash)| {
                let offset = i as u64 * piece_length;
                let length = (total_length - offset).min(piece_length);
                PieceInfo::new(i as u32, hash, length)
            })
            .collect();

        Self {
            piece_length,
            pieces,
        }
    }

    /// The nominal piece length; every buffer in the pool is this big.
    pub fn piece_length(&self) -> u64 {
        self.piece_length
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    pub fn piece(&self, index: u32) -> Option<&PieceInfo> {
        self.pieces.get(index as usize)
    }

    pub fn pieces(&self) -> &[PieceInfo] {
        &self.pieces
    }

    pub fn total_length(&self) -> u64 {
        self.pieces.iter().map(|p| p.length).sum()
    }
}
