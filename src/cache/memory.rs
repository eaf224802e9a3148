use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, trace};

use super::piece::{Piece, PieceHandle};
use super::slot::{slot_count, BufferSlot};
use crate::metainfo::TransferInfo;
use crate::storage::{StorageBackend, StorageError, TransferStorage};

/// Byte budget a default-constructed backend starts with.
pub const DEFAULT_CAPACITY: u64 = 256 * 1024 * 1024;

/// Grace window between a removal request and the eviction it
/// schedules, so an in-flight read of the buffer can finish before
/// the slot is reused.
pub(crate) const REMOVE_GRACE: Duration = Duration::from_millis(150);

/// Aggregate fill statistics for one open transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheInfo {
    /// Configured byte budget.
    pub capacity: u64,
    /// Sum of bytes accounted as written over all bound pieces.
    pub filled: u64,
    /// Number of slots currently holding a piece.
    pub items: u64,
}

/// The in-memory storage backend.
///
/// Holds the byte budget handed to each transfer as it is opened.
/// `set_capacity` only affects transfers opened afterwards; an
/// already-open pool is never resized.
pub struct MemoryStorage {
    capacity: Mutex<u64>,
}

impl MemoryStorage {
    pub fn new(capacity: u64) -> Self {
        debug!("memory storage with {} byte budget", capacity);
        Self {
            capacity: Mutex::new(capacity),
        }
    }

    /// Updates the byte budget used to size the next opened transfer.
    pub fn set_capacity(&self, capacity: u64) {
        debug!("setting max memory size to {} bytes", capacity);
        *self.capacity.lock() = capacity;
    }

    pub fn capacity(&self) -> u64 {
        *self.capacity.lock()
    }

    /// Sizes and allocates the pool for one transfer and starts its
    /// monitor task on the ambient tokio runtime.
    pub fn open_transfer(&self, info: &TransferInfo) -> Result<Arc<MemoryCache>, StorageError> {
        MemoryCache::open(self.capacity(), info)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl StorageBackend for MemoryStorage {
    type Transfer = MemoryCache;

    fn open_transfer(&self, info: &TransferInfo) -> Result<Arc<MemoryCache>, StorageError> {
        MemoryStorage::open_transfer(self, info)
    }
}

/// Everything the cache owns: buffers, the slot table and the piece
/// records, allocated together at open and dropped together at stop.
pub(crate) struct Pool {
    pub(crate) buffers: Vec<Vec<u8>>,
    pub(crate) slots: Vec<BufferSlot>,
    pub(crate) pieces: Vec<Piece>,
}

impl Pool {
    fn new(capacity: u64, info: &TransferInfo) -> Self {
        let count = slot_count(capacity, info.piece_length(), info.piece_count());

        Self {
            buffers: (0..count)
                .map(|_| vec![0u8; info.piece_length() as usize])
                .collect(),
            slots: vec![BufferSlot::default(); count],
            pieces: info
                .pieces()
                .iter()
                .map(|p| Piece::new(p.index, p.length, p.hash))
                .collect(),
        }
    }

    /// Claims a free slot for `index` on its first write.
    pub(crate) fn bind(&mut self, index: u32) -> Result<usize, StorageError> {
        let Some(position) = self.slots.iter().position(|s| !s.used) else {
            return Err(StorageError::NoFreeSlot(index));
        };

        self.slots[position].claim(index);

        let piece = &mut self.pieces[index as usize];
        piece.position = Some(position);
        piece.active = true;
        trace!("piece {} bound to slot {}", piece.index, position);
        Ok(position)
    }

    /// Frees the slot bound to `index` and fully resets the record.
    pub(crate) fn evict(&mut self, index: u32) {
        // The first piece is pinned, it is read constantly while the
        // transfer runs.
        if index == 0 {
            return;
        }

        let Some(piece) = self.pieces.get_mut(index as usize) else {
            return;
        };

        if let Some(position) = piece.position {
            self.slots[position].release();
            trace!("piece {} evicted from slot {}", piece.index, position);
        }

        piece.reset();
    }
}

pub(crate) type SharedPool = Arc<Mutex<Option<Pool>>>;

/// Fixed-pool memory cache for one transfer.
///
/// Owns the buffers, slot table and piece records behind a single
/// mutex; every operation holds the lock for its full duration. Slot
/// operations are O(1) or O(slot count) and rare next to the
/// byte-level I/O they gate, so one coarse lock keeps the state model
/// simple.
pub struct MemoryCache {
    capacity: u64,
    piece_count: usize,
    piece_length: u64,
    pub(super) state: SharedPool,
    pub(super) running: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl MemoryCache {
    pub(crate) fn open(capacity: u64, info: &TransferInfo) -> Result<Arc<Self>, StorageError> {
        if info.piece_count() == 0 {
            return Err(StorageError::InvalidMetadata("no pieces"));
        }
        if info.piece_length() == 0 {
            return Err(StorageError::InvalidMetadata("zero piece length"));
        }
        for (i, piece) in info.pieces().iter().enumerate() {
            if piece.index != i as u32 {
                return Err(StorageError::InvalidMetadata("piece indices not contiguous"));
            }
            if piece.length == 0 || piece.length > info.piece_length() {
                return Err(StorageError::InvalidMetadata("piece length out of range"));
            }
        }

        let pool = Pool::new(capacity, info);
        debug!(
            "opened transfer: {} pieces of {} bytes, {} buffer slots",
            info.piece_count(),
            info.piece_length(),
            pool.slots.len()
        );

        let (shutdown, shutdown_rx) = watch::channel(false);
        let cache = Arc::new(Self {
            capacity,
            piece_count: info.piece_count(),
            piece_length: info.piece_length(),
            state: Arc::new(Mutex::new(Some(pool))),
            running: AtomicBool::new(true),
            shutdown,
        });

        tokio::spawn(Arc::clone(&cache).monitor(shutdown_rx));

        Ok(cache)
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn piece_count(&self) -> usize {
        self.piece_count
    }

    pub fn piece_length(&self) -> u64 {
        self.piece_length
    }

    /// Number of buffers in the pool; 0 once the transfer is stopped.
    pub fn slot_count(&self) -> usize {
        self.state.lock().as_ref().map_or(0, |p| p.slots.len())
    }

    /// True while the monitor task is alive.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns a handle for the piece at `index`, or `None` when the
    /// index is out of range or the transfer has been stopped.
    pub fn piece(&self, index: u32) -> Option<PieceHandle> {
        let state = self.state.lock();
        let pool = state.as_ref()?;

        if index as usize >= pool.pieces.len() {
            return None;
        }

        Some(PieceHandle::new(Arc::clone(&self.state), index))
    }

    /// Samples aggregate fill statistics under the lock.
    pub fn info(&self) -> CacheInfo {
        let state = self.state.lock();

        let mut info = CacheInfo {
            capacity: self.capacity,
            ..CacheInfo::default()
        };

        if let Some(pool) = state.as_ref() {
            for slot in &pool.slots {
                if slot.used {
                    info.items += 1;
                    info.filled += pool.pieces[slot.piece as usize].size;
                }
            }
        }

        info
    }

    pub(crate) fn evict(&self, index: u32) {
        if let Some(pool) = self.state.lock().as_mut() {
            pool.evict(index);
        }
    }

    /// Requests removal of one piece after the grace delay.
    ///
    /// If the piece is bound, a one-shot task is scheduled that evicts
    /// it [`REMOVE_GRACE`] later. Repeated calls before the delay
    /// elapses schedule independent tasks; eviction is idempotent, so
    /// they converge. A task that fires after the transfer stopped
    /// finds no pool and does nothing.
    pub fn remove_piece(&self, index: u32) {
        let bound = {
            let state = self.state.lock();
            let Some(pool) = state.as_ref() else { return };
            pool.pieces
                .get(index as usize)
                .is_some_and(|p| p.is_bound())
        };

        if !bound {
            return;
        }

        let shared = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(REMOVE_GRACE).await;
            if let Some(pool) = shared.lock().as_mut() {
                pool.evict(index);
            }
        });
    }

    /// Reconciles the pool against the set of pieces the engine still
    /// wants resident, evicting every bound piece outside it.
    ///
    /// This is the bulk counterpart to [`MemoryCache::remove_piece`]:
    /// when the engine's priority window shifts, one call reclaims
    /// every slot the window left behind, synchronously and with no
    /// grace delay.
    pub fn sync_pieces(&self, active: &HashSet<u32>) {
        let mut state = self.state.lock();
        let Some(pool) = state.as_mut() else { return };

        for s in 0..pool.slots.len() {
            let slot = pool.slots[s];
            if slot.used && !active.contains(&slot.piece) {
                pool.evict(slot.piece);
            }
        }
    }

    /// Signals the monitor to exit and severs the pool; buffers, slot
    /// table and piece records all drop here. Pending removal tasks
    /// are not cancelled; they fire against the empty state and
    /// no-op.
    pub fn stop(&self) {
        debug!("storage stop");

        let _ = self.shutdown.send(true);
        *self.state.lock() = None;
    }

    /// Idempotent teardown: a no-op unless the monitor is running.
    pub fn close(&self) -> Result<(), StorageError> {
        if !self.is_running() {
            return Ok(());
        }

        self.stop();
        Ok(())
    }
}

impl TransferStorage for MemoryCache {
    type Piece = PieceHandle;

    fn piece(&self, index: u32) -> Option<PieceHandle> {
        MemoryCache::piece(self, index)
    }

    fn info(&self) -> CacheInfo {
        MemoryCache::info(self)
    }

    fn close(&self) -> Result<(), StorageError> {
        MemoryCache::close(self)
    }
}
