use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::memory::MemoryCache;

/// How often the monitor samples aggregate fill statistics.
pub(crate) const MONITOR_INTERVAL: Duration = Duration::from_secs(1);

impl MemoryCache {
    /// Background loop started when a transfer is opened.
    ///
    /// Samples [`MemoryCache::info`] once a second until the shutdown
    /// channel flips, then clears the running flag and exits.
    pub(crate) async fn monitor(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        debug!("storage start");

        let mut ticker = interval(MONITOR_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let info = self.info();
                    debug!(
                        "cap: {} | size: {} | items: {}",
                        info.capacity, info.filled, info.items
                    );
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        debug!("storage monitor stopped");
    }
}
