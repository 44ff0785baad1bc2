use crate::hold_store::HoldStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Periodically evict expired holds so abandoned checkouts don't pile up.
///
/// Reads already ignore expired holds; this only bounds memory.
pub fn spawn_sweeper(store: Arc<HoldStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!("Hold sweeper started, interval {:?}", every);

        loop {
            ticker.tick().await;
            let removed = store.sweep_expired();
            if removed > 0 {
                debug!("Swept {} expired hold(s)", removed);
            }
        }
    })
}
