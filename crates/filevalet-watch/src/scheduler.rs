//! The periodic driver.
//!
//! One logical timer ticks both the monitor's fallback scans and the
//! trash eviction sweep; event-driven dispatch runs independently of this
//! tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use filevalet_core::SnapshotStore;
use filevalet_ops::EvictionManager;

use crate::monitor::Monitor;

/// Drives fallback scans and trash eviction on one interval.
pub struct Scheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn the scheduler.
    ///
    /// Every `period`, the monitor queues a fallback scan for each folder
    /// and, when the published snapshot carries an active trash policy,
    /// the eviction manager runs one sweep. A failure in either half of
    /// the tick never skips the other.
    pub fn spawn(
        monitor: Monitor,
        eviction: Arc<EvictionManager>,
        store: Arc<SnapshotStore>,
        period: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(monitor, eviction, store, period, cancel.clone()));
        Self { cancel, handle }
    }

    /// Stop ticking and wait for the current tick to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                error!(error = %e, "scheduler ended abnormally");
            }
        }
    }
}

async fn run(
    monitor: Monitor,
    eviction: Arc<EvictionManager>,
    store: Arc<SnapshotStore>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(period_ms = period.as_millis() as u64, "scheduler started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        monitor.scan_tick().await;

        let policy = store.current().trash_policy.clone();
        if let Some(policy) = policy.filter(|p| p.is_active()) {
            let manager = eviction.clone();
            match tokio::task::spawn_blocking(move || manager.run_sweep(&policy)).await {
                Ok(results) if results.is_empty() => {}
                Ok(results) => debug!(evicted = results.len(), "trash sweep finished"),
                Err(e) => error!(error = %e, "trash sweep panicked"),
            }
        }
    }
    info!("scheduler stopped");
}
