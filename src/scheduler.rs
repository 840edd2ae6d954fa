//! Autosave background task.

use crate::plugin::PluginRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Spawn the autosave loop.
///
/// Calls [`PluginRegistry::save_all`] every `interval`, starting one
/// interval after spawn. Faulty plugins are reported by `save_all` and never
/// stop the loop. Exits when `shutdown` is cancelled; the final save on
/// shutdown is the caller's job.
pub fn spawn_autosave(
    registry: Arc<PluginRegistry>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        info!(interval_secs = interval.as_secs(), "Autosave started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let report = registry.save_all().await;
                    crate::metrics::record_autosave(report.is_clean());
                    if report.is_clean() {
                        debug!(saved = report.saved.len(), "Autosave complete");
                    } else {
                        warn!(saved = report.saved.len(), failed = ?report.failed, "Autosave finished with failures");
                    }
                }
            }
        }
        debug!("Autosave stopped");
    })
}
