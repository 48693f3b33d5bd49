//! Periodic reconciliation driver
//!
//! One scheduler per source, each on its own task. The timer only fires
//! the next tick after the previous scan returns, so scans for one source
//! are strictly sequential; sources never wait on each other.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use panel_config::DEFAULT_UPDATE_INTERVAL;

use crate::sync::SyncEngine;

/// Drives one engine at its configured interval until shut down.
pub struct Scheduler {
    engine: Arc<SyncEngine>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        let configured = engine.config().update_interval;
        let interval = if configured.is_zero() {
            DEFAULT_UPDATE_INTERVAL
        } else {
            configured
        };

        Self { engine, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until the shutdown channel flips to `true` or its sender drops.
    ///
    /// Cancellation is cooperative: a scan already in flight finishes, and
    /// only the next tick is suppressed. Scan failures are logged and the
    /// loop keeps going; the following tick is the retry.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick of a tokio interval completes immediately; consume
        // it so the first scheduled scan lands one interval from now.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!(source = %self.engine.config().name, "stopping element scheduler");
                        return;
                    }
                }
                _ = ticker.tick() => {
                    if *shutdown.borrow() {
                        return;
                    }
                    if let Err(error) = self.engine.reconcile().await {
                        tracing::error!(
                            source = %self.engine.config().name,
                            %error,
                            "failed to reconcile panel elements"
                        );
                    }
                }
            }
        }
    }
}
