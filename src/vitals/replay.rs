// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Background task driving periodic replay of cached vitals.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

use super::VitalsMonitor;

/// Periodically re-emits the monitor's cached vitals.
///
/// The task ticks once per period, starting one period after launch, and
/// skips ticks it missed rather than bursting to catch up. Shutdown is
/// cooperative; a stop request finishes the current tick and then exits.
pub struct ReplayScheduler {
    shutdown: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl ReplayScheduler {
    /// Spawn the replay task. Must be called from within a tokio runtime.
    pub fn start(monitor: VitalsMonitor, period: Duration) -> Self {
        let shutdown = Arc::new(Notify::new());
        let stop = shutdown.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = stop.notified() => break,
                    _ = ticker.tick() => {
                        let replayed = monitor.replay_tick();
                        if replayed > 0 {
                            trace!(replayed, "replay tick");
                        }
                    }
                }
            }
        });

        Self {
            shutdown,
            handle: Some(handle),
            period,
        }
    }

    /// Replay cadence.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Check whether the replay task is still alive.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Request shutdown. The permit is stored, so the task exits at its
    /// next loop iteration even if it is mid-tick right now.
    pub fn stop(&mut self) {
        if self.handle.take().is_some() {
            self.shutdown.notify_one();
        }
    }
}

impl Drop for ReplayScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ReplayScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayScheduler")
            .field("period", &self.period)
            .field("running", &self.is_running())
            .finish()
    }
}
