// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The recorder facade.
//!
//! [`FrontendRecorder`] bundles the route-switch tracker, the vitals
//! monitor, and optional endpoint metrics behind one object, wired to a
//! single sink and clock. Applications construct it once per session via
//! [`RecorderBuilder`] and hand out the cheap clones of its parts.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::clock::{Clock, MonotonicClock};
use crate::config::{resolve_config, RecorderConfig, RecorderOverrides};
use crate::endpoint::EndpointMetrics;
use crate::error::{ConfigError, RecorderError};
use crate::navigation::{NavigationState, PageRenderTracker, RouteSwitchTracker};
use crate::sink::{SharedSink, TracingSink};
use crate::types::{SessionId, VitalKind, VitalSample};
use crate::vitals::{ReplayScheduler, VitalSource, VitalsMonitor};

/// Builder for [`FrontendRecorder`].
#[derive(Default)]
pub struct RecorderBuilder {
    config: RecorderConfig,
    sink: Option<SharedSink>,
    clock: Option<Arc<dyn Clock>>,
}

impl RecorderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already resolved configuration.
    pub fn config(mut self, config: RecorderConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve configuration from a workspace root (files, then
    /// environment).
    pub fn config_from(mut self, workspace_root: &Path) -> Result<Self, ConfigError> {
        self.config = resolve_config(workspace_root, RecorderOverrides::default())?;
        Ok(self)
    }

    /// Record through this sink instead of the default [`TracingSink`].
    pub fn sink(mut self, sink: SharedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Measure durations with this clock instead of the monotonic one.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<FrontendRecorder, RecorderError> {
        self.config.validate()?;
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        Ok(FrontendRecorder::with_parts(self.config, sink, clock))
    }
}

/// Records navigation timing, web vitals, and endpoint calls for one
/// application session.
pub struct FrontendRecorder {
    session_id: SessionId,
    config: RecorderConfig,
    navigation: RouteSwitchTracker,
    vitals: VitalsMonitor,
    endpoints: Option<EndpointMetrics>,
    replay: Mutex<Option<ReplayScheduler>>,
}

impl FrontendRecorder {
    fn with_parts(config: RecorderConfig, sink: SharedSink, clock: Arc<dyn Clock>) -> Self {
        let session_id = SessionId::new();
        let navigation = RouteSwitchTracker::new(
            &sink,
            clock,
            config.service_name.clone(),
            config.route_switch_boundaries.clone(),
            config.log_measurements,
        );
        let vitals = VitalsMonitor::new(&sink, config.service_name.clone(), config.log_measurements);
        let endpoints = config.track_endpoints.then(|| {
            EndpointMetrics::new(
                &sink,
                navigation.clone(),
                config.service_name.clone(),
                config.log_measurements,
            )
        });

        info!(
            session = %session_id.short(),
            service = %config.service_name,
            "recorder initialized"
        );

        Self {
            session_id,
            config,
            navigation,
            vitals,
            endpoints,
            replay: Mutex::new(None),
        }
    }

    /// Identifier of this recorder instance. Appears in logs only.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// The resolved configuration this recorder runs with.
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Mark the start of a navigation to `to`.
    pub fn start_route_switch(&self, to: impl Into<String>) {
        self.navigation.start_route_switch(to);
    }

    /// Record the pending route switch as finished now.
    pub fn complete_route_switch(&self) {
        self.navigation.complete_route_switch();
    }

    /// Snapshot the navigation state.
    pub fn navigation_state(&self) -> NavigationState {
        self.navigation.state()
    }

    /// A tracker clone for wiring into a [`NavigationWatcher`] or other
    /// producers.
    ///
    /// [`NavigationWatcher`]: crate::navigation::NavigationWatcher
    pub fn route_tracker(&self) -> RouteSwitchTracker {
        self.navigation.clone()
    }

    /// A fresh per-page render tracker. Its first render completes the
    /// pending route switch.
    pub fn page_render_tracker(&self) -> PageRenderTracker {
        PageRenderTracker::new(self.navigation.clone())
    }

    /// Record one vital sample.
    pub fn record_vital(&self, sample: &VitalSample) {
        self.vitals.record_vital(sample);
    }

    /// Cached value for a vital kind, if any.
    pub fn cached_vital(&self, kind: VitalKind) -> Option<f64> {
        self.vitals.cached_value(kind)
    }

    /// Subscribe the recorder to every vital kind on a source. Only the
    /// first call attaches.
    pub fn attach_vital_source(&self, source: &dyn VitalSource) -> bool {
        self.vitals.attach_source(source)
    }

    /// Endpoint metrics, when endpoint tracking is enabled.
    pub fn endpoint_metrics(&self) -> Option<EndpointMetrics> {
        self.endpoints.clone()
    }

    /// Re-emit cached vitals once, synchronously.
    pub fn replay_tick(&self) -> usize {
        self.vitals.replay_tick()
    }

    /// Start the periodic replay task. Must be called from within a tokio
    /// runtime. Returns false when replay is already running.
    pub fn start_replay(&self) -> bool {
        let mut slot = self.replay.lock().unwrap();
        if slot.as_ref().map(ReplayScheduler::is_running).unwrap_or(false) {
            debug!("replay already running, ignoring");
            return false;
        }
        *slot = Some(ReplayScheduler::start(
            self.vitals.clone(),
            self.config.replay_interval(),
        ));
        true
    }

    /// Stop the periodic replay task if it is running.
    pub fn stop_replay(&self) {
        if let Some(mut scheduler) = self.replay.lock().unwrap().take() {
            scheduler.stop();
        }
    }

    /// Whether the periodic replay task is running.
    pub fn replay_running(&self) -> bool {
        self.replay
            .lock()
            .unwrap()
            .as_ref()
            .map(ReplayScheduler::is_running)
            .unwrap_or(false)
    }
}

impl Default for FrontendRecorder {
    fn default() -> Self {
        Self::with_parts(
            RecorderConfig::default(),
            Arc::new(TracingSink::new()),
            Arc::new(MonotonicClock::new()),
        )
    }
}

impl std::fmt::Debug for FrontendRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrontendRecorder")
            .field("session_id", &self.session_id)
            .field("service_name", &self.config.service_name)
            .field("track_endpoints", &self.endpoints.is_some())
            .field("replay_running", &self.replay_running())
            .finish()
    }
}
