// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Route-switch duration tracking.
//!
//! A switch is measured from [`RouteSwitchTracker::start_route_switch`] to
//! [`RouteSwitchTracker::complete_route_switch`]. Only one switch is in
//! flight at a time; starting again before completion overwrites the
//! pending one, which matches how users interrupt slow navigations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::sink::{HistogramHandle, InstrumentSpec, SharedSink};
use crate::types::{attr, Attributes};

/// Instrument receiving route-switch durations.
pub const ROUTE_SWITCH_INSTRUMENT: &str = "frontend.navigation.route_switch_milliseconds";

/// Explicit bucket boundaries for the route-switch histogram, tuned for
/// interactive navigation times.
pub const ROUTE_SWITCH_BOUNDARIES_MS: [f64; 16] = [
    10.0, 25.0, 50.0, 75.0, 100.0, 150.0, 200.0, 300.0, 400.0, 500.0, 750.0, 1000.0, 1500.0,
    2000.0, 3000.0, 5000.0,
];

/// Snapshot of the tracker's navigation state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationState {
    /// Clock reading when the pending switch started, if one is in flight.
    pub route_start: Option<Duration>,

    /// Route currently being navigated to, or already on.
    pub current_route: Option<String>,

    /// Route before the current one.
    pub previous_route: Option<String>,
}

struct TrackerInner {
    state: Mutex<NavigationState>,
    histogram: Option<Arc<dyn HistogramHandle>>,
    clock: Arc<dyn Clock>,
    service_name: String,
    log_measurements: bool,
}

/// Measures how long route switches take.
///
/// Cheap to clone; clones share state, so the watcher task and render
/// hooks can all drive the same tracker.
#[derive(Clone)]
pub struct RouteSwitchTracker {
    inner: Arc<TrackerInner>,
}

impl RouteSwitchTracker {
    /// Create the tracker and its histogram on the sink.
    ///
    /// If the instrument cannot be created the tracker still works, it
    /// just logs a warning instead of recording.
    pub fn new(
        sink: &SharedSink,
        clock: Arc<dyn Clock>,
        service_name: impl Into<String>,
        boundaries: Vec<f64>,
        log_measurements: bool,
    ) -> Self {
        let spec = InstrumentSpec::new(
            ROUTE_SWITCH_INSTRUMENT,
            "Time taken to switch between routes in milliseconds",
        )
        .with_unit("ms")
        .with_boundaries(boundaries);

        let histogram = match sink.create_histogram(spec) {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!(%error, "failed to create route switch instrument");
                None
            }
        };

        Self {
            inner: Arc::new(TrackerInner {
                state: Mutex::new(NavigationState::default()),
                histogram,
                clock,
                service_name: service_name.into(),
                log_measurements,
            }),
        }
    }

    /// Mark the start of a navigation to `to`.
    ///
    /// Always wins: a pending switch is discarded and its routes shift so
    /// the eventual measurement describes the latest navigation.
    pub fn start_route_switch(&self, to: impl Into<String>) {
        let to = to.into();
        let mut state = self.inner.state.lock().unwrap();
        if state.route_start.is_some() {
            debug!(route = %to, "new navigation before previous completed, restarting measurement");
        }
        state.previous_route = state.current_route.take();
        state.current_route = Some(to);
        state.route_start = Some(self.inner.clock.now());
    }

    /// Record the pending switch as finished now.
    ///
    /// Without a matching start this is a no-op. The pending start is
    /// cleared only when the sink accepted the measurement, so a transient
    /// record failure can still be completed later.
    pub fn complete_route_switch(&self) {
        let mut state = self.inner.state.lock().unwrap();
        let Some(start) = state.route_start else {
            warn!("route switch completed without a start, ignoring");
            return;
        };
        let Some(histogram) = &self.inner.histogram else {
            warn!("no route switch instrument, dropping measurement");
            return;
        };

        let duration = duration_millis(self.inner.clock.now().saturating_sub(start));
        let attributes = Attributes::new()
            .with(attr::SERVICE_NAME, self.inner.service_name.as_str())
            .with(
                attr::ROUTE_FROM,
                state.previous_route.as_deref().unwrap_or("initial"),
            )
            .with(
                attr::ROUTE_TO,
                state.current_route.as_deref().unwrap_or("unknown"),
            );

        match histogram.record(duration, &attributes) {
            Ok(()) => {
                state.route_start = None;
                if self.inner.log_measurements {
                    info!(
                        duration_ms = duration,
                        attributes = %attributes.render(),
                        "recorded route switch"
                    );
                }
            }
            Err(error) => {
                warn!(duration_ms = duration, %error, "failed to record route switch");
            }
        }
    }

    /// Snapshot the navigation state.
    pub fn state(&self) -> NavigationState {
        self.inner.state.lock().unwrap().clone()
    }

    /// Route currently navigated to, if any.
    pub fn current_route(&self) -> Option<String> {
        self.inner.state.lock().unwrap().current_route.clone()
    }
}

impl std::fmt::Debug for RouteSwitchTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSwitchTracker")
            .field("service_name", &self.inner.service_name)
            .field("state", &*self.inner.state.lock().unwrap())
            .finish()
    }
}

fn duration_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Completes a route switch the first time a page reports it rendered.
///
/// One tracker is created per rendered page; re-renders of the same page
/// must not complete the measurement again.
pub struct PageRenderTracker {
    tracker: RouteSwitchTracker,
    fired: AtomicBool,
}

impl PageRenderTracker {
    pub(crate) fn new(tracker: RouteSwitchTracker) -> Self {
        Self {
            tracker,
            fired: AtomicBool::new(false),
        }
    }

    /// Signal that the page finished rendering. Only the first call per
    /// tracker completes the pending route switch.
    pub fn record_render(&self) {
        if !self.fired.swap(true, Ordering::SeqCst) {
            self.tracker.complete_route_switch();
        }
    }

    /// Whether this tracker already completed its switch.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for PageRenderTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRenderTracker")
            .field("fired", &self.has_fired())
            .finish()
    }
}

/// Forwards route-change events from a channel to a tracker.
///
/// Producers keep a cheap [`UnboundedSender`] and never block; the watcher
/// task starts a switch for each received route in order.
pub struct NavigationWatcher {
    sender: UnboundedSender<String>,
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl NavigationWatcher {
    /// Spawn the watcher task. Must be called from within a tokio runtime.
    pub fn spawn(tracker: RouteSwitchTracker) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<String>();
        let shutdown = Arc::new(Notify::new());
        let stop = shutdown.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    route = receiver.recv() => match route {
                        Some(route) => tracker.start_route_switch(route),
                        None => break,
                    },
                    _ = stop.notified() => {
                        // Deliver what is already queued, then exit.
                        while let Ok(route) = receiver.try_recv() {
                            tracker.start_route_switch(route);
                        }
                        break;
                    }
                }
            }
            debug!("navigation watcher stopped");
        });

        Self {
            sender,
            shutdown,
            handle,
        }
    }

    /// A sender that can be handed to navigation event producers.
    pub fn sender(&self) -> UnboundedSender<String> {
        self.sender.clone()
    }

    /// Send one route change. Returns false if the watcher has stopped.
    pub fn navigate(&self, route: impl Into<String>) -> bool {
        self.sender.send(route.into()).is_ok()
    }

    /// Stop the watcher after it drains queued events.
    ///
    /// Completes even while senders from [`sender`](Self::sender) are
    /// still alive; their later sends fail and [`navigate`] on a fresh
    /// watcher must be used instead.
    ///
    /// [`navigate`]: Self::navigate
    pub async fn shutdown(self) {
        drop(self.sender);
        self.shutdown.notify_one();
        let _ = self.handle.await;
    }
}

impl std::fmt::Debug for NavigationWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationWatcher")
            .field("running", &!self.handle.is_finished())
            .finish()
    }
}
