// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Webpulse - navigation and web-vitals metrics recorder.
//!
//! Records how long route switches take, samples web vitals with
//! threshold ratings, keeps the last value per vital for periodic
//! replay, and tracks endpoint calls. Measurements flow through a
//! pluggable sink so the export pipeline stays out of the recording
//! logic.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`types`] - Core type definitions (VitalKind, VitalSample, Attributes, etc.)
//! - [`error`] - Error types and result aliases
//! - [`config`] - Configuration loading and merging
//! - [`clock`] - Monotonic and manual time sources
//! - [`sink`] - Metrics sink abstraction with memory and tracing backends
//! - [`navigation`] - Route-switch duration tracking
//! - [`vitals`] - Web-vitals sampling, rating, caching, and replay
//! - [`endpoint`] - Endpoint call metrics and a tracked HTTP client
//! - [`recorder`] - The facade tying everything to one sink and clock
//! - [`logging`] - Tracing subscriber setup for binaries and tests
//!
//! # Example
//!
//! ```rust,ignore
//! use webpulse::{RecorderBuilder, VitalKind, VitalSample};
//!
//! let recorder = RecorderBuilder::new().build()?;
//!
//! recorder.start_route_switch("/dashboard");
//! // ... page renders ...
//! recorder.complete_route_switch();
//!
//! recorder.record_vital(&VitalSample::new(VitalKind::LargestContentfulPaint, 2130.0));
//! recorder.start_replay();
//! ```

pub mod clock;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod navigation;
pub mod recorder;
pub mod sink;
pub mod types;
pub mod vitals;

// Re-export commonly used types at crate root
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{resolve_config, RecorderConfig, RecorderOverrides};
pub use endpoint::{EndpointCall, EndpointMetrics, TrackedClient};
pub use error::{ConfigError, RecorderError, Result, SinkError};
pub use navigation::{NavigationWatcher, PageRenderTracker, RouteSwitchTracker};
pub use recorder::{FrontendRecorder, RecorderBuilder};
pub use sink::{
    CounterHandle, HistogramHandle, InstrumentSpec, MemorySink, MetricsSink, RecordedMeasurement,
    SharedSink, TracingSink,
};
pub use types::{
    Attributes, NavigationType, SessionId, VitalKind, VitalRating, VitalSample,
};
pub use vitals::{ManualVitalSource, ReplayScheduler, VitalSource, VitalsMonitor};

/// Webpulse version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
