// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! End-to-end tests for the recorder through its public API.

use std::sync::Arc;
use std::time::Duration;

use webpulse::clock::ManualClock;
use webpulse::error::SinkError;
use webpulse::navigation::{NavigationWatcher, ROUTE_SWITCH_INSTRUMENT};
use webpulse::sink::{
    CounterHandle, HistogramHandle, InstrumentSpec, MemorySink, MetricsSink, SharedSink,
};
use webpulse::types::{Attributes, VitalKind, VitalRating, VitalSample};
use webpulse::vitals::ManualVitalSource;
use webpulse::{FrontendRecorder, RecorderBuilder, RecorderConfig};

fn build_recorder(config: RecorderConfig) -> (FrontendRecorder, MemorySink, ManualClock) {
    let sink = MemorySink::new();
    let clock = ManualClock::new();
    let recorder = RecorderBuilder::new()
        .config(config)
        .sink(Arc::new(sink.clone()))
        .clock(Arc::new(clock.clone()))
        .build()
        .expect("recorder should build");
    (recorder, sink, clock)
}

fn quiet_config() -> RecorderConfig {
    RecorderConfig {
        log_measurements: false,
        ..Default::default()
    }
}

fn replay_count(sink: &MemorySink, instrument: &str) -> usize {
    sink.for_instrument(instrument)
        .iter()
        .filter(|m| m.attributes.contains_key("replay"))
        .count()
}

// ============================================================================
// Route Switch Flow Tests
// ============================================================================

#[test]
fn test_initial_navigation_records_duration_and_routes() {
    let (recorder, sink, clock) = build_recorder(quiet_config());

    recorder.start_route_switch("/db");
    clock.advance_millis(120);
    recorder.complete_route_switch();

    let recorded = sink.for_instrument(ROUTE_SWITCH_INSTRUMENT);
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].value, 120.0);
    assert_eq!(recorded[0].attributes.get_str("route.from").as_deref(), Some("initial"));
    assert_eq!(recorded[0].attributes.get_str("route.to").as_deref(), Some("/db"));
    assert_eq!(recorded[0].attributes.get_str("service.name").as_deref(), Some("frontend"));
}

#[test]
fn test_unmatched_complete_records_nothing() {
    let (recorder, sink, _clock) = build_recorder(quiet_config());

    recorder.complete_route_switch();
    assert_eq!(sink.count_for(ROUTE_SWITCH_INSTRUMENT), 0);
}

#[test]
fn test_double_complete_records_once() {
    let (recorder, sink, clock) = build_recorder(quiet_config());

    recorder.start_route_switch("/db");
    clock.advance_millis(30);
    recorder.complete_route_switch();
    recorder.complete_route_switch();

    assert_eq!(sink.count_for(ROUTE_SWITCH_INSTRUMENT), 1);
}

#[test]
fn test_interrupted_navigation_measures_latest_target() {
    let (recorder, sink, clock) = build_recorder(quiet_config());

    recorder.start_route_switch("/a");
    clock.advance_millis(200);
    recorder.start_route_switch("/b");
    clock.advance_millis(40);
    recorder.complete_route_switch();

    let recorded = sink.for_instrument(ROUTE_SWITCH_INSTRUMENT);
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].value, 40.0);
    assert_eq!(recorded[0].attributes.get_str("route.from").as_deref(), Some("/a"));
    assert_eq!(recorded[0].attributes.get_str("route.to").as_deref(), Some("/b"));

    let state = recorder.navigation_state();
    assert_eq!(state.current_route.as_deref(), Some("/b"));
    assert_eq!(state.previous_route.as_deref(), Some("/a"));
}

#[test]
fn test_custom_service_name_flows_to_attributes() {
    let (recorder, sink, clock) = build_recorder(RecorderConfig {
        service_name: "admin-portal".to_string(),
        log_measurements: false,
        ..Default::default()
    });

    recorder.start_route_switch("/users");
    clock.advance_millis(10);
    recorder.complete_route_switch();

    let recorded = sink.for_instrument(ROUTE_SWITCH_INSTRUMENT);
    assert_eq!(
        recorded[0].attributes.get_str("service.name").as_deref(),
        Some("admin-portal")
    );
}

#[test]
fn test_route_switch_histogram_carries_bucket_advice() {
    let (_recorder, sink, _clock) = build_recorder(quiet_config());

    let spec = sink
        .instruments()
        .into_iter()
        .find(|spec| spec.name == ROUTE_SWITCH_INSTRUMENT)
        .expect("route switch instrument registered");
    let boundaries = spec.boundaries.expect("bucket advice present");
    assert_eq!(boundaries.first(), Some(&10.0));
    assert_eq!(boundaries.last(), Some(&5000.0));
    assert!(boundaries.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn test_watcher_drives_recorder_switches() {
    let (recorder, sink, clock) = build_recorder(quiet_config());

    let watcher = NavigationWatcher::spawn(recorder.route_tracker());
    assert!(watcher.navigate("/db"));
    watcher.shutdown().await;

    clock.advance_millis(75);
    recorder.page_render_tracker().record_render();

    let recorded = sink.for_instrument(ROUTE_SWITCH_INSTRUMENT);
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].value, 75.0);
    assert_eq!(recorded[0].attributes.get_str("route.to").as_deref(), Some("/db"));
}

// ============================================================================
// Vitals Flow Tests
// ============================================================================

#[test]
fn test_threshold_ratings_derived_from_value() {
    let (recorder, sink, _clock) = build_recorder(quiet_config());

    for value in [2000.0, 3000.0, 5000.0] {
        recorder.record_vital(&VitalSample::new(VitalKind::LargestContentfulPaint, value));
    }

    let recorded = sink.for_instrument("frontend.web_vitals.lcp_milliseconds");
    let ratings: Vec<_> = recorded
        .iter()
        .map(|m| m.attributes.get_str("threshold.rating").unwrap())
        .collect();
    assert_eq!(ratings, vec!["good", "needs-improvement", "poor"]);
}

#[test]
fn test_source_rating_kept_but_threshold_rating_still_derived() {
    let (recorder, sink, _clock) = build_recorder(quiet_config());

    recorder.record_vital(
        &VitalSample::new(VitalKind::TimeToFirstByte, 2500.0).with_rating(VitalRating::Good),
    );

    let recorded = sink.for_instrument("frontend.web_vitals.ttfb_milliseconds");
    assert_eq!(recorded[0].attributes.get_str("metric.rating").as_deref(), Some("good"));
    assert_eq!(recorded[0].attributes.get_str("threshold.rating").as_deref(), Some("poor"));
}

#[test]
fn test_replay_tick_reemits_then_empties() {
    let (recorder, sink, _clock) = build_recorder(quiet_config());

    recorder.record_vital(&VitalSample::new(VitalKind::LayoutShift, 0.07));
    recorder.record_vital(&VitalSample::new(VitalKind::FirstContentfulPaint, 1500.0));
    assert_eq!(recorder.cached_vital(VitalKind::LayoutShift), Some(0.07));

    assert_eq!(recorder.replay_tick(), 2);
    assert_eq!(recorder.replay_tick(), 0);

    assert_eq!(replay_count(&sink, "frontend.web_vitals.cls_score"), 1);
    assert_eq!(replay_count(&sink, "frontend.web_vitals.fcp_milliseconds"), 1);
}

#[test]
fn test_attached_source_records_each_sample_once() {
    let (recorder, sink, _clock) = build_recorder(quiet_config());
    let source = ManualVitalSource::new();

    assert!(recorder.attach_vital_source(&source));
    assert!(!recorder.attach_vital_source(&source));

    source.emit(VitalSample::new(VitalKind::InteractionLatency, 90.0));
    source.emit(VitalSample::new(VitalKind::InteractionLatency, 110.0));

    assert_eq!(sink.count_for("frontend.web_vitals.inp_milliseconds"), 2);
    assert_eq!(recorder.cached_vital(VitalKind::InteractionLatency), Some(110.0));
}

// ============================================================================
// Replay Scheduler Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_replay_task_follows_configured_cadence() {
    let (recorder, sink, _clock) = build_recorder(quiet_config());

    recorder.record_vital(&VitalSample::new(VitalKind::LargestContentfulPaint, 2100.0));
    assert!(recorder.start_replay());

    tokio::time::sleep(Duration::from_millis(5100)).await;
    assert_eq!(replay_count(&sink, "frontend.web_vitals.lcp_milliseconds"), 1);

    // Nothing cached, so later ticks stay silent until a new sample lands.
    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(replay_count(&sink, "frontend.web_vitals.lcp_milliseconds"), 1);

    recorder.record_vital(&VitalSample::new(VitalKind::LargestContentfulPaint, 2400.0));
    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(replay_count(&sink, "frontend.web_vitals.lcp_milliseconds"), 2);

    recorder.stop_replay();
    recorder.record_vital(&VitalSample::new(VitalKind::LargestContentfulPaint, 2600.0));
    tokio::time::sleep(Duration::from_millis(10000)).await;
    assert_eq!(replay_count(&sink, "frontend.web_vitals.lcp_milliseconds"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_replay_interval_is_configurable() {
    let (recorder, sink, _clock) = build_recorder(RecorderConfig {
        replay_interval_ms: 1000,
        log_measurements: false,
        ..Default::default()
    });

    recorder.record_vital(&VitalSample::new(VitalKind::TimeToFirstByte, 300.0));
    recorder.start_replay();

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(replay_count(&sink, "frontend.web_vitals.ttfb_milliseconds"), 1);

    recorder.stop_replay();
}

// ============================================================================
// Endpoint Flow Tests
// ============================================================================

#[test]
fn test_endpoint_calls_through_facade() {
    let (recorder, sink, _clock) = build_recorder(quiet_config());
    let metrics = recorder.endpoint_metrics().expect("endpoint tracking enabled");

    recorder.start_route_switch("/db");
    metrics.record(
        Duration::from_millis(42),
        &webpulse::EndpointCall::new("/api/query", "POST")
            .with_status(200)
            .with_success(true),
    );
    metrics.record(
        Duration::from_millis(180),
        &webpulse::EndpointCall::new("/api/query", "POST").with_status(500),
    );

    assert_eq!(sink.count_for("frontend.endpoint.requests_total"), 2);
    assert_eq!(sink.count_for("frontend.endpoint.errors_total"), 1);

    let durations = sink.for_instrument("frontend.endpoint.duration_milliseconds");
    assert_eq!(durations[0].attributes.get_str("http.route").as_deref(), Some("/db"));
    assert_eq!(durations[1].attributes.get_str("http.status_class").as_deref(), Some("5xx"));
}

#[tokio::test]
async fn test_tracked_client_records_transport_failure() {
    let (recorder, sink, _clock) = build_recorder(quiet_config());
    let metrics = recorder.endpoint_metrics().expect("endpoint tracking enabled");
    recorder.start_route_switch("/db");

    // Port 1 refuses connections, so the request fails before any
    // response exists.
    let client = webpulse::TrackedClient::new(metrics);
    let result = client.get("http://127.0.0.1:1/unreachable").await;
    assert!(result.is_err());

    assert_eq!(sink.count_for("frontend.endpoint.requests_total"), 1);
    assert_eq!(sink.count_for("frontend.endpoint.errors_total"), 1);

    let recorded = sink.for_instrument("frontend.endpoint.errors_total");
    let attributes = &recorded[0].attributes;
    assert_eq!(attributes.get_str("http.endpoint").as_deref(), Some("/unreachable"));
    assert_eq!(attributes.get_str("http.method").as_deref(), Some("GET"));
    assert_eq!(attributes.get_str("http.route").as_deref(), Some("/db"));
    assert_eq!(attributes.get_str("request.success").as_deref(), Some("false"));
    assert!(!attributes.contains_key("http.status_code"));
    assert!(!attributes.contains_key("http.status_class"));
}

#[test]
fn test_endpoint_tracking_can_be_disabled() {
    let (recorder, sink, _clock) = build_recorder(RecorderConfig {
        track_endpoints: false,
        log_measurements: false,
        ..Default::default()
    });

    assert!(recorder.endpoint_metrics().is_none());
    assert!(sink
        .instruments()
        .iter()
        .all(|spec| !spec.name.starts_with("frontend.endpoint.")));
}

// ============================================================================
// Fail-open Tests
// ============================================================================

struct AlwaysFailSink;

struct AlwaysFailHistogram {
    name: String,
}

impl HistogramHandle for AlwaysFailHistogram {
    fn record(&self, _value: f64, _attributes: &Attributes) -> Result<(), SinkError> {
        Err(SinkError::record(&self.name, "exporter down"))
    }
}

struct AlwaysFailCounter {
    name: String,
}

impl CounterHandle for AlwaysFailCounter {
    fn add(&self, _value: u64, _attributes: &Attributes) -> Result<(), SinkError> {
        Err(SinkError::record(&self.name, "exporter down"))
    }
}

impl MetricsSink for AlwaysFailSink {
    fn create_histogram(
        &self,
        spec: InstrumentSpec,
    ) -> Result<Arc<dyn HistogramHandle>, SinkError> {
        Ok(Arc::new(AlwaysFailHistogram { name: spec.name }))
    }

    fn create_counter(&self, spec: InstrumentSpec) -> Result<Arc<dyn CounterHandle>, SinkError> {
        Ok(Arc::new(AlwaysFailCounter { name: spec.name }))
    }
}

struct RefusingSink;

impl MetricsSink for RefusingSink {
    fn create_histogram(
        &self,
        spec: InstrumentSpec,
    ) -> Result<Arc<dyn HistogramHandle>, SinkError> {
        Err(SinkError::creation(spec.name, "no instruments here"))
    }

    fn create_counter(&self, spec: InstrumentSpec) -> Result<Arc<dyn CounterHandle>, SinkError> {
        Err(SinkError::creation(spec.name, "no instruments here"))
    }
}

#[test]
fn test_recording_failures_never_panic_and_skip_cache() {
    let sink: SharedSink = Arc::new(AlwaysFailSink);
    let recorder = RecorderBuilder::new()
        .config(quiet_config())
        .sink(sink)
        .build()
        .unwrap();

    recorder.start_route_switch("/db");
    recorder.complete_route_switch();
    recorder.record_vital(&VitalSample::new(VitalKind::LayoutShift, 0.2));
    assert_eq!(recorder.cached_vital(VitalKind::LayoutShift), None);
    assert_eq!(recorder.replay_tick(), 0);

    // The failed completion left the switch pending for a later retry.
    assert!(recorder.navigation_state().route_start.is_some());

    if let Some(metrics) = recorder.endpoint_metrics() {
        metrics.record(
            Duration::from_millis(10),
            &webpulse::EndpointCall::new("/api/x", "GET").with_status(200).with_success(true),
        );
    }
}

#[test]
fn test_instrument_creation_failures_disable_recording() {
    let sink: SharedSink = Arc::new(RefusingSink);
    let recorder = RecorderBuilder::new()
        .config(quiet_config())
        .sink(sink)
        .build()
        .unwrap();

    recorder.start_route_switch("/db");
    recorder.complete_route_switch();
    recorder.record_vital(&VitalSample::new(VitalKind::LargestContentfulPaint, 2000.0));
    assert_eq!(recorder.cached_vital(VitalKind::LargestContentfulPaint), None);
}

// ============================================================================
// Report Tests
// ============================================================================

#[test]
fn test_session_report_snapshot() {
    let (recorder, sink, clock) = build_recorder(quiet_config());

    recorder.start_route_switch("/db");
    clock.advance_millis(120);
    recorder.complete_route_switch();

    recorder.record_vital(
        &VitalSample::new(VitalKind::LargestContentfulPaint, 2300.0).with_route("/db"),
    );
    recorder.replay_tick();

    insta::assert_snapshot!(sink.format_report().trim_end(), @r"
    === webpulse measurements ===

    frontend.navigation.route_switch_milliseconds (1 recorded)
      120.00 {route.from=initial route.to=/db service.name=frontend}

    frontend.web_vitals.lcp_milliseconds (2 recorded)
      2300.00 {http.route=/db metric.name=largest-contentful-paint metric.rating=good navigation.type=navigate service.name=frontend threshold.rating=good}
      2300.00 {http.route=/db metric.name=largest-contentful-paint metric.rating=good navigation.type=navigate replay=true service.name=frontend threshold.rating=good}
    ");
}
