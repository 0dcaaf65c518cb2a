// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Web-vitals sampling, rating, caching, and replay.
//!
//! [`VitalsMonitor`] owns one histogram per vital kind, rates each sample
//! against the fixed threshold table, and keeps the last successfully
//! recorded value per kind in a [`LastValueCache`]. A [`ReplayScheduler`]
//! re-emits cached values on a fixed cadence so sparse vitals stay visible
//! between page loads.

mod cache;
mod replay;
mod source;
mod thresholds;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::sink::{HistogramHandle, InstrumentSpec, SharedSink};
use crate::types::{attr, Attributes, VitalKind, VitalSample};

pub use self::cache::{CachedVital, LastValueCache};
pub use self::replay::ReplayScheduler;
pub use self::source::{ManualVitalSource, VitalCallback, VitalSource};
pub use self::thresholds::{rate, thresholds_for, Thresholds};

struct MonitorInner {
    histograms: HashMap<VitalKind, Option<Arc<dyn HistogramHandle>>>,
    cache: LastValueCache,
    service_name: String,
    log_measurements: bool,
    source_attached: AtomicBool,
}

/// Records web-vital samples and replays the latest value per kind.
///
/// Cheap to clone; clones share instruments and cache.
#[derive(Clone)]
pub struct VitalsMonitor {
    inner: Arc<MonitorInner>,
}

impl VitalsMonitor {
    /// Create the monitor and its five histograms on the sink.
    ///
    /// A kind whose instrument cannot be created is disabled with a
    /// warning; samples for it are dropped rather than failing the caller.
    pub fn new(sink: &SharedSink, service_name: impl Into<String>, log_measurements: bool) -> Self {
        let mut histograms = HashMap::new();
        for kind in VitalKind::ALL {
            let spec = InstrumentSpec::new(kind.instrument_name(), kind.description())
                .with_unit(kind.unit());
            let handle = match sink.create_histogram(spec) {
                Ok(handle) => Some(handle),
                Err(error) => {
                    warn!(vital = %kind, %error, "failed to create vital instrument");
                    None
                }
            };
            histograms.insert(kind, handle);
        }

        Self {
            inner: Arc::new(MonitorInner {
                histograms,
                cache: LastValueCache::new(),
                service_name: service_name.into(),
                log_measurements,
                source_attached: AtomicBool::new(false),
            }),
        }
    }

    /// Record one sample.
    ///
    /// The cache is updated only after the sink accepted the value, so
    /// replay never re-emits something that was never exported.
    pub fn record_vital(&self, sample: &VitalSample) {
        let Some(Some(histogram)) = self.inner.histograms.get(&sample.kind) else {
            warn!(vital = %sample.kind, "no instrument for vital, dropping sample");
            return;
        };

        let attributes = self.sample_attributes(sample);
        match histogram.record(sample.value, &attributes) {
            Ok(()) => {
                self.inner.cache.insert(sample.kind, sample.value, attributes.clone());
                if self.inner.log_measurements {
                    info!(
                        vital = %sample.kind,
                        value = sample.value,
                        attributes = %attributes.render(),
                        "recorded vital"
                    );
                }
            }
            Err(error) => {
                warn!(vital = %sample.kind, value = sample.value, %error, "failed to record vital");
            }
        }
    }

    fn sample_attributes(&self, sample: &VitalSample) -> Attributes {
        let threshold_rating = thresholds::rate(sample.kind, sample.value);
        let metric_rating = sample.rating.unwrap_or(threshold_rating);

        let mut attributes = Attributes::new()
            .with(attr::SERVICE_NAME, self.inner.service_name.as_str())
            .with(attr::METRIC_NAME, sample.kind.as_str())
            .with(attr::METRIC_RATING, metric_rating.as_str())
            .with(attr::THRESHOLD_RATING, threshold_rating.as_str())
            .with(attr::NAVIGATION_TYPE, sample.navigation_type.as_str());
        if let Some(route) = &sample.route {
            attributes.insert(attr::HTTP_ROUTE, route.as_str());
        }
        attributes
    }

    /// Re-emit every cached value with a `replay=true` marker.
    ///
    /// Returns the number of values re-recorded. Entries that fail to
    /// record go back into the cache unless a fresher value landed while
    /// the tick ran.
    pub fn replay_tick(&self) -> usize {
        let mut replayed = 0;
        for (kind, entry) in self.inner.cache.drain() {
            let Some(Some(histogram)) = self.inner.histograms.get(&kind) else {
                self.inner.cache.restore(kind, entry);
                continue;
            };

            let attributes = entry.attributes.clone().with(attr::REPLAY, "true");
            match histogram.record(entry.value, &attributes) {
                Ok(()) => {
                    replayed += 1;
                    debug!(vital = %kind, value = entry.value, "replayed cached vital");
                }
                Err(error) => {
                    warn!(vital = %kind, %error, "failed to replay cached vital");
                    self.inner.cache.restore(kind, entry);
                }
            }
        }
        replayed
    }

    /// Subscribe this monitor to every vital kind on a source.
    ///
    /// Only the first call attaches; repeated calls are no-ops so samples
    /// are never double-recorded. Returns whether this call attached.
    pub fn attach_source(&self, source: &dyn VitalSource) -> bool {
        if self.inner.source_attached.swap(true, Ordering::SeqCst) {
            debug!("vital source already attached, ignoring");
            return false;
        }

        for kind in VitalKind::ALL {
            let monitor = self.clone();
            let callback: VitalCallback = Arc::new(move |sample| monitor.record_vital(&sample));
            if let Err(error) = source.subscribe(kind, callback) {
                warn!(vital = %kind, %error, "failed to subscribe to vital source");
            }
        }
        true
    }

    /// Number of kinds with a cached value.
    pub fn cached_count(&self) -> usize {
        self.inner.cache.len()
    }

    /// Cached value for a kind, if any.
    pub fn cached_value(&self, kind: VitalKind) -> Option<f64> {
        self.inner.cache.get(kind).map(|entry| entry.value)
    }
}

impl std::fmt::Debug for VitalsMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VitalsMonitor")
            .field("service_name", &self.inner.service_name)
            .field("cached", &self.inner.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::sink::{CounterHandle, MemorySink, MetricsSink, MockHistogramHandle};
    use crate::types::{NavigationType, VitalRating};
    use mockall::Sequence;

    fn monitor_with_memory() -> (VitalsMonitor, MemorySink) {
        let sink = MemorySink::new();
        let shared: SharedSink = Arc::new(sink.clone());
        (VitalsMonitor::new(&shared, "frontend", false), sink)
    }

    #[test]
    fn test_record_attaches_full_attribute_set() {
        let (monitor, sink) = monitor_with_memory();

        monitor.record_vital(
            &VitalSample::new(VitalKind::LargestContentfulPaint, 3000.0)
                .with_rating(VitalRating::Good)
                .with_route("/checkout")
                .with_navigation_type(NavigationType::Reload),
        );

        let recorded = sink.for_instrument("frontend.web_vitals.lcp_milliseconds");
        assert_eq!(recorded.len(), 1);
        let attributes = &recorded[0].attributes;
        assert_eq!(attributes.get_str("service.name").as_deref(), Some("frontend"));
        assert_eq!(attributes.get_str("metric.name").as_deref(), Some("largest-contentful-paint"));
        assert_eq!(attributes.get_str("metric.rating").as_deref(), Some("good"));
        assert_eq!(attributes.get_str("threshold.rating").as_deref(), Some("needs-improvement"));
        assert_eq!(attributes.get_str("navigation.type").as_deref(), Some("reload"));
        assert_eq!(attributes.get_str("http.route").as_deref(), Some("/checkout"));
        assert!(!attributes.contains_key("replay"));
    }

    #[test]
    fn test_rating_falls_back_to_thresholds() {
        let (monitor, sink) = monitor_with_memory();

        monitor.record_vital(&VitalSample::new(VitalKind::InteractionLatency, 650.0));

        let recorded = sink.for_instrument("frontend.web_vitals.inp_milliseconds");
        assert_eq!(recorded[0].attributes.get_str("metric.rating").as_deref(), Some("poor"));
        assert_eq!(recorded[0].attributes.get_str("threshold.rating").as_deref(), Some("poor"));
    }

    #[test]
    fn test_route_attribute_is_conditional() {
        let (monitor, sink) = monitor_with_memory();

        monitor.record_vital(&VitalSample::new(VitalKind::TimeToFirstByte, 420.0));

        let recorded = sink.for_instrument("frontend.web_vitals.ttfb_milliseconds");
        assert!(!recorded[0].attributes.contains_key("http.route"));
    }

    #[test]
    fn test_successful_record_updates_cache() {
        let (monitor, _sink) = monitor_with_memory();

        monitor.record_vital(&VitalSample::new(VitalKind::LayoutShift, 0.08));
        assert_eq!(monitor.cached_value(VitalKind::LayoutShift), Some(0.08));

        monitor.record_vital(&VitalSample::new(VitalKind::LayoutShift, 0.31));
        assert_eq!(monitor.cached_value(VitalKind::LayoutShift), Some(0.31));
        assert_eq!(monitor.cached_count(), 1);
    }

    #[test]
    fn test_replay_marks_and_empties() {
        let (monitor, sink) = monitor_with_memory();

        monitor.record_vital(&VitalSample::new(VitalKind::FirstContentfulPaint, 1200.0));
        monitor.record_vital(&VitalSample::new(VitalKind::LayoutShift, 0.02));

        assert_eq!(monitor.replay_tick(), 2);
        assert_eq!(monitor.cached_count(), 0);
        assert_eq!(monitor.replay_tick(), 0);

        let replayed: Vec<_> = sink
            .for_instrument("frontend.web_vitals.fcp_milliseconds")
            .into_iter()
            .filter(|m| m.attributes.contains_key("replay"))
            .collect();
        assert_eq!(replayed.len(), 1);
        assert_eq!(replayed[0].value, 1200.0);
        assert_eq!(replayed[0].attributes.get_str("replay").as_deref(), Some("true"));
        assert_eq!(
            replayed[0].attributes.get_str("metric.name").as_deref(),
            Some("first-contentful-paint")
        );
    }

    struct FixedHandleSink {
        handle: Arc<dyn HistogramHandle>,
    }

    impl MetricsSink for FixedHandleSink {
        fn create_histogram(
            &self,
            _spec: InstrumentSpec,
        ) -> Result<Arc<dyn HistogramHandle>, SinkError> {
            Ok(self.handle.clone())
        }

        fn create_counter(
            &self,
            _spec: InstrumentSpec,
        ) -> Result<Arc<dyn CounterHandle>, SinkError> {
            Err(SinkError::creation("counter", "not supported"))
        }
    }

    #[test]
    fn test_failed_record_leaves_cache_untouched() {
        let mut handle = MockHistogramHandle::new();
        let mut seq = Sequence::new();
        handle
            .expect_record()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(SinkError::record("frontend.web_vitals.cls_score", "exporter down")));
        handle
            .expect_record()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let shared: SharedSink = Arc::new(FixedHandleSink {
            handle: Arc::new(handle),
        });
        let monitor = VitalsMonitor::new(&shared, "frontend", false);

        monitor.record_vital(&VitalSample::new(VitalKind::LayoutShift, 0.2));
        assert_eq!(monitor.cached_count(), 0);

        monitor.record_vital(&VitalSample::new(VitalKind::LayoutShift, 0.2));
        assert_eq!(monitor.cached_value(VitalKind::LayoutShift), Some(0.2));
    }

    #[test]
    fn test_failed_replay_restores_entry() {
        let mut handle = MockHistogramHandle::new();
        let mut seq = Sequence::new();
        // Live record succeeds, replay fails, so the entry must survive.
        handle
            .expect_record()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        handle
            .expect_record()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(SinkError::record("frontend.web_vitals.inp_milliseconds", "exporter down")));

        let shared: SharedSink = Arc::new(FixedHandleSink {
            handle: Arc::new(handle),
        });
        let monitor = VitalsMonitor::new(&shared, "frontend", false);

        monitor.record_vital(&VitalSample::new(VitalKind::InteractionLatency, 140.0));
        assert_eq!(monitor.replay_tick(), 0);
        assert_eq!(monitor.cached_value(VitalKind::InteractionLatency), Some(140.0));
    }

    #[test]
    fn test_attach_source_is_idempotent() {
        let (monitor, sink) = monitor_with_memory();
        let source = ManualVitalSource::new();

        assert!(monitor.attach_source(&source));
        assert!(!monitor.attach_source(&source));
        assert_eq!(source.subscriber_count(VitalKind::LargestContentfulPaint), 1);

        source.emit(VitalSample::new(VitalKind::LargestContentfulPaint, 1800.0));
        assert_eq!(sink.count_for("frontend.web_vitals.lcp_milliseconds"), 1);
    }
}
