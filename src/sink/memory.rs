// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-memory sink for tests and the demo report.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::SinkError;
use crate::types::Attributes;

use super::{CounterHandle, HistogramHandle, InstrumentSpec, MetricsSink};

/// One captured measurement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedMeasurement {
    /// Instrument the measurement was recorded on.
    pub instrument: String,

    /// Recorded value. Counter additions are captured as `f64` too.
    pub value: f64,

    /// Attributes attached to the measurement.
    pub attributes: Attributes,

    /// Wall-clock capture time.
    pub recorded_at: DateTime<Utc>,
}

#[derive(Default)]
struct MemorySinkInner {
    measurements: Mutex<Vec<RecordedMeasurement>>,
    instruments: Mutex<Vec<InstrumentSpec>>,
}

/// A sink that keeps every measurement in memory.
///
/// Clones share storage, so a test can hand one clone to the recorder and
/// inspect through another. Non-finite values are rejected at the handle,
/// which makes this sink useful for exercising failure paths as well.
#[derive(Clone, Default)]
pub struct MemorySink {
    inner: Arc<MemorySinkInner>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, instrument: &str, value: f64, attributes: &Attributes) -> Result<(), SinkError> {
        if !value.is_finite() {
            return Err(SinkError::InvalidMeasurement {
                instrument: instrument.to_string(),
                message: format!("non-finite value {value}"),
            });
        }
        self.inner.measurements.lock().unwrap().push(RecordedMeasurement {
            instrument: instrument.to_string(),
            value,
            attributes: attributes.clone(),
            recorded_at: Utc::now(),
        });
        Ok(())
    }

    /// All captured measurements, in record order.
    pub fn measurements(&self) -> Vec<RecordedMeasurement> {
        self.inner.measurements.lock().unwrap().clone()
    }

    /// Measurements captured on one instrument.
    pub fn for_instrument(&self, instrument: &str) -> Vec<RecordedMeasurement> {
        self.inner
            .measurements
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.instrument == instrument)
            .cloned()
            .collect()
    }

    /// Number of measurements captured on one instrument.
    pub fn count_for(&self, instrument: &str) -> usize {
        self.inner
            .measurements
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.instrument == instrument)
            .count()
    }

    /// Values captured on one instrument, in record order.
    pub fn values_for(&self, instrument: &str) -> Vec<f64> {
        self.inner
            .measurements
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.instrument == instrument)
            .map(|m| m.value)
            .collect()
    }

    /// Specs of every instrument created on this sink.
    pub fn instruments(&self) -> Vec<InstrumentSpec> {
        self.inner.instruments.lock().unwrap().clone()
    }

    /// Drop all captured measurements. Instrument specs are kept.
    pub fn clear(&self) {
        self.inner.measurements.lock().unwrap().clear();
    }

    /// Render a plain-text report of captured measurements, grouped by
    /// instrument name.
    pub fn format_report(&self) -> String {
        let measurements = self.inner.measurements.lock().unwrap();

        let mut report = String::from("=== webpulse measurements ===\n");
        if measurements.is_empty() {
            report.push_str("\n(none recorded)\n");
            return report;
        }

        let mut grouped: BTreeMap<&str, Vec<&RecordedMeasurement>> = BTreeMap::new();
        for measurement in measurements.iter() {
            grouped.entry(&measurement.instrument).or_default().push(measurement);
        }

        for (instrument, entries) in grouped {
            report.push_str(&format!("\n{} ({} recorded)\n", instrument, entries.len()));
            for entry in entries {
                report.push_str(&format!("  {:.2} {{{}}}\n", entry.value, entry.attributes.render()));
            }
        }
        report
    }
}

impl std::fmt::Debug for MemorySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySink")
            .field("measurements", &self.inner.measurements.lock().unwrap().len())
            .field("instruments", &self.inner.instruments.lock().unwrap().len())
            .finish()
    }
}

impl MetricsSink for MemorySink {
    fn create_histogram(&self, spec: InstrumentSpec) -> Result<Arc<dyn HistogramHandle>, SinkError> {
        let name = spec.name.clone();
        self.inner.instruments.lock().unwrap().push(spec);
        Ok(Arc::new(MemoryHistogram {
            sink: self.clone(),
            name,
        }))
    }

    fn create_counter(&self, spec: InstrumentSpec) -> Result<Arc<dyn CounterHandle>, SinkError> {
        let name = spec.name.clone();
        self.inner.instruments.lock().unwrap().push(spec);
        Ok(Arc::new(MemoryCounter {
            sink: self.clone(),
            name,
        }))
    }
}

struct MemoryHistogram {
    sink: MemorySink,
    name: String,
}

impl HistogramHandle for MemoryHistogram {
    fn record(&self, value: f64, attributes: &Attributes) -> Result<(), SinkError> {
        self.sink.push(&self.name, value, attributes)
    }
}

struct MemoryCounter {
    sink: MemorySink,
    name: String,
}

impl CounterHandle for MemoryCounter {
    fn add(&self, value: u64, attributes: &Attributes) -> Result<(), SinkError> {
        self.sink.push(&self.name, value as f64, attributes)
    }
}
