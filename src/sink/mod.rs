// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Metrics sink abstraction.
//!
//! The recorder never talks to an exporter directly. It asks a
//! [`MetricsSink`] for instrument handles up front and records through
//! them, so the export pipeline can be swapped without touching any
//! recording logic. Two sinks ship with the crate:
//!
//! - [`MemorySink`] captures measurements for tests and the demo report
//! - [`TracingSink`] emits measurements as structured log events

mod memory;
mod tracing;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SinkError;
use crate::types::Attributes;

pub use self::memory::{MemorySink, RecordedMeasurement};
pub use self::tracing::TracingSink;

/// Everything a sink needs to create one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    /// Dotted instrument name, e.g. `frontend.web_vitals.lcp_milliseconds`.
    pub name: String,

    /// Human-readable description.
    pub description: String,

    /// Unit of recorded values, e.g. `ms`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Explicit histogram bucket boundaries, ascending. Sinks that do not
    /// aggregate may ignore this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundaries: Option<Vec<f64>>,
}

impl InstrumentSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            unit: None,
            boundaries: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_boundaries(mut self, boundaries: Vec<f64>) -> Self {
        self.boundaries = Some(boundaries);
        self
    }
}

/// Handle to a histogram instrument.
#[cfg_attr(test, mockall::automock)]
pub trait HistogramHandle: Send + Sync {
    /// Record one measurement.
    fn record(&self, value: f64, attributes: &Attributes) -> Result<(), SinkError>;
}

/// Handle to a monotonic counter instrument.
#[cfg_attr(test, mockall::automock)]
pub trait CounterHandle: Send + Sync {
    /// Add to the counter.
    fn add(&self, value: u64, attributes: &Attributes) -> Result<(), SinkError>;
}

/// A destination for measurements.
///
/// Instrument creation happens once at recorder construction. Handles are
/// cheap to clone via `Arc` and are used from multiple tasks.
pub trait MetricsSink: Send + Sync {
    /// Create a histogram instrument.
    fn create_histogram(&self, spec: InstrumentSpec) -> Result<Arc<dyn HistogramHandle>, SinkError>;

    /// Create a counter instrument.
    fn create_counter(&self, spec: InstrumentSpec) -> Result<Arc<dyn CounterHandle>, SinkError>;
}

/// Shared sink reference handed to recorder components.
pub type SharedSink = Arc<dyn MetricsSink>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builders() {
        let spec = InstrumentSpec::new("frontend.navigation.route_switch_milliseconds", "Route switch time")
            .with_unit("ms")
            .with_boundaries(vec![10.0, 25.0, 50.0]);

        assert_eq!(spec.unit.as_deref(), Some("ms"));
        assert_eq!(spec.boundaries.as_deref(), Some(&[10.0, 25.0, 50.0][..]));
    }

    #[test]
    fn test_spec_serde_skips_empty_fields() {
        let spec = InstrumentSpec::new("frontend.web_vitals.cls_score", "CLS score");
        let json = serde_json::to_string(&spec).unwrap();
        assert!(!json.contains("unit"));
        assert!(!json.contains("boundaries"));
    }
}
