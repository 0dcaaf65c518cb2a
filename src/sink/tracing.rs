// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Sink that emits measurements as structured log events.

use std::sync::Arc;

use tracing::info;

use crate::error::SinkError;
use crate::types::Attributes;

use super::{CounterHandle, HistogramHandle, InstrumentSpec, MetricsSink};

/// Log target for measurement events, filterable independently of the
/// rest of the crate's logging.
pub const MEASUREMENT_TARGET: &str = "webpulse::measure";

/// A sink that logs every measurement through `tracing`.
///
/// This is the default sink. It never fails, which makes it a safe
/// stand-in when no exporter is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl MetricsSink for TracingSink {
    fn create_histogram(&self, spec: InstrumentSpec) -> Result<Arc<dyn HistogramHandle>, SinkError> {
        Ok(Arc::new(TracingHistogram { name: spec.name }))
    }

    fn create_counter(&self, spec: InstrumentSpec) -> Result<Arc<dyn CounterHandle>, SinkError> {
        Ok(Arc::new(TracingCounter { name: spec.name }))
    }
}

struct TracingHistogram {
    name: String,
}

impl HistogramHandle for TracingHistogram {
    fn record(&self, value: f64, attributes: &Attributes) -> Result<(), SinkError> {
        info!(
            target: MEASUREMENT_TARGET,
            instrument = %self.name,
            value,
            attributes = %attributes.render(),
            "histogram record"
        );
        Ok(())
    }
}

struct TracingCounter {
    name: String,
}

impl CounterHandle for TracingCounter {
    fn add(&self, value: u64, attributes: &Attributes) -> Result<(), SinkError> {
        info!(
            target: MEASUREMENT_TARGET,
            instrument = %self.name,
            value,
            attributes = %attributes.render(),
            "counter add"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_sink_never_fails() {
        let sink = TracingSink::new();
        let histogram = sink
            .create_histogram(InstrumentSpec::new("test.duration", "test"))
            .unwrap();
        let counter = sink
            .create_counter(InstrumentSpec::new("test.requests", "test"))
            .unwrap();

        let attributes = Attributes::new().with("service.name", "frontend");
        assert!(histogram.record(42.0, &attributes).is_ok());
        assert!(histogram.record(f64::NAN, &attributes).is_ok());
        assert!(counter.add(1, &attributes).is_ok());
    }
}
