// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Sample sources the monitor can subscribe to.
//!
//! A real deployment would bridge a browser performance observer here. The
//! crate ships [`ManualVitalSource`] for tests and the demo, where samples
//! are pushed by hand.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::RecorderError;
use crate::types::{VitalKind, VitalSample};

/// Callback invoked with each sample for a subscribed kind.
pub type VitalCallback = Arc<dyn Fn(VitalSample) + Send + Sync>;

/// A source of vital samples.
pub trait VitalSource: Send + Sync {
    /// Register a callback for one vital kind.
    ///
    /// The source may deliver samples from any thread.
    fn subscribe(&self, kind: VitalKind, callback: VitalCallback) -> Result<(), RecorderError>;
}

#[derive(Default)]
struct ManualSourceInner {
    subscribers: Mutex<HashMap<VitalKind, Vec<VitalCallback>>>,
}

/// A source driven by explicit [`emit`](ManualVitalSource::emit) calls.
///
/// Clones share the subscriber table, so the recorder can subscribe
/// through one clone while a test emits through another.
#[derive(Clone, Default)]
pub struct ManualVitalSource {
    inner: Arc<ManualSourceInner>,
}

impl ManualVitalSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a sample to every subscriber of its kind.
    ///
    /// Returns the number of callbacks invoked. Callbacks run outside the
    /// subscriber lock, so one may re-subscribe or emit without deadlock.
    pub fn emit(&self, sample: VitalSample) -> usize {
        let callbacks: Vec<VitalCallback> = {
            let subscribers = self.inner.subscribers.lock().unwrap();
            subscribers
                .get(&sample.kind)
                .map(|callbacks| callbacks.to_vec())
                .unwrap_or_default()
        };

        for callback in &callbacks {
            callback(sample.clone());
        }
        callbacks.len()
    }

    /// Number of callbacks registered for a kind.
    pub fn subscriber_count(&self, kind: VitalKind) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for ManualVitalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscribers = self.inner.subscribers.lock().unwrap();
        f.debug_struct("ManualVitalSource")
            .field("kinds", &subscribers.len())
            .finish()
    }
}

impl VitalSource for ManualVitalSource {
    fn subscribe(&self, kind: VitalKind, callback: VitalCallback) -> Result<(), RecorderError> {
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push(callback);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_reaches_only_matching_kind() {
        let source = ManualVitalSource::new();
        let lcp_hits = Arc::new(AtomicUsize::new(0));

        let hits = lcp_hits.clone();
        source
            .subscribe(
                VitalKind::LargestContentfulPaint,
                Arc::new(move |_| {
                    hits.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        assert_eq!(source.emit(VitalSample::new(VitalKind::LargestContentfulPaint, 2100.0)), 1);
        assert_eq!(source.emit(VitalSample::new(VitalKind::LayoutShift, 0.02)), 0);
        assert_eq!(lcp_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_subscribers() {
        let source = ManualVitalSource::new();
        let emitter = source.clone();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        source
            .subscribe(
                VitalKind::TimeToFirstByte,
                Arc::new(move |sample| {
                    sink.lock().unwrap().push(sample.value);
                }),
            )
            .unwrap();

        emitter.emit(VitalSample::new(VitalKind::TimeToFirstByte, 300.0));
        emitter.emit(VitalSample::new(VitalKind::TimeToFirstByte, 450.0));

        assert_eq!(*seen.lock().unwrap(), vec![300.0, 450.0]);
        assert_eq!(source.subscriber_count(VitalKind::TimeToFirstByte), 1);
    }

    #[test]
    fn test_multiple_subscribers_each_receive() {
        let source = ManualVitalSource::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = count.clone();
            source
                .subscribe(
                    VitalKind::InteractionLatency,
                    Arc::new(move |_| {
                        count.fetch_add(1, Ordering::SeqCst);
                    }),
                )
                .unwrap();
        }

        assert_eq!(source.emit(VitalSample::new(VitalKind::InteractionLatency, 150.0)), 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
