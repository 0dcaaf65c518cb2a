// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Last-value cache backing periodic replay.
//!
//! Vitals arrive rarely, so an exporter that only sees live samples shows
//! gaps. The cache keeps the most recent successfully recorded value per
//! kind and the replay pass re-emits whatever is cached.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::{Attributes, VitalKind};

/// One cached vital ready for replay.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedVital {
    /// Value as it was recorded.
    pub value: f64,

    /// Attributes as recorded, without the replay marker.
    pub attributes: Attributes,
}

/// Most recent recorded value per vital kind.
#[derive(Debug, Default)]
pub struct LastValueCache {
    entries: Mutex<HashMap<VitalKind, CachedVital>>,
}

impl LastValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the latest value for a kind, replacing any previous entry.
    pub fn insert(&self, kind: VitalKind, value: f64, attributes: Attributes) {
        self.entries
            .lock()
            .unwrap()
            .insert(kind, CachedVital { value, attributes });
    }

    /// Fetch the cached entry for a kind.
    pub fn get(&self, kind: VitalKind) -> Option<CachedVital> {
        self.entries.lock().unwrap().get(&kind).cloned()
    }

    /// Take every entry out of the cache, sorted by kind.
    ///
    /// Replay drains first and restores what it could not re-record, so a
    /// value is re-emitted at most once per cycle.
    pub fn drain(&self) -> Vec<(VitalKind, CachedVital)> {
        let mut drained: Vec<_> = self.entries.lock().unwrap().drain().collect();
        drained.sort_by_key(|(kind, _)| *kind);
        drained
    }

    /// Put a drained entry back unless a fresher value arrived meanwhile.
    pub fn restore(&self, kind: VitalKind, entry: CachedVital) {
        self.entries.lock().unwrap().entry(kind).or_insert(entry);
    }

    /// Number of cached kinds.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Check whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(name: &str) -> Attributes {
        Attributes::new().with("metric.name", name)
    }

    #[test]
    fn test_insert_replaces_previous_value() {
        let cache = LastValueCache::new();
        cache.insert(VitalKind::LargestContentfulPaint, 2000.0, attrs("largest-contentful-paint"));
        cache.insert(VitalKind::LargestContentfulPaint, 2400.0, attrs("largest-contentful-paint"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(VitalKind::LargestContentfulPaint).unwrap().value, 2400.0);
    }

    #[test]
    fn test_drain_empties_and_sorts() {
        let cache = LastValueCache::new();
        cache.insert(VitalKind::LayoutShift, 0.05, attrs("layout-shift"));
        cache.insert(VitalKind::TimeToFirstByte, 420.0, attrs("time-to-first-byte"));

        let drained = cache.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].0, VitalKind::LayoutShift);
        assert_eq!(drained[1].0, VitalKind::TimeToFirstByte);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_restore_keeps_fresher_entry() {
        let cache = LastValueCache::new();
        cache.insert(VitalKind::InteractionLatency, 180.0, attrs("interaction-latency"));
        let drained = cache.drain();

        cache.insert(VitalKind::InteractionLatency, 90.0, attrs("interaction-latency"));
        for (kind, entry) in drained {
            cache.restore(kind, entry);
        }

        assert_eq!(cache.get(VitalKind::InteractionLatency).unwrap().value, 90.0);
    }

    #[test]
    fn test_restore_fills_empty_slot() {
        let cache = LastValueCache::new();
        cache.insert(VitalKind::FirstContentfulPaint, 900.0, attrs("first-contentful-paint"));
        let drained = cache.drain();

        for (kind, entry) in drained {
            cache.restore(kind, entry);
        }

        assert_eq!(cache.get(VitalKind::FirstContentfulPaint).unwrap().value, 900.0);
    }
}
