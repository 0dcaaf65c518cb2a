// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Fixed rating thresholds for each vital kind.
//!
//! The table mirrors the published Core Web Vitals thresholds. Every
//! exported vital carries a `threshold.rating` derived from it, so
//! dashboards can bucket values consistently even when the sample source
//! reported its own rating.

use crate::types::{VitalKind, VitalRating};

/// Rating boundaries for one vital kind.
///
/// Values at or below `good` rate good; values above `good` and at or
/// below `poor` rate needs-improvement; values above `poor` rate poor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub good: f64,
    pub poor: f64,
}

impl Thresholds {
    /// Rate a value against these boundaries.
    pub fn rate(&self, value: f64) -> VitalRating {
        if value <= self.good {
            VitalRating::Good
        } else if value <= self.poor {
            VitalRating::NeedsImprovement
        } else {
            VitalRating::Poor
        }
    }
}

/// Threshold table for a vital kind.
pub fn thresholds_for(kind: VitalKind) -> Thresholds {
    match kind {
        VitalKind::LargestContentfulPaint => Thresholds {
            good: 2500.0,
            poor: 4000.0,
        },
        VitalKind::InteractionLatency => Thresholds {
            good: 200.0,
            poor: 500.0,
        },
        VitalKind::LayoutShift => Thresholds {
            good: 0.1,
            poor: 0.25,
        },
        VitalKind::FirstContentfulPaint => Thresholds {
            good: 1800.0,
            poor: 3000.0,
        },
        VitalKind::TimeToFirstByte => Thresholds {
            good: 800.0,
            poor: 1800.0,
        },
    }
}

/// Rate a value for a kind using the fixed table.
pub fn rate(kind: VitalKind, value: f64) -> VitalRating {
    thresholds_for(kind).rate(value)
}
