// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Core measurement vocabulary: vital kinds, ratings, samples, and attributes.
//!
//! Everything the recorder exports is described here. Attribute keys and
//! instrument names are a stable contract; dashboards and alerts key on them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Attribute Keys
// ============================================================================

/// Attribute keys attached to exported measurements.
pub mod attr {
    /// Logical service emitting the measurement.
    pub const SERVICE_NAME: &str = "service.name";

    /// Route a navigation started from (`initial` on first load).
    pub const ROUTE_FROM: &str = "route.from";

    /// Route a navigation landed on (`unknown` when never set).
    pub const ROUTE_TO: &str = "route.to";

    /// Kebab-case vital kind.
    pub const METRIC_NAME: &str = "metric.name";

    /// Rating reported by the sample source.
    pub const METRIC_RATING: &str = "metric.rating";

    /// Rating derived from the fixed threshold table.
    pub const THRESHOLD_RATING: &str = "threshold.rating";

    /// How the browser arrived at the page.
    pub const NAVIGATION_TYPE: &str = "navigation.type";

    /// Route that was active when the measurement was taken.
    pub const HTTP_ROUTE: &str = "http.route";

    /// Set to `true` only on re-emitted cached values.
    pub const REPLAY: &str = "replay";

    /// Request path for endpoint measurements.
    pub const HTTP_ENDPOINT: &str = "http.endpoint";

    /// HTTP method for endpoint measurements.
    pub const HTTP_METHOD: &str = "http.method";

    /// Response status code, when a response arrived.
    pub const HTTP_STATUS_CODE: &str = "http.status_code";

    /// Status class in `2xx` form.
    pub const HTTP_STATUS_CLASS: &str = "http.status_class";

    /// Whether an endpoint call is considered successful.
    pub const REQUEST_SUCCESS: &str = "request.success";
}

// ============================================================================
// Vital Kinds and Ratings
// ============================================================================

/// The web-vital kinds the recorder samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VitalKind {
    /// Render time of the largest visible element.
    LargestContentfulPaint,
    /// Latency from user interaction to the next paint.
    InteractionLatency,
    /// Cumulative layout shift score (unitless).
    LayoutShift,
    /// Time until the first content render.
    FirstContentfulPaint,
    /// Time until the first response byte.
    TimeToFirstByte,
}

impl VitalKind {
    /// Every kind, in subscription order.
    pub const ALL: [VitalKind; 5] = [
        Self::TimeToFirstByte,
        Self::FirstContentfulPaint,
        Self::LargestContentfulPaint,
        Self::InteractionLatency,
        Self::LayoutShift,
    ];

    /// Kebab-case name, used as the `metric.name` attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LargestContentfulPaint => "largest-contentful-paint",
            Self::InteractionLatency => "interaction-latency",
            Self::LayoutShift => "layout-shift",
            Self::FirstContentfulPaint => "first-contentful-paint",
            Self::TimeToFirstByte => "time-to-first-byte",
        }
    }

    /// Exported instrument name for this kind.
    pub fn instrument_name(&self) -> &'static str {
        match self {
            Self::LargestContentfulPaint => "frontend.web_vitals.lcp_milliseconds",
            Self::InteractionLatency => "frontend.web_vitals.inp_milliseconds",
            Self::LayoutShift => "frontend.web_vitals.cls_score",
            Self::FirstContentfulPaint => "frontend.web_vitals.fcp_milliseconds",
            Self::TimeToFirstByte => "frontend.web_vitals.ttfb_milliseconds",
        }
    }

    /// Unit of recorded values. Milliseconds except layout shift.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::LayoutShift => "score",
            _ => "ms",
        }
    }

    /// Instrument description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::LargestContentfulPaint => "Largest Contentful Paint (LCP) in milliseconds",
            Self::InteractionLatency => "Interaction to Next Paint (INP) in milliseconds",
            Self::LayoutShift => "Cumulative Layout Shift (CLS) score",
            Self::FirstContentfulPaint => "First Contentful Paint (FCP) in milliseconds",
            Self::TimeToFirstByte => "Time to First Byte (TTFB) in milliseconds",
        }
    }
}

impl fmt::Display for VitalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rating buckets for a vital value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VitalRating {
    Good,
    NeedsImprovement,
    Poor,
}

impl VitalRating {
    /// Kebab-case name, used as attribute values.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::NeedsImprovement => "needs-improvement",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for VitalRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the browser arrived at the page, as reported by the navigation
/// timing API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationType {
    #[default]
    Navigate,
    Reload,
    BackForward,
    BackForwardCache,
    Prerender,
    Restore,
}

impl NavigationType {
    /// Kebab-case name, used as the `navigation.type` attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigate => "navigate",
            Self::Reload => "reload",
            Self::BackForward => "back-forward",
            Self::BackForwardCache => "back-forward-cache",
            Self::Prerender => "prerender",
            Self::Restore => "restore",
        }
    }
}

impl fmt::Display for NavigationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Samples
// ============================================================================

/// One observation delivered by a performance source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSample {
    /// Which vital this observation measures.
    pub kind: VitalKind,

    /// Measured value, in the kind's unit.
    pub value: f64,

    /// Rating reported by the source, if it supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<VitalRating>,

    /// Route that was active when the sample was taken.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    /// Navigation type for the page load that produced the sample.
    #[serde(default)]
    pub navigation_type: NavigationType,
}

impl VitalSample {
    /// Create a sample with just a kind and value.
    pub fn new(kind: VitalKind, value: f64) -> Self {
        Self {
            kind,
            value,
            rating: None,
            route: None,
            navigation_type: NavigationType::Navigate,
        }
    }

    /// Set the source-reported rating.
    pub fn with_rating(mut self, rating: VitalRating) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Set the route the sample was taken on.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Set the navigation type.
    pub fn with_navigation_type(mut self, navigation_type: NavigationType) -> Self {
        self.navigation_type = navigation_type;
        self
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// A single attribute value on a measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => write!(f, "{}", value),
            Self::Int(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
            Self::Bool(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u16> for AttributeValue {
    fn from(value: u16) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Attribute set attached to a measurement.
///
/// Keys are kept sorted so attribute sets render and compare deterministically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttributeValue>);

impl Attributes {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert an attribute, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up an attribute value.
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    /// Look up an attribute rendered as a string.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.0.get(key).map(ToString::to_string)
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }

    /// Render as `key=value` pairs separated by spaces, in key order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(key);
            out.push('=');
            out.push_str(&value.to_string());
        }
        out
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attributes = Self::new();
        for (key, value) in iter {
            attributes.insert(key, value);
        }
        attributes
    }
}

// ============================================================================
// Session Identity
// ============================================================================

/// Identifies one recorder instance in log output.
///
/// When several recorders run side by side (multiple tabs, multiple
/// embedded apps) their log lines carry this id so emissions can be told
/// apart. Never exported as a metric attribute; the attribute schema is
/// closed to keep cardinality bounded.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Abbreviated form used in log lines.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.short())
    }
}
