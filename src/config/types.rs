// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! Defines the partial (file/env) and resolved recorder configuration,
//! supporting JSON and YAML formats.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::navigation::ROUTE_SWITCH_BOUNDARIES_MS;

/// Service name used when nothing else is configured.
pub const DEFAULT_SERVICE_NAME: &str = "frontend";

/// Replay cadence used when nothing else is configured. Matches the
/// usual metrics export interval.
pub const DEFAULT_REPLAY_INTERVAL_MS: u64 = 5000;

/// Partial recorder configuration.
///
/// Every field is optional so sources can be layered; unset fields fall
/// through to the next source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderOverrides {
    /// Value of the `service.name` attribute on every measurement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    /// Cadence of cached-vital replay, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_interval_ms: Option<u64>,

    /// Whether each successful emission is also logged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_measurements: Option<bool>,

    /// Whether endpoint call instruments are created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_endpoints: Option<bool>,

    /// Bucket boundaries for the route-switch histogram, ascending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_switch_boundaries: Option<Vec<f64>>,
}

impl RecorderOverrides {
    /// Layer `other` on top of self; set fields in `other` win.
    pub fn merged_with(self, other: RecorderOverrides) -> RecorderOverrides {
        RecorderOverrides {
            service_name: other.service_name.or(self.service_name),
            replay_interval_ms: other.replay_interval_ms.or(self.replay_interval_ms),
            log_measurements: other.log_measurements.or(self.log_measurements),
            track_endpoints: other.track_endpoints.or(self.track_endpoints),
            route_switch_boundaries: other.route_switch_boundaries.or(self.route_switch_boundaries),
        }
    }
}

/// Fully resolved recorder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderConfig {
    /// Value of the `service.name` attribute on every measurement.
    pub service_name: String,

    /// Cadence of cached-vital replay, in milliseconds.
    pub replay_interval_ms: u64,

    /// Whether each successful emission is also logged.
    pub log_measurements: bool,

    /// Whether endpoint call instruments are created.
    pub track_endpoints: bool,

    /// Bucket boundaries for the route-switch histogram, ascending.
    pub route_switch_boundaries: Vec<f64>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            replay_interval_ms: DEFAULT_REPLAY_INTERVAL_MS,
            log_measurements: true,
            track_endpoints: true,
            route_switch_boundaries: ROUTE_SWITCH_BOUNDARIES_MS.to_vec(),
        }
    }
}

impl RecorderConfig {
    /// Resolve a partial configuration against the defaults.
    pub fn from_overrides(overrides: RecorderOverrides) -> Self {
        let defaults = Self::default();
        Self {
            service_name: overrides.service_name.unwrap_or(defaults.service_name),
            replay_interval_ms: overrides
                .replay_interval_ms
                .unwrap_or(defaults.replay_interval_ms),
            log_measurements: overrides.log_measurements.unwrap_or(defaults.log_measurements),
            track_endpoints: overrides.track_endpoints.unwrap_or(defaults.track_endpoints),
            route_switch_boundaries: overrides
                .route_switch_boundaries
                .unwrap_or(defaults.route_switch_boundaries),
        }
    }

    /// Replay cadence as a [`Duration`].
    pub fn replay_interval(&self) -> Duration {
        Duration::from_millis(self.replay_interval_ms)
    }

    /// Reject configurations the recorder cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "serviceName",
                "must not be empty",
            ));
        }
        if self.replay_interval_ms == 0 {
            return Err(ConfigError::invalid_value(
                "replayIntervalMs",
                "must be at least 1",
            ));
        }
        if self
            .route_switch_boundaries
            .windows(2)
            .any(|pair| pair[0] >= pair[1])
        {
            return Err(ConfigError::invalid_value(
                "routeSwitchBoundaries",
                "must be strictly ascending",
            ));
        }
        Ok(())
    }
}
