// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the webpulse recorder.
//!
//! This module provides strongly-typed errors for different parts of the crate,
//! using `thiserror` for ergonomic error definitions and `anyhow` for error propagation.
//!
//! Emit paths never surface these to the host: recording trouble is logged
//! and suppressed. Constructors and the config loader do return them.

use thiserror::Error;

/// Errors surfaced by a metrics sink or one of its instrument handles.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Instrument creation failed for {instrument}: {message}")]
    InstrumentCreation { instrument: String, message: String },

    #[error("Recording failed for {instrument}: {message}")]
    RecordFailed { instrument: String, message: String },

    #[error("Invalid measurement for {instrument}: {message}")]
    InvalidMeasurement { instrument: String, message: String },

    #[error("Sink shut down: {0}")]
    ShutDown(String),
}

impl SinkError {
    /// Create an instrument-creation error.
    pub fn creation(instrument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InstrumentCreation {
            instrument: instrument.into(),
            message: message.into(),
        }
    }

    /// Create a recording failure for the named instrument.
    pub fn record(instrument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordFailed {
            instrument: instrument.into(),
            message: message.into(),
        }
    }

    /// Check if retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RecordFailed { .. })
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl ConfigError {
    /// Create an invalid-value error for a config field.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Errors that can occur while wiring up a recorder.
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Vital source error: {0}")]
    Source(String),
}

impl RecorderError {
    /// Create a vital-source error.
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;
