// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Logging initialization built on `tracing`.
//!
//! The recorder logs through `tracing` everywhere; this module wires up a
//! subscriber for binaries and tests that want to see those events. Library
//! embedders that already install their own subscriber skip it entirely.

use std::io;

use tracing::Level;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Configuration for logging output.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` and the directive are unset.
    pub default_level: Level,

    /// Include file/line in events.
    pub include_file_line: bool,

    /// Include the event target.
    pub include_target: bool,

    /// Use ANSI colors.
    pub ansi_colors: bool,

    /// Use the compact one-line format.
    pub compact: bool,

    /// Explicit filter directive, overriding `default_level`.
    pub filter_directive: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            include_file_line: false,
            include_target: false,
            ansi_colors: true,
            compact: true,
            filter_directive: None,
        }
    }
}

impl LoggingConfig {
    /// Development preset: verbose, with source locations.
    pub fn development() -> Self {
        Self {
            default_level: Level::DEBUG,
            include_file_line: true,
            include_target: true,
            compact: false,
            ..Default::default()
        }
    }

    /// Production preset: info level, no colors, compact.
    pub fn production() -> Self {
        Self {
            ansi_colors: false,
            ..Default::default()
        }
    }

    /// Testing preset: everything from this crate, nothing else.
    pub fn testing() -> Self {
        Self {
            filter_directive: Some("webpulse=trace".to_string()),
            ansi_colors: false,
            ..Default::default()
        }
    }

    /// Quiet preset: errors only.
    pub fn quiet() -> Self {
        Self {
            default_level: Level::ERROR,
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_filter(mut self, directive: impl Into<String>) -> Self {
        self.filter_directive = Some(directive.into());
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi_colors = ansi;
        self
    }
}

/// Guard returned by [`init_logging`].
///
/// Held for the lifetime of the program; kept so flushing state can be
/// attached here later without changing call sites.
pub struct LoggingGuard {
    _private: (),
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over everything; otherwise the config's directive or
/// default level applies. Fails if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> io::Result<LoggingGuard> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => match &config.filter_directive {
            Some(directive) => EnvFilter::new(directive),
            None => EnvFilter::new(config.default_level.to_string()),
        },
    };

    let fmt_layer = fmt::layer()
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .with_file(config.include_file_line)
        .with_line_number(config.include_file_line);

    if config.compact {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.compact())
            .try_init()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    }

    Ok(LoggingGuard { _private: () })
}
