// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files and the environment.
//!
//! Handles loading configuration from JSON and YAML files in the
//! workspace and from `WEBPULSE_*` environment variables.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::RecorderOverrides;

/// Config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &[
    ".webpulse.json",
    ".webpulse/config.json",
    "webpulse.config.json",
    ".webpulse.yaml",
];

/// Environment variable overriding the service name.
pub const ENV_SERVICE_NAME: &str = "WEBPULSE_SERVICE_NAME";

/// Environment variable overriding the replay cadence, in milliseconds.
pub const ENV_REPLAY_INTERVAL_MS: &str = "WEBPULSE_REPLAY_INTERVAL_MS";

/// Environment variable toggling emission logging.
pub const ENV_LOG_MEASUREMENTS: &str = "WEBPULSE_LOG_MEASUREMENTS";

/// Environment variable toggling endpoint tracking.
pub const ENV_TRACK_ENDPOINTS: &str = "WEBPULSE_TRACK_ENDPOINTS";

/// Load workspace configuration from the workspace root.
///
/// Searches for config files in the following order:
/// 1. .webpulse.json
/// 2. .webpulse/config.json
/// 3. webpulse.config.json
/// 4. .webpulse.yaml
pub fn load_workspace_config(
    workspace_root: &Path,
) -> Result<Option<RecorderOverrides>, ConfigError> {
    for filename in CONFIG_FILES {
        let path = workspace_root.join(filename);
        if path.exists() {
            return load_config_file(&path).map(Some);
        }
    }
    Ok(None)
}

/// Load a configuration file (JSON or YAML).
pub fn load_config_file(path: &Path) -> Result<RecorderOverrides, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(ConfigError::from),
        _ => serde_json::from_str(&content).map_err(ConfigError::from),
    }
}

/// Read overrides from `WEBPULSE_*` environment variables.
pub fn env_overrides() -> Result<RecorderOverrides, ConfigError> {
    read_env_overrides(|name| std::env::var(name).ok())
}

fn read_env_overrides(
    get: impl Fn(&str) -> Option<String>,
) -> Result<RecorderOverrides, ConfigError> {
    let mut overrides = RecorderOverrides::default();

    if let Some(value) = get(ENV_SERVICE_NAME) {
        overrides.service_name = Some(value);
    }
    if let Some(value) = get(ENV_REPLAY_INTERVAL_MS) {
        let parsed = value.parse::<u64>().map_err(|_| {
            ConfigError::invalid_value(
                ENV_REPLAY_INTERVAL_MS,
                format!("expected milliseconds, got {value:?}"),
            )
        })?;
        overrides.replay_interval_ms = Some(parsed);
    }
    if let Some(value) = get(ENV_LOG_MEASUREMENTS) {
        overrides.log_measurements = Some(parse_bool(ENV_LOG_MEASUREMENTS, &value)?);
    }
    if let Some(value) = get(ENV_TRACK_ENDPOINTS) {
        overrides.track_endpoints = Some(parse_bool(ENV_TRACK_ENDPOINTS, &value)?);
    }

    Ok(overrides)
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_value(
            field,
            format!("expected a boolean, got {value:?}"),
        )),
    }
}

/// Save configuration overrides to a file.
pub fn save_config(
    workspace_root: &Path,
    overrides: &RecorderOverrides,
    filename: Option<&str>,
) -> Result<PathBuf, ConfigError> {
    let filename = filename.unwrap_or(".webpulse.json");
    let path = workspace_root.join(filename);

    let content = serde_json::to_string_pretty(overrides)?;
    std::fs::write(&path, content)?;

    Ok(path)
}

/// Initialize a new config file with an example configuration.
pub fn init_config(workspace_root: &Path) -> Result<PathBuf, ConfigError> {
    save_config(workspace_root, &example_overrides(), None)
}

/// Find the workspace root by searching for config files.
///
/// Walks up the directory tree from `start` until it finds a directory
/// containing a config file or reaches the filesystem root.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        for filename in CONFIG_FILES {
            if current.join(filename).exists() {
                return Some(current);
            }
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

/// Get an example configuration.
pub fn example_overrides() -> RecorderOverrides {
    RecorderOverrides {
        service_name: Some("frontend".to_string()),
        replay_interval_ms: Some(5000),
        log_measurements: Some(true),
        track_endpoints: Some(true),
        ..Default::default()
    }
}
