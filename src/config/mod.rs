// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for the recorder.
//!
//! Handles loading, merging, and validation of configuration from
//! multiple sources:
//! - Workspace config: .webpulse.json, .webpulse/config.json,
//!   webpulse.config.json, or .webpulse.yaml
//! - Environment: WEBPULSE_* variables
//! - Programmatic overrides passed by the embedding application
//!
//! Configuration is merged with precedence
//! (programmatic > environment > workspace > defaults).

mod loader;
mod types;

pub use loader::{
    env_overrides, example_overrides, find_workspace_root, init_config, load_config_file,
    load_workspace_config, save_config, CONFIG_FILES, ENV_LOG_MEASUREMENTS,
    ENV_REPLAY_INTERVAL_MS, ENV_SERVICE_NAME, ENV_TRACK_ENDPOINTS,
};

pub use types::{
    RecorderConfig, RecorderOverrides, DEFAULT_REPLAY_INTERVAL_MS, DEFAULT_SERVICE_NAME,
};

use std::path::Path;

use crate::error::ConfigError;

/// Load and merge all configuration sources for a workspace.
///
/// This is the main entry point for configuration loading. The result is
/// validated before it is returned.
pub fn resolve_config(
    workspace_root: &Path,
    overrides: RecorderOverrides,
) -> Result<RecorderConfig, ConfigError> {
    let workspace = load_workspace_config(workspace_root)?.unwrap_or_default();
    let env = env_overrides()?;

    let merged = workspace.merged_with(env).merged_with(overrides);
    let config = RecorderConfig::from_overrides(merged);
    config.validate()?;
    Ok(config)
}
