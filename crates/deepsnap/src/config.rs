// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Flattening configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! detect_cycles: true
//! max_depth: 32     # omit for no limit
//! ```
//!
//! Environment overrides: `DEEPSNAP_DETECT_CYCLES` (`1`/`true`/`yes`/`on` or
//! `0`/`false`/`no`/`off`) and `DEEPSNAP_MAX_DEPTH`.

use crate::error::{Error, Result};

#[cfg(feature = "config-loaders")]
use std::{fs, path::Path};

pub const ENV_DETECT_CYCLES: &str = "DEEPSNAP_DETECT_CYCLES";
pub const ENV_MAX_DEPTH: &str = "DEEPSNAP_MAX_DEPTH";

/// Defenses applied while walking a record graph.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "config-loaders",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct FlattenConfig {
    /// Fail with `CycleDetected` when a pointer leads back to a record being copied.
    pub detect_cycles: bool,
    /// Maximum record nesting depth before `DepthExceeded`; unbounded when `None`.
    pub max_depth: Option<usize>,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            detect_cycles: true,
            max_depth: None,
        }
    }
}

impl FlattenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable cycle detection.
    pub fn detect_cycles(mut self, enabled: bool) -> Self {
        self.detect_cycles = enabled;
        self
    }

    /// Set the nesting depth limit.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Defaults overridden by `DEEPSNAP_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable lookup.
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_DETECT_CYCLES) {
            config.detect_cycles = parse_bool(&value).ok_or_else(|| {
                Error::Config(format!("{ENV_DETECT_CYCLES}: invalid boolean '{value}'"))
            })?;
        }
        if let Some(value) = lookup(ENV_MAX_DEPTH) {
            config.max_depth = Some(value.trim().parse().map_err(|e| {
                Error::Config(format!("{ENV_MAX_DEPTH}: invalid depth '{value}': {e}"))
            })?);
        }
        Ok(config)
    }

    /// Parse a YAML document; missing keys keep their defaults.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(format!("Failed to parse YAML: {}", e)))
    }

    /// Load a YAML configuration file.
    #[cfg(feature = "config-loaders")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
