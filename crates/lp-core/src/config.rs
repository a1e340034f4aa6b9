// SPDX-License-Identifier: MIT OR Apache-2.0
//! Optional `launchpad.toml` configuration.
//!
//! All sections and fields are optional; a missing file means pure defaults.
//! CLI flags are applied after the file, so precedence is
//! flags > file > defaults.

use crate::plan::{
    DEFAULT_DELAY, DEFAULT_PROBE_INTERVAL, DEFAULT_PROBE_TIMEOUT, LaunchPlan, WaitStrategy,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the config file probed at the launch root.
pub const CONFIG_FILE: &str = "launchpad.toml";

/// Errors from loading or applying `launchpad.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// `[wait] strategy` is neither `probe` nor `delay`.
    #[error("invalid wait strategy '{0}' (expected 'probe' or 'delay')")]
    BadStrategy(String),
}

/// Parsed `launchpad.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// `[server]` section.
    #[serde(default)]
    pub server: ServerSection,
    /// `[activate]` section.
    #[serde(default)]
    pub activate: ActivateSection,
    /// `[wait]` section.
    #[serde(default)]
    pub wait: WaitSection,
    /// `[browser]` section.
    #[serde(default)]
    pub browser: BrowserSection,
}

/// `[server]`: what to spawn.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Server command.
    pub command: Option<String>,
    /// Server arguments; replaces the default argument list entirely.
    pub args: Option<Vec<String>>,
    /// Extra environment variables for the server.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// `[activate]`: virtualenv activation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivateSection {
    /// Set to `false` to skip activation even if the resource exists.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Virtualenv directory relative to the launch root.
    pub dir: Option<PathBuf>,
}

impl Default for ActivateSection {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

/// `[wait]`: how to bridge spawn and browser open.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaitSection {
    /// `"probe"` or `"delay"`; unset keeps the current strategy.
    pub strategy: Option<String>,
    /// Probe deadline in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Probe interval in milliseconds.
    pub interval_ms: Option<u64>,
    /// Fixed delay in milliseconds.
    pub delay_ms: Option<u64>,
}

/// `[browser]`: the final step.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrowserSection {
    /// URL opened in the browser and probed for readiness.
    pub url: Option<String>,
    /// Set to `false` to skip opening the browser.
    #[serde(default = "default_true")]
    pub open: bool,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            url: None,
            open: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load `launchpad.toml` from `root` if present.
    pub fn load(root: &Path) -> Result<Option<Self>, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path,
            source,
        })?;
        Ok(Some(config))
    }

    /// Fold this config into `plan`, leaving unset fields untouched.
    pub fn apply(&self, plan: &mut LaunchPlan) -> Result<(), ConfigError> {
        if let Some(command) = &self.server.command {
            plan.server.command = command.clone();
        }
        if let Some(args) = &self.server.args {
            plan.server.args = args.clone();
        }
        plan.server
            .env
            .extend(self.server.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        if !self.activate.enabled {
            plan.activate = None;
        } else if let Some(dir) = &self.activate.dir {
            plan.activate = Some(dir.clone());
        }

        match self.wait.strategy.as_deref() {
            None => {
                if let WaitStrategy::Probe { timeout, interval } = &mut plan.wait {
                    if let Some(ms) = self.wait.timeout_ms {
                        *timeout = Duration::from_millis(ms);
                    }
                    if let Some(ms) = self.wait.interval_ms {
                        *interval = Duration::from_millis(ms);
                    }
                }
            }
            Some("probe") => {
                plan.wait = WaitStrategy::Probe {
                    timeout: self
                        .wait
                        .timeout_ms
                        .map_or(DEFAULT_PROBE_TIMEOUT, Duration::from_millis),
                    interval: self
                        .wait
                        .interval_ms
                        .map_or(DEFAULT_PROBE_INTERVAL, Duration::from_millis),
                };
            }
            Some("delay") => {
                plan.wait = WaitStrategy::Delay {
                    duration: self.wait.delay_ms.map_or(DEFAULT_DELAY, Duration::from_millis),
                };
            }
            Some(other) => return Err(ConfigError::BadStrategy(other.to_string())),
        }

        if let Some(url) = &self.browser.url {
            plan.url = url.clone();
        }
        if !self.browser.open {
            plan.open_browser = false;
        }
        Ok(())
    }
}
