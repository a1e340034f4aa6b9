// SPDX-License-Identifier: MIT OR Apache-2.0
//! Launch plan types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// URL the browser is pointed at unless overridden.
pub const DEFAULT_URL: &str = "http://127.0.0.1:5000";

/// Virtualenv directory probed under the launch root unless overridden.
pub const DEFAULT_VENV_DIR: &str = "venv";

/// Default deadline for the readiness probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Default pause between readiness probe attempts.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(200);

/// Fixed pause used by the delay strategy, the classic three-second wait.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

/// What to spawn: command, args, env, and an optional cwd override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSpec {
    /// Executable command to run.
    pub command: String,
    /// Arguments passed to the command.
    pub args: Vec<String>,
    /// Additional environment variables for the process.
    pub env: BTreeMap<String, String>,
    /// Optional working directory override; defaults to the launch root.
    pub cwd: Option<PathBuf>,
}

impl ServerSpec {
    /// Create a spec with the given command and default (empty) args/env.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }
}

impl Default for ServerSpec {
    fn default() -> Self {
        let mut spec = Self::new("python");
        spec.args = vec!["app.py".to_string()];
        spec
    }
}

/// How to bridge the gap between spawning the server and opening the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum WaitStrategy {
    /// Poll the target address until it accepts a TCP connection or the
    /// deadline passes.
    Probe {
        /// Overall deadline for the probe loop.
        #[serde(with = "duration_millis")]
        timeout: Duration,
        /// Pause between connect attempts.
        #[serde(with = "duration_millis")]
        interval: Duration,
    },
    /// Sleep a fixed duration with no probe of any kind. Race-prone, since
    /// the server may not be listening yet; the probe is the default.
    Delay {
        /// How long to sleep.
        #[serde(with = "duration_millis")]
        duration: Duration,
    },
}

/// Serde helper for `Duration` as milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(val: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        (val.as_millis() as u64).serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(de)?;
        Ok(Duration::from_millis(ms))
    }
}

impl Default for WaitStrategy {
    fn default() -> Self {
        Self::Probe {
            timeout: DEFAULT_PROBE_TIMEOUT,
            interval: DEFAULT_PROBE_INTERVAL,
        }
    }
}

impl WaitStrategy {
    /// Fixed-delay wait with the given duration.
    pub fn delay(duration: Duration) -> Self {
        Self::Delay { duration }
    }
}

/// Fully describes one launch: root, server, activation, wait, and browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchPlan {
    /// Launch root; `None` means "the executable's own directory".
    pub root: Option<PathBuf>,
    /// Server process to spawn.
    pub server: ServerSpec,
    /// Virtualenv directory (relative to the root) probed for an activation
    /// resource; `None` disables activation entirely.
    pub activate: Option<PathBuf>,
    /// Wait strategy between spawn and browser open.
    pub wait: WaitStrategy,
    /// URL opened in the browser and probed for readiness.
    pub url: String,
    /// Whether to open the browser at all.
    pub open_browser: bool,
}

impl Default for LaunchPlan {
    fn default() -> Self {
        Self {
            root: None,
            server: ServerSpec::default(),
            activate: Some(PathBuf::from(DEFAULT_VENV_DIR)),
            wait: WaitStrategy::default(),
            url: DEFAULT_URL.to_string(),
            open_browser: true,
        }
    }
}

/// Caller-supplied overrides folded over defaults and config-file values.
///
/// Unset fields leave the plan untouched, so precedence ends up as
/// flags > `launchpad.toml` > defaults.
#[derive(Debug, Clone, Default)]
pub struct PlanOverrides {
    /// Replacement server command.
    pub command: Option<String>,
    /// Replacement server arguments.
    pub args: Option<Vec<String>>,
    /// Extra environment variables for the server.
    pub env: BTreeMap<String, String>,
    /// Replacement target URL.
    pub url: Option<String>,
    /// Disable virtualenv activation even if the resource exists.
    pub no_activate: bool,
    /// Replacement wait strategy.
    pub wait: Option<WaitStrategy>,
    /// Whether to open the browser.
    pub open_browser: Option<bool>,
}

impl PlanOverrides {
    /// Fold these overrides into `plan`.
    pub fn apply(&self, plan: &mut LaunchPlan) {
        if let Some(command) = &self.command {
            plan.server.command = command.clone();
        }
        if let Some(args) = &self.args {
            plan.server.args = args.clone();
        }
        plan.server
            .env
            .extend(self.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Some(url) = &self.url {
            plan.url = url.clone();
        }
        if self.no_activate {
            plan.activate = None;
        }
        if let Some(wait) = &self.wait {
            plan.wait = wait.clone();
        }
        if let Some(open) = self.open_browser {
            plan.open_browser = open;
        }
    }
}
