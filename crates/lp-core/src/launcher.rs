// SPDX-License-Identifier: MIT OR Apache-2.0
//! The launch sequence.

use crate::activate;
use crate::browser;
use crate::config::Config;
use crate::error::LaunchError;
use crate::plan::{LaunchPlan, PlanOverrides};
use crate::readiness::{self, WaitOutcome};
use crate::spawn;
use crate::workdir;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Result of a completed launch sequence.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchReport {
    /// Resolved launch root.
    pub root: PathBuf,
    /// URL handed to the browser.
    pub url: String,
    /// Pid of the spawned server, if the OS reported one.
    pub pid: Option<u32>,
    /// Whether a virtualenv activation was applied.
    pub activated: bool,
    /// Outcome of the wait step.
    #[serde(flatten)]
    pub wait: WaitOutcome,
    /// Whether the browser opener was spawned.
    pub browser_opened: bool,
    /// Wall-clock duration of the whole sequence.
    pub elapsed_ms: u64,
}

/// Runs the launch steps in order: enter the root, detect activation, spawn
/// the server detached, wait, open the browser. Linear, no retries; one
/// optional branch (activation).
#[derive(Debug)]
pub struct Launcher {
    root: PathBuf,
    plan: LaunchPlan,
}

impl Launcher {
    /// Resolve the root, merge any `launchpad.toml` found there, and fold in
    /// the caller's overrides. Nothing is executed yet.
    pub fn prepare(root: Option<&Path>, overrides: &PlanOverrides) -> Result<Self, LaunchError> {
        let root = workdir::resolve_root(root)?;
        let mut plan = LaunchPlan::default();
        if let Some(config) = Config::load(&root)? {
            config.apply(&mut plan)?;
        }
        overrides.apply(&mut plan);
        plan.root = Some(root.clone());
        Ok(Self { root, plan })
    }

    /// The effective plan after config and override resolution.
    pub fn plan(&self) -> &LaunchPlan {
        &self.plan
    }

    /// Execute the sequence.
    pub async fn run(self) -> Result<LaunchReport, LaunchError> {
        let started = Instant::now();
        let Self { root, plan } = self;

        workdir::enter_root(&root)?;

        let patch = plan
            .activate
            .as_deref()
            .and_then(|dir| activate::detect(&root, dir));
        let activated = patch.is_some();

        let child = spawn::spawn_detached(&plan.server, patch.as_ref())?;

        let wait = readiness::wait_until_ready(&plan.url, &plan.wait).await?;
        if wait == WaitOutcome::TimedOut {
            warn!(
                target: "lp",
                "server at {} is not ready; opening the browser anyway", plan.url
            );
        }

        let browser_opened = if plan.open_browser {
            browser::open(&plan.url)?;
            true
        } else {
            false
        };

        let report = LaunchReport {
            root,
            url: plan.url,
            pid: child.pid,
            activated,
            wait,
            browser_opened,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(target: "lp", "launch complete in {} ms", report.elapsed_ms);
        Ok(report)
    }
}
