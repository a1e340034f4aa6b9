// SPDX-License-Identifier: MIT OR Apache-2.0
//! lp-core
//!
//! Launch sequencing for a local web application: resolve the launch root,
//! apply an optional virtualenv activation, spawn the server detached, wait
//! for it to accept connections, then open the default browser.

#![deny(unsafe_code)]

pub mod activate;
pub mod browser;
pub mod config;
pub mod error;
pub mod launcher;
pub mod plan;
pub mod readiness;
pub mod spawn;
pub mod workdir;

pub use activate::EnvPatch;
pub use config::{Config, ConfigError};
pub use error::LaunchError;
pub use launcher::{LaunchReport, Launcher};
pub use plan::{LaunchPlan, PlanOverrides, ServerSpec, WaitStrategy};
pub use readiness::WaitOutcome;
pub use spawn::DetachedChild;
