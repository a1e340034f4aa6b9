// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors that abort the launch sequence.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the launch sequence.
///
/// A missing activation resource is a silent skip, never an error; a probe
/// that times out is reported through
/// [`WaitOutcome`](crate::readiness::WaitOutcome) rather than here.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The launch root could not be resolved.
    #[error("failed to resolve launch root: {0}")]
    Root(#[source] std::io::Error),

    /// The launch root exists but could not be entered.
    #[error("failed to enter {path}: {source}")]
    Chdir {
        /// Directory that could not be entered.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The server process could not be spawned.
    #[error("failed to spawn server command '{command}': {source}")]
    Spawn {
        /// Command that failed to spawn.
        command: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The target URL could not be used for probing.
    #[error("invalid target URL '{url}': {reason}")]
    BadUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The browser opener could not be spawned.
    #[error("failed to open browser for {url}: {source}")]
    Browser {
        /// URL that was being opened.
        url: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// `launchpad.toml` was present but unusable.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}
