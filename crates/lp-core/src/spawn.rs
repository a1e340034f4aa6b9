// SPDX-License-Identifier: MIT OR Apache-2.0
//! Detached server spawn.

use crate::activate::EnvPatch;
use crate::error::LaunchError;
use crate::plan::ServerSpec;
use tokio::process::Command;
use tracing::info;

/// Handle to a spawned server.
///
/// Only the pid is retained: the child is never waited on, killed, or
/// otherwise tracked, and it outlives the launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetachedChild {
    /// OS process identifier, if the OS reported one.
    pub pid: Option<u32>,
}

#[cfg(windows)]
const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;

/// Spawn the server as an independent process.
///
/// On Windows the child gets its own console window; on Unix its own process
/// group. Stdio is inherited so the server prints to its own console. At most
/// one child is spawned per invocation and nothing waits on it.
pub fn spawn_detached(
    spec: &ServerSpec,
    patch: Option<&EnvPatch>,
) -> Result<DetachedChild, LaunchError> {
    let mut cmd = Command::new(&spec.command);
    cmd.args(&spec.args);

    if let Some(cwd) = &spec.cwd {
        cmd.current_dir(cwd);
    }
    for (k, v) in &spec.env {
        cmd.env(k, v);
    }
    if let Some(patch) = patch {
        let parent = std::env::var_os("PATH");
        cmd.env("PATH", patch.merged_path(parent.as_deref()));
        cmd.env("VIRTUAL_ENV", &patch.virtual_env);
        for key in &patch.remove {
            cmd.env_remove(key);
        }
    }

    #[cfg(windows)]
    cmd.creation_flags(CREATE_NEW_CONSOLE);
    #[cfg(unix)]
    cmd.process_group(0);

    let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
        command: spec.command.clone(),
        source,
    })?;
    let pid = child.id();
    info!(target: "lp", "spawned '{}' (pid {pid:?})", spec.command);

    // Dropping the handle leaves the process running; kill_on_drop is off.
    drop(child);
    Ok(DetachedChild { pid })
}
