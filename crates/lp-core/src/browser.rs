// SPDX-License-Identifier: MIT OR Apache-2.0
//! Default-browser launch.

use crate::error::LaunchError;
use tokio::process::Command;
use tracing::info;

/// Spawn the platform opener for `url`, fire-and-forget.
///
/// The URL is passed through exactly as configured; nothing is derived from
/// runtime state. The opener is not waited on.
pub fn open(url: &str) -> Result<(), LaunchError> {
    let mut cmd = opener_command(url);
    let child = cmd.spawn().map_err(|source| LaunchError::Browser {
        url: url.to_string(),
        source,
    })?;
    info!(target: "lp", "opening browser at {url}");
    drop(child);
    Ok(())
}

fn opener_command(url: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        // `start` treats its first quoted argument as a window title, so an
        // empty title is passed before the URL.
        cmd.args(["/C", "start", "", url]);
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn parts(cmd: &Command) -> (String, Vec<String>) {
        let std = cmd.as_std();
        let program = std.get_program().to_string_lossy().into_owned();
        let args = std
            .get_args()
            .map(|a: &OsStr| a.to_string_lossy().into_owned())
            .collect();
        (program, args)
    }

    #[test]
    fn opener_passes_the_exact_url() {
        let url = "http://127.0.0.1:5000";
        let cmd = opener_command(url);
        let (_, args) = parts(&cmd);
        assert_eq!(args.last().map(String::as_str), Some(url));
    }

    #[test]
    fn opener_matches_the_platform() {
        let (program, args) = parts(&opener_command("http://127.0.0.1:5000"));
        if cfg!(target_os = "windows") {
            assert_eq!(program, "cmd");
            assert_eq!(args[0], "/C");
            assert_eq!(args[1], "start");
        } else if cfg!(target_os = "macos") {
            assert_eq!(program, "open");
        } else {
            assert_eq!(program, "xdg-open");
        }
    }
}
