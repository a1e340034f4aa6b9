// SPDX-License-Identifier: MIT OR Apache-2.0
//! Optional virtualenv activation.
//!
//! When the venv's activate script exists, the equivalent environment edits
//! are applied directly to the spawned server rather than sourcing it in a
//! shell: the venv's scripts directory is prepended to `PATH`, `VIRTUAL_ENV`
//! is set, and `PYTHONHOME` is dropped. Absence of the activation resource
//! is a silent skip, not an error.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment edits applied to the spawned server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvPatch {
    /// Directory prepended to the child's `PATH`.
    pub path_prepend: PathBuf,
    /// Value for `VIRTUAL_ENV`.
    pub virtual_env: PathBuf,
    /// Variables removed from the child's environment.
    pub remove: Vec<&'static str>,
}

/// Platform-specific scripts directory inside a virtualenv.
pub(crate) fn scripts_dir(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        venv.join("Scripts")
    } else {
        venv.join("bin")
    }
}

/// Platform-specific activation script inside a virtualenv.
pub(crate) fn activation_script(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        scripts_dir(venv).join("activate.bat")
    } else {
        scripts_dir(venv).join("activate")
    }
}

/// Probe for an activation resource at `<root>/<dir>` and derive the
/// environment edits if it exists.
pub fn detect(root: &Path, dir: &Path) -> Option<EnvPatch> {
    let venv = root.join(dir);
    let script = activation_script(&venv);
    if !script.is_file() {
        debug!(target: "lp", "no activation script at {}, skipping", script.display());
        return None;
    }
    debug!(target: "lp", "activating virtualenv at {}", venv.display());
    Some(EnvPatch {
        path_prepend: scripts_dir(&venv),
        virtual_env: venv,
        remove: vec!["PYTHONHOME"],
    })
}

impl EnvPatch {
    /// Compute the child's `PATH` value given the parent's.
    pub fn merged_path(&self, parent: Option<&OsStr>) -> OsString {
        let mut paths: Vec<PathBuf> = vec![self.path_prepend.clone()];
        if let Some(parent) = parent {
            paths.extend(std::env::split_paths(parent));
        }
        // join_paths only fails if a path contains the separator character;
        // the venv directory alone is still a usable PATH in that case.
        std::env::join_paths(paths)
            .unwrap_or_else(|_| self.path_prepend.clone().into_os_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_venv(root: &Path, dir: &str) -> PathBuf {
        let venv = root.join(dir);
        let script = activation_script(&venv);
        fs::create_dir_all(script.parent().unwrap()).unwrap();
        fs::write(&script, "# activation stub\n").unwrap();
        venv
    }

    #[test]
    fn missing_resource_is_a_silent_skip() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        assert!(detect(tmp.path(), Path::new("venv")).is_none());
    }

    #[test]
    fn present_resource_yields_a_patch() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let venv = make_venv(tmp.path(), "venv");

        let patch = detect(tmp.path(), Path::new("venv")).expect("patch");
        assert_eq!(patch.virtual_env, venv);
        assert_eq!(patch.path_prepend, scripts_dir(&venv));
        assert_eq!(patch.remove, vec!["PYTHONHOME"]);
    }

    #[test]
    fn custom_venv_dir_is_respected() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        make_venv(tmp.path(), ".env310");
        assert!(detect(tmp.path(), Path::new(".env310")).is_some());
        assert!(detect(tmp.path(), Path::new("venv")).is_none());
    }

    #[test]
    fn a_bare_directory_without_script_does_not_activate() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(tmp.path().join("venv")).unwrap();
        assert!(detect(tmp.path(), Path::new("venv")).is_none());
    }

    #[test]
    fn merged_path_prepends_scripts_dir() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let venv = make_venv(tmp.path(), "venv");
        let patch = detect(tmp.path(), Path::new("venv")).expect("patch");

        let parent = std::env::join_paths([Path::new("/usr/bin"), Path::new("/bin")]).unwrap();
        let merged = patch.merged_path(Some(parent.as_os_str()));
        let parts: Vec<PathBuf> = std::env::split_paths(&merged).collect();
        assert_eq!(parts.first(), Some(&scripts_dir(&venv)));
        assert!(parts.contains(&PathBuf::from("/usr/bin")));
    }

    #[test]
    fn merged_path_without_parent_is_just_the_scripts_dir() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let venv = make_venv(tmp.path(), "venv");
        let patch = detect(tmp.path(), Path::new("venv")).expect("patch");

        let merged = patch.merged_path(None);
        let parts: Vec<PathBuf> = std::env::split_paths(&merged).collect();
        assert_eq!(parts, vec![scripts_dir(&venv)]);
    }
}
