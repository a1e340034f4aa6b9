// SPDX-License-Identifier: MIT OR Apache-2.0
//! Launch-root resolution.

use crate::error::LaunchError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve the directory the launch sequence runs from.
///
/// An explicit root wins; otherwise the directory containing the running
/// executable is used, matching a script that starts from its own location.
/// The result is canonicalized, so an inaccessible root fails here and
/// aborts the whole sequence.
pub fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf, LaunchError> {
    let root = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let exe = std::env::current_exe().map_err(LaunchError::Root)?;
            exe.parent().map(Path::to_path_buf).ok_or_else(|| {
                LaunchError::Root(std::io::Error::other(
                    "executable path has no parent directory",
                ))
            })?
        }
    };
    root.canonicalize().map_err(LaunchError::Root)
}

/// Make `root` the current working directory for the rest of the sequence.
pub fn enter_root(root: &Path) -> Result<(), LaunchError> {
    std::env::set_current_dir(root).map_err(|source| LaunchError::Chdir {
        path: root.to_path_buf(),
        source,
    })?;
    debug!(target: "lp", "working directory set to {}", root.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn explicit_root_is_canonicalized() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let resolved = resolve_root(Some(tmp.path())).expect("resolve");
        assert_eq!(resolved, tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn missing_explicit_root_is_an_error() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let gone = tmp.path().join("does-not-exist");
        let err = resolve_root(Some(&gone)).unwrap_err();
        assert!(matches!(err, LaunchError::Root(_)));
    }

    #[test]
    fn default_root_is_the_executable_directory() {
        let resolved = resolve_root(None).expect("resolve");
        let exe_dir = std::env::current_exe()
            .unwrap()
            .parent()
            .unwrap()
            .canonicalize()
            .unwrap();
        assert_eq!(resolved, exe_dir);
    }

    // Changes process-global state; must not run alongside other cwd tests.
    #[test]
    #[serial(cwd)]
    fn enter_root_changes_cwd_regardless_of_caller_cwd() {
        let prior = std::env::current_dir().expect("cwd");
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = tmp.path().canonicalize().unwrap();

        enter_root(&root).expect("enter root");
        assert_eq!(std::env::current_dir().unwrap(), root);

        std::env::set_current_dir(&prior).expect("restore cwd");
    }

    #[test]
    #[serial(cwd)]
    fn enter_missing_root_is_an_error() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let gone = tmp.path().join("missing");
        let err = enter_root(&gone).unwrap_err();
        assert!(matches!(err, LaunchError::Chdir { .. }));
    }
}
