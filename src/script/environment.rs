//! Scoped execution environment for scripts shipped inside a service package.
//!
//! Package scripts live under `.../services/<name>/package/...` and expect
//! their helpers to resolve relative to the package root. For those the
//! process runs from the package root with a private scratch directory that
//! is removed as soon as the call returns.

use std::path::{Component, Path, PathBuf};

use tempfile::TempDir;

use super::error::ExecutionError;

/// Exported to package scripts so they can locate their own resources
pub const BASEDIR_ENV: &str = "SCRIPT_ALERT_BASEDIR";

/// Package root of a script following the installed package layout.
///
/// Requires a component named `services` (or ending in it, such as
/// `common-services`), at least one component after it, and then a
/// `package` component that is not the last one. The last match wins.
pub fn package_basedir(script: &Path) -> Option<PathBuf> {
    let components: Vec<Component<'_>> = script.components().collect();
    let name_of = |c: &Component<'_>| c.as_os_str().to_str().unwrap_or_default().to_string();

    let package_idx = (0..components.len().saturating_sub(1)).rev().find(|&i| {
        name_of(&components[i]) == "package"
            && components[..i.saturating_sub(1)]
                .iter()
                .any(|c| matches!(c, Component::Normal(_)) && name_of(c).ends_with("services"))
    })?;

    Some(components[..=package_idx].iter().collect())
}

/// Working directory and scratch space for one script invocation.
///
/// The scratch directory is deleted when the guard drops, whether the
/// script succeeded or not.
#[derive(Debug)]
pub struct ExecutionEnvironment {
    basedir: PathBuf,
    scratch: TempDir,
}

impl ExecutionEnvironment {
    /// Create the scratch directory under `tmp_dir`
    pub fn enter(basedir: impl Into<PathBuf>, tmp_dir: &Path) -> Result<Self, ExecutionError> {
        let basedir: PathBuf = basedir.into();
        let basedir = std::path::absolute(&basedir).map_err(ExecutionError::Environment)?;
        let tmp_dir = std::path::absolute(tmp_dir).map_err(ExecutionError::Environment)?;
        std::fs::create_dir_all(&tmp_dir).map_err(ExecutionError::Environment)?;
        let scratch = tempfile::Builder::new()
            .prefix("script-alert-")
            .tempdir_in(&tmp_dir)
            .map_err(ExecutionError::Environment)?;

        tracing::debug!(
            basedir = %basedir.display(),
            scratch = %scratch.path().display(),
            "Entered script execution environment"
        );

        Ok(Self { basedir, scratch })
    }

    pub fn basedir(&self) -> &Path {
        &self.basedir
    }

    pub fn tmp_dir(&self) -> &Path {
        self.scratch.path()
    }
}

impl Drop for ExecutionEnvironment {
    fn drop(&mut self) {
        tracing::debug!(
            basedir = %self.basedir.display(),
            "Leaving script execution environment"
        );
    }
}

/// Run `f` inside an [`ExecutionEnvironment`] when `script` is a package
/// script, or directly otherwise.
pub fn with_environment<T, F>(script: &Path, tmp_dir: &Path, f: F) -> Result<T, ExecutionError>
where
    F: FnOnce(Option<&ExecutionEnvironment>) -> Result<T, ExecutionError>,
{
    match package_basedir(script) {
        Some(basedir) => {
            let env = ExecutionEnvironment::enter(basedir, tmp_dir)?;
            f(Some(&env))
        }
        None => f(None),
    }
}
