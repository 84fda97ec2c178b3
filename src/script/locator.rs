//! Resolves a script identifier against the configured base directories.

use std::path::{Path, PathBuf};

use super::error::{ScriptAlertError, ScriptAlertResult};
use crate::alerts::AlertDefinition;

/// Ordered candidate lookup for a single script identifier.
///
/// The identifier is tried as-is first, then joined onto the stacks, common
/// services and host scripts directories in that order. The first candidate
/// that is a regular file wins.
#[derive(Debug, Clone)]
pub struct ScriptLocator<'a> {
    path: &'a str,
    base_dirs: [Option<&'a Path>; 3],
}

impl<'a> ScriptLocator<'a> {
    pub fn new(
        path: &'a str,
        stacks_dir: Option<&'a Path>,
        common_services_dir: Option<&'a Path>,
        host_scripts_dir: Option<&'a Path>,
    ) -> Self {
        Self {
            path,
            base_dirs: [stacks_dir, common_services_dir, host_scripts_dir],
        }
    }

    pub fn for_definition(definition: &'a AlertDefinition) -> Self {
        Self::new(
            &definition.path,
            definition.stacks_dir.as_deref(),
            definition.common_services_dir.as_deref(),
            definition.host_scripts_dir.as_deref(),
        )
    }

    /// Every path that will be tested, in precedence order
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(self.path)];
        candidates.extend(
            self.base_dirs
                .iter()
                .flatten()
                .map(|dir| join_segments(dir, self.path)),
        );
        candidates
    }

    /// Resolve to the first existing script file
    pub fn resolve(&self) -> ScriptAlertResult<PathBuf> {
        if self.path.trim().is_empty() {
            return Err(ScriptAlertError::MissingPath);
        }

        let candidates = self.candidates();
        if let Some(found) = candidates.iter().find(|c| c.is_file()) {
            return Ok(found.clone());
        }

        Err(ScriptAlertError::ScriptNotFound {
            path: self.path.to_string(),
            tried: candidates,
        })
    }
}

/// Join a slash-delimited identifier onto a base directory segment by segment.
fn join_segments(base: &Path, path: &str) -> PathBuf {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |acc, segment| acc.join(segment))
}
