//! Loads resolved script files as runnable check modules.

use std::fmt::Debug;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::binder::ParameterMapping;
use super::environment::ExecutionEnvironment;
use super::error::ExecutionError;
use super::process::ProcessScript;
use crate::alerts::AlertState;
use crate::config::AgentConfig;

/// State and messages produced by a script's `execute`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    pub state: AlertState,
    pub messages: Vec<String>,
}

impl ScriptOutput {
    pub fn new(state: AlertState, messages: Vec<String>) -> Self {
        Self { state, messages }
    }
}

/// The two entry points every check script provides
pub trait ScriptModule: Debug + Send + Sync {
    /// Location of the script on disk
    fn path(&self) -> &Path;

    /// Configuration placeholders the script wants bound before `execute`
    fn get_tokens(&self) -> Result<Option<Vec<String>>, ExecutionError>;

    /// Run the check
    fn execute(
        &self,
        parameters: &ParameterMapping,
        host_name: &str,
        environment: Option<&ExecutionEnvironment>,
    ) -> Result<ScriptOutput, ExecutionError>;
}

/// How a script file is turned into a running process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptRuntime {
    /// Run the script through an interpreter bridge that calls the script's
    /// own `get_tokens()` / `execute()` functions
    Bridge { interpreter: String },
    /// Run `<program> [args..] <script> <action>`; the script speaks the
    /// JSON calling convention itself
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl Default for ScriptRuntime {
    fn default() -> Self {
        ScriptRuntime::Bridge {
            interpreter: "python3".to_string(),
        }
    }
}

/// Turns resolved paths into [`ScriptModule`] handles
#[derive(Debug, Clone)]
pub struct ScriptLoader {
    extension: String,
    runtime: ScriptRuntime,
}

impl ScriptLoader {
    pub fn new(extension: impl Into<String>, runtime: ScriptRuntime) -> Self {
        let extension = extension.into();
        Self {
            extension: extension.trim_start_matches('.').to_string(),
            runtime,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.script_extension.clone(), config.runtime.clone())
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether `path` carries the recognized script extension
    pub fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension)
    }

    /// Load `path`, or return `None` for an unsupported file type.
    ///
    /// Nothing is cached: every call to the returned module starts a fresh
    /// process that reads the file from disk.
    pub fn load(&self, path: &Path) -> Option<Box<dyn ScriptModule>> {
        if !self.supports(path) {
            tracing::error!(
                path = %path.display(),
                expected = %self.extension,
                "Unable to execute script: unsupported script type"
            );
            return None;
        }

        // package scripts run from their package root, so relative paths
        // must not survive past this point
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Some(Box::new(ProcessScript::new(path, self.runtime.clone())))
    }
}

impl Default for ScriptLoader {
    fn default() -> Self {
        Self::new("py", ScriptRuntime::default())
    }
}
