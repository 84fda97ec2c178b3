//! Agent-wide settings used by script alerts

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::script::ScriptRuntime;

/// Agent configuration consulted by every script alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Parent directory for per-execution scratch space
    pub tmp_dir: PathBuf,
    /// File extension a check script must carry (without the dot)
    pub script_extension: String,
    /// How check scripts are run
    pub runtime: ScriptRuntime,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            tmp_dir: std::env::temp_dir(),
            script_extension: "py".to_string(),
            runtime: ScriptRuntime::default(),
        }
    }
}

impl AgentConfig {
    /// Create a config from environment variables
    /// SCRIPT_ALERT_TMP_DIR=/var/lib/agent/tmp
    /// SCRIPT_ALERT_EXTENSION=py
    /// SCRIPT_ALERT_RUNTIME=bridge|command
    /// SCRIPT_ALERT_INTERPRETER=python3
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let tmp_dir = std::env::var("SCRIPT_ALERT_TMP_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.tmp_dir);
        let script_extension = std::env::var("SCRIPT_ALERT_EXTENSION")
            .map(|ext| ext.trim_start_matches('.').to_string())
            .unwrap_or(defaults.script_extension);
        let interpreter =
            std::env::var("SCRIPT_ALERT_INTERPRETER").unwrap_or_else(|_| "python3".to_string());

        let runtime = match std::env::var("SCRIPT_ALERT_RUNTIME").as_deref() {
            Ok("command") => ScriptRuntime::Command {
                program: interpreter,
                args: vec![],
            },
            _ => ScriptRuntime::Bridge { interpreter },
        };

        Self {
            tmp_dir,
            script_extension,
            runtime,
        }
    }

    pub fn with_tmp_dir(mut self, tmp_dir: impl Into<PathBuf>) -> Self {
        self.tmp_dir = tmp_dir.into();
        self
    }

    pub fn with_runtime(mut self, extension: impl Into<String>, runtime: ScriptRuntime) -> Self {
        self.script_extension = extension.into();
        self.runtime = runtime;
        self
    }
}
