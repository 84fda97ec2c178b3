//! Error types for locating, loading and running alert scripts.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors raised while preparing a script alert for execution.
///
/// None of these escape a collection cycle: they are logged and folded into
/// an UNKNOWN result, or into an empty token set during discovery.
#[derive(Debug, thiserror::Error)]
pub enum ScriptAlertError {
    #[error("The attribute 'path' must be specified")]
    MissingPath,

    #[error(
        "Unable to find '{}' as an absolute path or part of {}",
        .path,
        display_tried(.tried)
    )]
    ScriptNotFound { path: String, tried: Vec<PathBuf> },

    #[error("Unsupported script type: {}", .path.display())]
    UnsupportedScriptType { path: PathBuf },

    #[error("Token discovery failed: {0}")]
    TokenDiscovery(#[source] ExecutionError),
}

/// Failures raised by the script itself or by the process running it.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Script exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("Malformed script output: {0}")]
    MalformedOutput(String),

    #[error("Invalid alert state returned by script: {0}")]
    InvalidState(String),

    #[error("Unable to prepare execution environment: {0}")]
    Environment(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_tried(tried: &[PathBuf]) -> String {
    let dirs: Vec<String> = tried.iter().map(|p| p.display().to_string()).collect();
    dirs.join(", ")
}

/// Result type for script alert operations.
pub type ScriptAlertResult<T> = std::result::Result<T, ScriptAlertError>;
