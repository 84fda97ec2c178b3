//! Subprocess-backed script modules and their JSON calling convention.
//!
//! `get_tokens` writes a JSON array of strings (or `null`) to stdout.
//! `execute` reads `{"version":1,"parameters":{..},"host_name":".."}` from
//! stdin and writes `{"state":"OK","messages":[..]}` or `["OK",[..]]`.
//! Only the last non-empty stdout line is parsed.

use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::str::FromStr;
use std::thread;

use serde::{Deserialize, Serialize};

use super::binder::ParameterMapping;
use super::environment::{ExecutionEnvironment, BASEDIR_ENV};
use super::error::ExecutionError;
use super::loader::{ScriptModule, ScriptOutput, ScriptRuntime};
use crate::alerts::AlertState;

/// Calling convention version sent with every `execute` request
pub const PROTOCOL_VERSION: u32 = 1;

const PYTHON_BRIDGE: &str = include_str!("python_bridge.py");

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    version: u32,
    parameters: &'a ParameterMapping,
    host_name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExecuteResponse {
    Object {
        state: String,
        #[serde(default)]
        messages: Vec<String>,
    },
    Tuple(String, Vec<String>),
}

#[derive(Debug, Clone, Copy)]
enum Action {
    GetTokens,
    Execute,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Action::GetTokens => "get_tokens",
            Action::Execute => "execute",
        }
    }
}

/// A script file run as a child process on every call
#[derive(Debug, Clone)]
pub struct ProcessScript {
    path: PathBuf,
    runtime: ScriptRuntime,
}

impl ProcessScript {
    pub fn new(path: impl Into<PathBuf>, runtime: ScriptRuntime) -> Self {
        Self {
            path: path.into(),
            runtime,
        }
    }

    fn command(&self, action: Action) -> (String, Command) {
        let (program, mut cmd) = match &self.runtime {
            ScriptRuntime::Bridge { interpreter } => {
                let mut cmd = Command::new(interpreter);
                cmd.arg("-c").arg(PYTHON_BRIDGE);
                (interpreter.clone(), cmd)
            }
            ScriptRuntime::Command { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                (program.clone(), cmd)
            }
        };
        cmd.arg(&self.path).arg(action.as_str());
        (program, cmd)
    }

    fn run(
        &self,
        action: Action,
        stdin: Option<&[u8]>,
        environment: Option<&ExecutionEnvironment>,
    ) -> Result<String, ExecutionError> {
        let (program, mut cmd) = self.command(action);

        if let Some(env) = environment {
            cmd.current_dir(env.basedir())
                .env("TMPDIR", env.tmp_dir())
                .env(BASEDIR_ENV, env.basedir());
        }

        cmd.stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|source| ExecutionError::Spawn { program, source })?;

        // feed stdin while stdout/stderr drain, or a chatty script blocks forever
        let writer = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => {
                let input = input.to_vec();
                Some(thread::spawn(move || match pipe.write_all(&input) {
                    // a script that never reads its request closes the pipe early
                    Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
                    _ => Ok(()),
                }))
            }
            _ => None,
        };

        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| io::Error::other("stdin writer panicked"))??;
        }
        check_status(&output)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .map(|line| line.trim().to_string())
            .ok_or_else(|| {
                ExecutionError::MalformedOutput(format!("{} produced no output", action.as_str()))
            })
    }
}

fn check_status(output: &Output) -> Result<(), ExecutionError> {
    if output.status.success() {
        return Ok(());
    }
    Err(ExecutionError::Failed {
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

impl ScriptModule for ProcessScript {
    fn path(&self) -> &Path {
        &self.path
    }

    fn get_tokens(&self) -> Result<Option<Vec<String>>, ExecutionError> {
        let line = self.run(Action::GetTokens, None, None)?;
        serde_json::from_str(&line).map_err(|e| ExecutionError::MalformedOutput(e.to_string()))
    }

    fn execute(
        &self,
        parameters: &ParameterMapping,
        host_name: &str,
        environment: Option<&ExecutionEnvironment>,
    ) -> Result<ScriptOutput, ExecutionError> {
        let request = serde_json::to_vec(&ExecuteRequest {
            version: PROTOCOL_VERSION,
            parameters,
            host_name,
        })
        .map_err(|e| ExecutionError::MalformedOutput(e.to_string()))?;

        let line = self.run(Action::Execute, Some(&request), environment)?;
        let response: ExecuteResponse = serde_json::from_str(&line)
            .map_err(|e| ExecutionError::MalformedOutput(format!("{}: {}", e, line)))?;

        let (state, messages) = match response {
            ExecuteResponse::Object { state, messages } => (state, messages),
            ExecuteResponse::Tuple(state, messages) => (state, messages),
        };
        let state = AlertState::from_str(&state).map_err(|_| ExecutionError::InvalidState(state))?;

        Ok(ScriptOutput::new(state, messages))
    }
}
