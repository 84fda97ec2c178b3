//! Alert states and per-cycle results

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Health verdict of a single alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertState {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl AlertState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertState::Ok => "OK",
            AlertState::Warning => "WARNING",
            AlertState::Critical => "CRITICAL",
            AlertState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OK" => Ok(AlertState::Ok),
            "WARNING" => Ok(AlertState::Warning),
            "CRITICAL" => Ok(AlertState::Critical),
            "UNKNOWN" => Ok(AlertState::Unknown),
            _ => Err(format!("unrecognized alert state: {}", s)),
        }
    }
}

/// Outcome of one collection cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertResult {
    pub state: AlertState,
    pub messages: Vec<String>,
    /// Collection time (unix millis)
    pub timestamp: i64,
}

impl AlertResult {
    pub fn new(state: AlertState, messages: Vec<String>) -> Self {
        Self {
            state,
            messages,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// UNKNOWN result for a script that could not be resolved or loaded
    pub fn unable_to_execute(path: &str) -> Self {
        Self::new(
            AlertState::Unknown,
            vec![format!("Unable to execute script {}", path)],
        )
    }

    /// UNKNOWN result carrying the text of an error raised by a script.
    ///
    /// Collection propagates script failures; the caller uses this to record
    /// a verdict for the cycle anyway.
    pub fn from_execution_error(err: &impl std::error::Error) -> Self {
        Self::new(AlertState::Unknown, vec![err.to_string()])
    }
}

/// Rendered record of a collection, ready for transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertReport {
    pub name: String,
    pub host_name: String,
    pub state: AlertState,
    pub text: String,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_parse_case_insensitive() {
        assert_eq!("ok".parse::<AlertState>().unwrap(), AlertState::Ok);
        assert_eq!("Warning".parse::<AlertState>().unwrap(), AlertState::Warning);
        assert_eq!(" CRITICAL ".parse::<AlertState>().unwrap(), AlertState::Critical);
        assert!("FINE".parse::<AlertState>().is_err());
    }

    #[test]
    fn test_state_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&AlertState::Unknown).unwrap(), "\"UNKNOWN\"");
        assert_eq!(AlertState::Warning.to_string(), "WARNING");
    }

    #[test]
    fn test_unable_to_execute() {
        let result = AlertResult::unable_to_execute("scripts/check.py");
        assert_eq!(result.state, AlertState::Unknown);
        assert_eq!(result.messages, vec!["Unable to execute script scripts/check.py"]);
        assert!(result.timestamp > 0);
    }

    #[test]
    fn test_from_execution_error() {
        let err = crate::script::ExecutionError::InvalidState("MEH".to_string());
        let result = AlertResult::from_execution_error(&err);
        assert_eq!(result.state, AlertState::Unknown);
        assert!(result.messages[0].contains("MEH"));
    }
}
