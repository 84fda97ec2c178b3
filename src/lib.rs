//! Script Alert: delegated health checks for a host monitoring agent
//!
//! Evaluates one alert whose check logic lives in an external script. Each
//! collection cycle locates the script across a fixed list of base
//! directories, runs it with its configuration placeholders bound, and
//! passes its `(state, messages)` verdict through.
//!
//! # Example
//!
//! ```no_run
//! use script_alert::{AgentConfig, AlertDefinition, ScriptAlert};
//! use std::collections::HashMap;
//!
//! let definition = AlertDefinition::new("datanode_storage", "scripts/check_storage.py")
//!     .with_host_scripts_dir("/var/lib/agent/host_scripts");
//! let alert = ScriptAlert::new(definition, AgentConfig::from_env());
//!
//! // Keys the configuration resolver must supply
//! let mut values = HashMap::new();
//! for key in alert.tokens().iter() {
//!     values.insert(key.to_string(), String::new());
//! }
//!
//! let result = alert.collect("c6401.example.com", &values).unwrap();
//! println!("{}: {:?}", result.state, result.messages);
//! ```

pub mod alerts;
pub mod config;
pub mod script;

pub use alerts::{AlertDefinition, AlertReport, AlertResult, AlertState, ScriptAlert, TokenSet};
pub use config::AgentConfig;
pub use script::{ExecutionError, ScriptAlertError, ScriptRuntime};
