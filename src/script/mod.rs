//! Locating, loading and running check scripts
//!
//! The locator picks the script file, the loader wraps it in a subprocess
//! module, the binder builds its `{{key}}` parameters and package scripts
//! run inside a scoped execution environment.

pub mod binder;
pub mod environment;
pub mod error;
pub mod loader;
pub mod locator;
pub mod process;

pub use binder::{placeholder, ParameterMapping};
pub use environment::{package_basedir, with_environment, ExecutionEnvironment, BASEDIR_ENV};
pub use error::{ExecutionError, ScriptAlertError, ScriptAlertResult};
pub use loader::{ScriptLoader, ScriptModule, ScriptOutput, ScriptRuntime};
pub use locator::ScriptLocator;
pub use process::{ProcessScript, PROTOCOL_VERSION};
