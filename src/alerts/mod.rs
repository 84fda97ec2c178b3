//! Script-backed alerts
//!
//! A [`ScriptAlert`] delegates its check to an external script, feeds it the
//! configuration values it asked for and passes its verdict through.

pub mod definition;
pub mod result;
pub mod script_alert;
pub mod tokens;

pub use definition::{AlertDefinition, ReportingTemplates, VERBATIM_TEMPLATE};
pub use result::{AlertReport, AlertResult, AlertState};
pub use script_alert::ScriptAlert;
pub use tokens::TokenSet;
