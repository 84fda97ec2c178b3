//! Script alert definitions

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::result::AlertState;

/// Placeholder text meaning "use the script's message verbatim"
pub const VERBATIM_TEMPLATE: &str = "{0}";

/// Alert definition backed by a single check script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertDefinition {
    /// Unique alert name
    pub name: String,
    /// Slash-delimited script identifier
    pub path: String,
    #[serde(default, rename = "stacks_directory")]
    pub stacks_dir: Option<PathBuf>,
    #[serde(default, rename = "common_services_directory")]
    pub common_services_dir: Option<PathBuf>,
    #[serde(default, rename = "host_scripts_directory")]
    pub host_scripts_dir: Option<PathBuf>,
    /// Always the verbatim set; script alerts render their own text
    #[serde(skip)]
    pub reporting: ReportingTemplates,
}

impl AlertDefinition {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            stacks_dir: None,
            common_services_dir: None,
            host_scripts_dir: None,
            reporting: ReportingTemplates::default(),
        }
    }

    pub fn with_stacks_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.stacks_dir = Some(dir.into());
        self
    }

    pub fn with_common_services_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.common_services_dir = Some(dir.into());
        self
    }

    pub fn with_host_scripts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.host_scripts_dir = Some(dir.into());
        self
    }
}

/// Per-state reporting text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingTemplates {
    pub ok: String,
    pub warning: String,
    pub critical: String,
    pub unknown: String,
}

impl Default for ReportingTemplates {
    fn default() -> Self {
        Self {
            ok: VERBATIM_TEMPLATE.to_string(),
            warning: VERBATIM_TEMPLATE.to_string(),
            critical: VERBATIM_TEMPLATE.to_string(),
            unknown: VERBATIM_TEMPLATE.to_string(),
        }
    }
}

impl ReportingTemplates {
    pub fn text_for(&self, state: AlertState) -> &str {
        match state {
            AlertState::Ok => &self.ok,
            AlertState::Warning => &self.warning,
            AlertState::Critical => &self.critical,
            AlertState::Unknown => &self.unknown,
        }
    }

    /// Fill `{N}` placeholders with `args[N]`; missing arguments render empty
    pub fn render(&self, state: AlertState, args: &[String]) -> String {
        static POSITIONAL: OnceLock<Regex> = OnceLock::new();
        let re = POSITIONAL.get_or_init(|| Regex::new(r"\{(\d+)\}").expect("valid regex"));

        re.replace_all(self.text_for(state), |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| args.get(i))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
    }
}
