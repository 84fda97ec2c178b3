//! Alert whose verdict comes from an external check script

use std::collections::HashMap;

use super::definition::AlertDefinition;
use super::result::{AlertReport, AlertResult, AlertState};
use super::tokens::TokenSet;
use crate::config::AgentConfig;
use crate::script::{
    with_environment, ExecutionError, ParameterMapping, ScriptAlertError, ScriptAlertResult,
    ScriptLoader, ScriptLocator, ScriptModule,
};

/// A script-backed alert.
///
/// Token discovery runs once at construction; every [`collect`] re-resolves
/// and re-runs the script from disk.
///
/// [`collect`]: ScriptAlert::collect
#[derive(Debug)]
pub struct ScriptAlert {
    definition: AlertDefinition,
    config: AgentConfig,
    loader: ScriptLoader,
    tokens: TokenSet,
}

impl ScriptAlert {
    /// Create the alert and discover the configuration keys its script needs.
    ///
    /// Discovery is best-effort: failures are logged and leave the alert with
    /// no tokens.
    pub fn new(definition: AlertDefinition, config: AgentConfig) -> Self {
        let loader = ScriptLoader::from_config(&config);

        let tokens = match Self::discover_tokens(&definition, &loader) {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::error!(
                    alert = %definition.name,
                    path = %definition.path,
                    error = %e,
                    "Unable to parameterize tokens for script"
                );
                TokenSet::new()
            }
        };

        Self {
            definition,
            config,
            loader,
            tokens,
        }
    }

    fn discover_tokens(
        definition: &AlertDefinition,
        loader: &ScriptLoader,
    ) -> ScriptAlertResult<TokenSet> {
        let path = ScriptLocator::for_definition(definition).resolve()?;
        let module = loader
            .load(&path)
            .ok_or(ScriptAlertError::UnsupportedScriptType { path })?;

        let tokens = module
            .get_tokens()
            .map_err(ScriptAlertError::TokenDiscovery)?;

        Ok(tokens
            .map(|tokens| TokenSet::from_tokens(&definition.name, tokens))
            .unwrap_or_default())
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &AlertDefinition {
        &self.definition
    }

    /// Configuration keys to resolve before each cycle
    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    /// Reporting text for `state`; always `"{0}"` so the script's own
    /// message is used as-is
    pub fn reporting_text(&self, state: AlertState) -> &str {
        self.definition.reporting.text_for(state)
    }

    /// Run one collection cycle.
    ///
    /// A script that cannot be found or has the wrong type yields UNKNOWN.
    /// Errors raised while the script executes are returned to the caller.
    pub fn collect(
        &self,
        host_name: &str,
        config_values: &HashMap<String, String>,
    ) -> Result<AlertResult, ExecutionError> {
        let Some(module) = self.load_module() else {
            return Ok(AlertResult::unable_to_execute(&self.definition.path));
        };

        let parameters = ParameterMapping::bind(config_values);
        let output = with_environment(module.path(), &self.config.tmp_dir, |env| {
            module.execute(&parameters, host_name, env)
        })?;

        Ok(AlertResult::new(output.state, output.messages))
    }

    fn load_module(&self) -> Option<Box<dyn ScriptModule>> {
        let path = match ScriptLocator::for_definition(&self.definition).resolve() {
            Ok(path) => path,
            Err(e) => {
                tracing::error!(
                    alert = %self.definition.name,
                    error = %e,
                    "Unable to execute script"
                );
                return None;
            }
        };

        tracing::debug!(
            alert = %self.definition.name,
            path = %path.display(),
            "Executing script check"
        );

        self.loader.load(&path)
    }

    /// Render a collection result into a report
    pub fn report(&self, host_name: &str, result: &AlertResult) -> AlertReport {
        AlertReport {
            name: self.definition.name.clone(),
            host_name: host_name.to_string(),
            state: result.state,
            text: self.definition.reporting.render(result.state, &result.messages),
            timestamp: result.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptRuntime;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::TempDir;

    const ALL_GOOD: &str = r#"
case "$1" in
  get_tokens) echo '["{{foo-site/bar}}", "{{foo-site/bar}}", "junk"]' ;;
  execute) echo '{"state":"OK","messages":["All good"]}' ;;
esac
"#;

    fn sh_config(temp: &TempDir) -> AgentConfig {
        AgentConfig::default()
            .with_tmp_dir(temp.path().join("agent-tmp"))
            .with_runtime(
                "sh",
                ScriptRuntime::Command {
                    program: "sh".to_string(),
                    args: vec![],
                },
            )
    }

    fn write_script(path: &Path, body: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn host_scripts(temp: &TempDir) -> PathBuf {
        temp.path().join("var/lib/host_scripts")
    }

    #[test]
    fn test_host_script_passes_result_through() {
        let temp = TempDir::new().unwrap();
        write_script(&host_scripts(&temp).join("scripts/check.sh"), ALL_GOOD);

        let definition = AlertDefinition::new("check", "scripts/check.sh")
            .with_host_scripts_dir(host_scripts(&temp));
        let alert = ScriptAlert::new(definition, sh_config(&temp));

        let result = alert.collect("host1", &HashMap::new()).unwrap();
        assert_eq!(result.state, AlertState::Ok);
        assert_eq!(result.messages, vec!["All good"]);
    }

    #[test]
    fn test_tokens_discovered_at_construction() {
        let temp = TempDir::new().unwrap();
        write_script(&host_scripts(&temp).join("scripts/check.sh"), ALL_GOOD);

        let definition = AlertDefinition::new("check", "scripts/check.sh")
            .with_host_scripts_dir(host_scripts(&temp));
        let first = ScriptAlert::new(definition.clone(), sh_config(&temp));
        let second = ScriptAlert::new(definition, sh_config(&temp));

        assert_eq!(first.tokens().iter().collect::<Vec<_>>(), vec!["foo-site/bar"]);
        assert_eq!(first.tokens(), second.tokens());
    }

    #[test]
    fn test_token_discovery_runs_once() {
        let temp = TempDir::new().unwrap();
        let counter = temp.path().join("get_tokens.count");
        let script = format!(
            r#"
case "$1" in
  get_tokens) echo x >> '{}'; echo null ;;
  execute) echo '["OK", []]' ;;
esac
"#,
            counter.display()
        );
        write_script(&host_scripts(&temp).join("check.sh"), &script);

        let definition =
            AlertDefinition::new("check", "check.sh").with_host_scripts_dir(host_scripts(&temp));
        let alert = ScriptAlert::new(definition, sh_config(&temp));
        alert.collect("host1", &HashMap::new()).unwrap();
        alert.collect("host1", &HashMap::new()).unwrap();

        assert!(alert.tokens().is_empty());
        assert_eq!(fs::read_to_string(&counter).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_token_discovery_failure_is_not_fatal() {
        let temp = TempDir::new().unwrap();
        let script = r#"
case "$1" in
  get_tokens) echo 'no tokens for you' >&2; exit 1 ;;
  execute) echo '{"state":"WARNING","messages":["degraded"]}' ;;
esac
"#;
        write_script(&host_scripts(&temp).join("check.sh"), script);

        let definition =
            AlertDefinition::new("check", "check.sh").with_host_scripts_dir(host_scripts(&temp));
        let alert = ScriptAlert::new(definition, sh_config(&temp));

        assert!(alert.tokens().is_empty());
        let result = alert.collect("host1", &HashMap::new()).unwrap();
        assert_eq!(result.state, AlertState::Warning);
    }

    #[test]
    fn test_discovery_error_keeps_source() {
        let temp = TempDir::new().unwrap();
        let script = r#"
case "$1" in
  get_tokens) echo 'boom' >&2; exit 2 ;;
esac
"#;
        write_script(&host_scripts(&temp).join("check.sh"), script);

        let definition =
            AlertDefinition::new("check", "check.sh").with_host_scripts_dir(host_scripts(&temp));
        let loader = ScriptLoader::from_config(&sh_config(&temp));

        let err = ScriptAlert::discover_tokens(&definition, &loader).unwrap_err();
        let source = std::error::Error::source(&err).expect("execution error kept as source");
        assert!(source.to_string().contains("boom"));
        assert!(matches!(
            err,
            ScriptAlertError::TokenDiscovery(ExecutionError::Failed { .. })
        ));
    }

    #[test]
    fn test_missing_script_is_unknown() {
        let temp = TempDir::new().unwrap();
        let definition = AlertDefinition::new("check", "scripts/missing.sh")
            .with_stacks_dir(temp.path().join("stacks"))
            .with_common_services_dir(temp.path().join("common-services"))
            .with_host_scripts_dir(host_scripts(&temp));
        let alert = ScriptAlert::new(definition, sh_config(&temp));

        assert!(alert.tokens().is_empty());
        let result = alert.collect("host1", &HashMap::new()).unwrap();
        assert_eq!(result.state, AlertState::Unknown);
        assert_eq!(result.messages, vec!["Unable to execute script scripts/missing.sh"]);
    }

    #[test]
    fn test_unsupported_extension_is_unknown() {
        let temp = TempDir::new().unwrap();
        write_script(&host_scripts(&temp).join("check.rb"), ALL_GOOD);

        let definition =
            AlertDefinition::new("check", "check.rb").with_host_scripts_dir(host_scripts(&temp));
        let alert = ScriptAlert::new(definition, sh_config(&temp));

        let result = alert.collect("host1", &HashMap::new()).unwrap();
        assert_eq!(result.state, AlertState::Unknown);
        assert_eq!(result.messages, vec!["Unable to execute script check.rb"]);
    }

    #[test]
    fn test_execution_error_propagates() {
        let temp = TempDir::new().unwrap();
        let script = r#"
case "$1" in
  get_tokens) echo null ;;
  execute) echo 'Traceback: connection refused' >&2; exit 1 ;;
esac
"#;
        write_script(&host_scripts(&temp).join("check.sh"), script);

        let definition =
            AlertDefinition::new("check", "check.sh").with_host_scripts_dir(host_scripts(&temp));
        let alert = ScriptAlert::new(definition, sh_config(&temp));

        let err = alert.collect("host1", &HashMap::new()).unwrap_err();
        assert!(matches!(err, ExecutionError::Failed { .. }));
        assert!(err.to_string().contains("connection refused"));

        let fallback = AlertResult::from_execution_error(&err);
        assert_eq!(fallback.state, AlertState::Unknown);
    }

    #[test]
    fn test_config_values_bound_as_placeholders() {
        let temp = TempDir::new().unwrap();
        let script = r#"
case "$1" in
  get_tokens) echo '["{{foo-site/bar}}"]' ;;
  execute)
    read -r line
    escaped=$(printf '%s' "$line" | sed -e 's/\\/\\\\/g' -e 's/"/\\"/g')
    printf '{"state":"OK","messages":["%s"]}\n' "$escaped"
    ;;
esac
"#;
        write_script(&host_scripts(&temp).join("check.sh"), script);

        let definition =
            AlertDefinition::new("check", "check.sh").with_host_scripts_dir(host_scripts(&temp));
        let alert = ScriptAlert::new(definition, sh_config(&temp));

        let mut values = HashMap::new();
        values.insert("foo-site/bar".to_string(), "baz".to_string());
        let result = alert.collect("c6401", &values).unwrap();

        let request: serde_json::Value = serde_json::from_str(&result.messages[0]).unwrap();
        assert_eq!(request["host_name"], "c6401");
        assert_eq!(request["parameters"], serde_json::json!({"{{foo-site/bar}}": "baz"}));
    }

    #[test]
    fn test_package_script_runs_scoped() {
        let temp = TempDir::new().unwrap();
        let stacks = temp.path().join("stacks");
        let script = r#"
case "$1" in
  get_tokens) echo null ;;
  execute) printf '{"state":"OK","messages":["%s","%s"]}\n' "$(pwd)" "$TMPDIR" ;;
esac
"#;
        write_script(&stacks.join("HDP/services/HDFS/package/alerts/check.sh"), script);

        let definition = AlertDefinition::new("check", "HDP/services/HDFS/package/alerts/check.sh")
            .with_stacks_dir(&stacks);
        let config = sh_config(&temp);
        let tmp_dir = config.tmp_dir.clone();
        let alert = ScriptAlert::new(definition, config);

        let result = alert.collect("host1", &HashMap::new()).unwrap();
        assert_eq!(
            fs::canonicalize(&result.messages[0]).unwrap(),
            fs::canonicalize(stacks.join("HDP/services/HDFS/package")).unwrap()
        );

        let scratch = PathBuf::from(&result.messages[1]);
        assert!(scratch.starts_with(&tmp_dir));
        assert!(!scratch.exists());
    }

    #[test]
    fn test_relative_package_script_runs_scoped() {
        let temp = TempDir::new_in(".").unwrap();
        assert!(temp.path().is_relative());
        let script = r#"
case "$1" in
  get_tokens) echo null ;;
  execute) printf '{"state":"OK","messages":["%s","%s"]}\n' "$(pwd)" "$TMPDIR" ;;
esac
"#;
        write_script(
            &temp.path().join("HDP/services/HDFS/package/alerts/check.sh"),
            script,
        );

        let definition = AlertDefinition::new("check", "HDP/services/HDFS/package/alerts/check.sh")
            .with_stacks_dir(temp.path());
        let alert = ScriptAlert::new(definition, sh_config(&temp));

        let result = alert.collect("host1", &HashMap::new()).unwrap();
        assert_eq!(result.state, AlertState::Ok);
        assert_eq!(
            fs::canonicalize(&result.messages[0]).unwrap(),
            fs::canonicalize(temp.path().join("HDP/services/HDFS/package")).unwrap()
        );
        assert!(Path::new(&result.messages[1]).is_absolute());
    }

    #[test]
    fn test_script_edits_apply_next_cycle() {
        let temp = TempDir::new().unwrap();
        let path = host_scripts(&temp).join("check.sh");
        write_script(&path, ALL_GOOD);

        let definition =
            AlertDefinition::new("check", "check.sh").with_host_scripts_dir(host_scripts(&temp));
        let alert = ScriptAlert::new(definition, sh_config(&temp));
        assert_eq!(alert.collect("h", &HashMap::new()).unwrap().state, AlertState::Ok);

        write_script(&path, r#"echo '{"state":"CRITICAL","messages":["down"]}'"#);
        let result = alert.collect("h", &HashMap::new()).unwrap();
        assert_eq!(result.state, AlertState::Critical);
        assert_eq!(result.messages, vec!["down"]);
    }

    #[test]
    fn test_report_uses_message_verbatim() {
        let temp = TempDir::new().unwrap();
        write_script(&host_scripts(&temp).join("check.sh"), ALL_GOOD);

        let definition =
            AlertDefinition::new("check", "check.sh").with_host_scripts_dir(host_scripts(&temp));
        let alert = ScriptAlert::new(definition, sh_config(&temp));
        assert_eq!(alert.reporting_text(AlertState::Critical), "{0}");

        let result = alert.collect("host1", &HashMap::new()).unwrap();
        let report = alert.report("host1", &result);
        assert_eq!(report.name, "check");
        assert_eq!(report.host_name, "host1");
        assert_eq!(report.text, "All good");
        assert_eq!(report.timestamp, result.timestamp);
    }

    #[tokio::test]
    async fn test_distinct_alerts_collect_concurrently() {
        let temp = TempDir::new().unwrap();
        write_script(&host_scripts(&temp).join("ok.sh"), ALL_GOOD);
        write_script(
            &host_scripts(&temp).join("warn.sh"),
            r#"echo '{"state":"WARNING","messages":["slow"]}'"#,
        );

        let mut handles = Vec::new();
        for (name, expected) in [("ok.sh", AlertState::Ok), ("warn.sh", AlertState::Warning)] {
            let definition =
                AlertDefinition::new(name, name).with_host_scripts_dir(host_scripts(&temp));
            let alert = Arc::new(ScriptAlert::new(definition, sh_config(&temp)));
            handles.push(tokio::task::spawn_blocking(move || {
                (alert.collect("host1", &HashMap::new()).unwrap().state, expected)
            }));
        }

        for handle in handles {
            let (state, expected) = handle.await.unwrap();
            assert_eq!(state, expected);
        }
    }
}
