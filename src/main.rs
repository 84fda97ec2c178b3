//! Script Alert runner
//!
//! Runs one collection of a script alert and prints the report as JSON.
//!
//! Run with: cargo run -- <definition.json>
//!
//! Environment variables:
//! - SCRIPT_ALERT_DEFINITION: Alert definition file (if no argument is given)
//! - SCRIPT_ALERT_HOST: Host name passed to the script (default: HOSTNAME or localhost)
//! - SCRIPT_ALERT_VALUES: JSON object file of configuration values (optional)
//! - SCRIPT_ALERT_TMP_DIR, SCRIPT_ALERT_EXTENSION, SCRIPT_ALERT_RUNTIME,
//!   SCRIPT_ALERT_INTERPRETER: see `AgentConfig::from_env`
//! - RUST_LOG: Log level (default: info)

use std::collections::HashMap;
use std::path::PathBuf;

use script_alert::{AgentConfig, AlertDefinition, AlertResult, ScriptAlert};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "script_alert=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let definition_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SCRIPT_ALERT_DEFINITION").ok())
        .map(PathBuf::from)
        .ok_or("usage: script-alert <definition.json>")?;
    let host_name = std::env::var("SCRIPT_ALERT_HOST")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "localhost".to_string());

    let definition: AlertDefinition =
        serde_json::from_str(&std::fs::read_to_string(&definition_path)?)?;
    let config = AgentConfig::from_env();

    tracing::info!(
        alert = %definition.name,
        path = %definition.path,
        host = %host_name,
        tmp_dir = %config.tmp_dir.display(),
        "Loading script alert"
    );

    let alert = ScriptAlert::new(definition, config);

    let values: HashMap<String, String> = match std::env::var("SCRIPT_ALERT_VALUES") {
        Ok(file) => serde_json::from_str(&std::fs::read_to_string(file)?)?,
        Err(_) => HashMap::new(),
    };
    for key in alert.tokens().iter().filter(|key| !values.contains_key(*key)) {
        tracing::warn!(alert = %alert.name(), key = %key, "No value supplied for token");
    }

    // Scripts block; keep them off the async workers
    let host = host_name.clone();
    let (alert, collected) = tokio::task::spawn_blocking(move || {
        let collected = alert.collect(&host, &values);
        (alert, collected)
    })
    .await?;

    let result = collected.unwrap_or_else(|e| {
        tracing::error!(alert = %alert.name(), error = %e, "Unable to run alert");
        AlertResult::from_execution_error(&e)
    });

    let report = alert.report(&host_name, &result);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
