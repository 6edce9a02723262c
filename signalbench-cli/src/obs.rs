//! Tracing initialisation.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Env var that overrides `--log-level` with a full filter directive.
pub const LOG_ENV: &str = "SIGNALBENCH_LOG";

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for JSON and CSV output.
pub fn init_tracing(log_level: &str, log_format: &str) -> Result<()> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| log_level.to_string());
    let env_filter =
        EnvFilter::try_new(&filter).map_err(|err| anyhow!("invalid log filter '{filter}': {err}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    if log_format.trim().eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
