//! `config` command: prints the default configuration.

use std::io::Write;

use crate::config::EngineConfig;
use crate::error::CollapseError;

/// Renders the default configuration as YAML.
///
/// # Errors
///
/// Returns a YAML error if serialization fails.
pub fn render_default() -> Result<String, CollapseError> {
    Ok(serde_yaml::to_string(&EngineConfig::default())?)
}

/// Prints the default configuration to stdout.
///
/// # Errors
///
/// Returns a YAML or I/O error if rendering or writing fails.
pub fn run() -> Result<(), CollapseError> {
    let yaml = render_default()?;
    let mut out = std::io::stdout().lock();
    out.write_all(yaml.as_bytes())?;
    out.flush()?;
    Ok(())
}
