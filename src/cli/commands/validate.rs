//! `validate` command: checks configuration files without running them.

use std::path::Path;

use crate::cli::args::ValidateArgs;
use crate::config::{LoadResult, load_config};
use crate::error::{CollapseError, ConfigError, Severity, ValidationIssue};

/// Validates every file in `args`, stopping at the first failure.
///
/// # Errors
///
/// Returns a config error if a file is missing, malformed, out of range,
/// or (with `--strict`) produces warnings.
pub fn run(args: &ValidateArgs, quiet: bool) -> Result<(), CollapseError> {
    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let result = check(path, args.strict)?;

        for warning in &result.warnings {
            tracing::warn!(
                file = %path.display(),
                location = warning.location.as_deref().unwrap_or("<unknown>"),
                "{}",
                warning.message
            );
        }

        if !quiet {
            println!("{}: valid", path.display());
        }
    }
    Ok(())
}

/// Loads one file, promoting warnings to errors when `strict`.
///
/// # Errors
///
/// Returns the loader's error, or a validation error built from the
/// warnings in strict mode.
pub fn check(path: &Path, strict: bool) -> Result<LoadResult, ConfigError> {
    let result = load_config(path)?;
    if strict && !result.warnings.is_empty() {
        let issues = result
            .warnings
            .into_iter()
            .map(|w| ValidationIssue {
                path: w.location.unwrap_or_default(),
                message: w.message,
                severity: Severity::Warning,
            })
            .collect();
        return Err(ConfigError::ValidationError {
            path: path.display().to_string(),
            issues,
        });
    }
    Ok(result)
}
