//! Configuration loader
//!
//! Loading pipeline:
//! 1. Size check and read (UTF-8 BOM tolerated)
//! 2. YAML parsing into `EngineConfig` (unknown keys rejected)
//! 3. Validation, with warnings returned alongside the config

use std::path::Path;

use crate::config::schema::EngineConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;

/// Default upper bound on configuration file size (1 MiB).
pub const DEFAULT_MAX_CONFIG_SIZE: usize = 1024 * 1024;

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: EngineConfig,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

/// Loads, parses and validates an engine configuration file.
///
/// The maximum file size can be raised through `COLLAPSE_MAX_CONFIG_SIZE`.
///
/// # Errors
///
/// Returns [`ConfigError::MissingFile`] if the file cannot be read,
/// [`ConfigError::InvalidValue`] if it is too large,
/// [`ConfigError::ParseError`] for malformed YAML or unknown keys, and
/// [`ConfigError::ValidationError`] if any value is out of range.
pub fn load_config(path: &Path) -> Result<LoadResult, ConfigError> {
    let max_size = env_or("COLLAPSE_MAX_CONFIG_SIZE", DEFAULT_MAX_CONFIG_SIZE);

    let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
        path: path.to_path_buf(),
    })?;
    let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
    if file_size > max_size {
        return Err(ConfigError::InvalidValue {
            field: "file_size".to_string(),
            value: format!("{file_size} bytes"),
            expected: format!("at most {max_size} bytes"),
        });
    }

    let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
        path: path.to_path_buf(),
    })?;
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let config = parse_config(raw).map_err(|e| match e {
        ConfigError::ParseError { line, message, .. } => ConfigError::ParseError {
            path: path.to_path_buf(),
            line,
            message,
        },
        ConfigError::ValidationError { issues, .. } => ConfigError::ValidationError {
            path: path.display().to_string(),
            issues,
        },
        other => other,
    })?;

    Ok(config)
}

/// Parses and validates configuration text.
///
/// An empty document yields the default configuration.
///
/// # Errors
///
/// Returns [`ConfigError::ParseError`] for malformed YAML and
/// [`ConfigError::ValidationError`] if any value is out of range.
pub fn parse_config(raw: &str) -> Result<LoadResult, ConfigError> {
    let config: EngineConfig = if raw.trim().is_empty() {
        EngineConfig::default()
    } else {
        serde_yaml::from_str(raw).map_err(|e| ConfigError::ParseError {
            path: "<inline>".into(),
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })?
    };

    let result = Validator::new().validate(&config);
    if result.has_errors() {
        return Err(ConfigError::ValidationError {
            path: "<inline>".to_string(),
            issues: result.errors,
        });
    }

    let warnings = result
        .warnings
        .into_iter()
        .map(|issue| LoadWarning {
            message: issue.message,
            location: Some(issue.path),
        })
        .collect();

    Ok(LoadResult { config, warnings })
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
