//! Configuration management for hostkeep.
use regex::Regex;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::constants::{
    DEFAULT_BACKUP_DESTINATION, DEFAULT_BACKUP_PREFIX, DEFAULT_CONFIG_FILE,
    DEFAULT_SERVICE_MANAGER, DEFAULT_TOP_N,
};
use crate::error::ConfigError;

/// Represents the structure of the configuration file. Every section is
/// optional; missing values fall back to built-in defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for `logs`.
    pub logs: LogsConfig,
    /// Settings for `services`.
    pub services: ServicesConfig,
    /// Settings for `backup`.
    pub backup: BackupConfig,
}

/// Settings for the log frequency report.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Number of entries in the report.
    pub top: usize,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self { top: DEFAULT_TOP_N }
    }
}

/// Settings for the service checker.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Services checked when none are named on the command line.
    pub names: Vec<String>,
    /// Service-manager program.
    pub manager: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            manager: DEFAULT_SERVICE_MANAGER.to_string(),
        }
    }
}

/// Settings for the extension backup.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Parent directory of the timestamped backup directories.
    pub destination: PathBuf,
    /// Prefix of each backup directory name.
    pub prefix: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            destination: PathBuf::from(DEFAULT_BACKUP_DESTINATION),
            prefix: DEFAULT_BACKUP_PREFIX.to_string(),
        }
    }
}

/// Expands `$VAR` and `${VAR}` references from the environment.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?")
        .expect("env var pattern is valid");

    let mut missing = None;
    let result = re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match env::var(var_name) {
            Ok(value) => value,
            Err(_) => {
                if missing.is_none() {
                    missing = Some(var_name.to_string());
                }
                String::new()
            }
        }
    });

    match missing {
        Some(var_name) => Err(ConfigError::MissingEnvVar(var_name)),
        None => Ok(result.into_owned()),
    }
}

/// Parses configuration text, expanding environment variables first.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let expanded = expand_env_vars(content)?;
    if expanded.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(&expanded)?)
}

/// Loads the configuration.
///
/// An explicit `config_path` must exist. Without one, `hostkeep.yaml` in the
/// working directory is used when present, otherwise defaults apply.
pub fn load_config(config_path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match config_path {
        Some(path) => path,
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if !fallback.exists() {
                debug!("No {DEFAULT_CONFIG_FILE} found; using defaults");
                return Ok(Config::default());
            }
            fallback
        }
    };

    let content = fs::read_to_string(config_path).map_err(|e| {
        ConfigError::ReadError(std::io::Error::new(
            e.kind(),
            format!("{} ({})", e, config_path.display()),
        ))
    })?;

    debug!("Loaded configuration from {}", config_path.display());
    parse_config(&content)
}
