//! Error handling for hostkeep.
use std::path::PathBuf;

use thiserror::Error;

/// Defines all errors a hostkeep command can fail with.
#[derive(Debug, Error)]
pub enum HostkeepError {
    /// The log file is missing, unreadable, or not a regular file.
    #[error("Log file not found or unreadable: {}", .path.display())]
    FileNotFound {
        /// The path that was requested.
        path: PathBuf,
    },

    /// The backup source root is missing or is not a directory.
    #[error("Backup source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),

    /// The timestamped backup destination could not be created.
    #[error("Failed to create backup directory '{}': {source}", .path.display())]
    DirectoryCreate {
        /// The destination that could not be created.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// The extension filter resolved to an empty set.
    #[error("No file extensions given (expected e.g. 'txt,py')")]
    EmptyExtensionSet,

    /// One or more files could not be copied for reasons other than vanishing.
    #[error("Backup finished with {failed} file(s) not copied")]
    BackupIncomplete {
        /// Number of files that failed to copy.
        failed: usize,
    },

    /// A service-manager start command exited unsuccessfully.
    #[error("Failed to start service '{service}': command exited with {}", display_code(.code))]
    ServiceCommandFailure {
        /// The service that failed to start.
        service: String,
        /// Exit code of the start command; `None` when killed by a signal.
        code: Option<i32>,
    },

    /// The service-manager program could not be spawned at all.
    #[error("Failed to run service manager '{manager}': {source}")]
    ServiceManagerUnavailable {
        /// The program that was invoked.
        manager: String,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// Error loading the configuration file.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Error writing a report to stdout or reading operator input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error encoding a JSON report.
    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

impl HostkeepError {
    /// Process exit code this error should terminate the binary with.
    ///
    /// Start-command failures propagate the command's own code so callers can
    /// distinguish e.g. a permission failure from a missing unit.
    pub fn exit_code(&self) -> u8 {
        match self {
            HostkeepError::ServiceCommandFailure {
                code: Some(code), ..
            } => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
            _ => 1,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error reading the configuration file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing YAML configuration.
    #[error("Invalid YAML format: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A `${VAR}` reference names an unset environment variable.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}
