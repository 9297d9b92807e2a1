//! Hostkeep is a small host-maintenance tool. It reports the most frequent IPv4
//! addresses in a log file, checks OS services and offers to start stopped
//! ones, and copies files by extension into timestamped backup directories.

/// Extension backups.
pub mod backup;

/// CLI interface.
pub mod cli;

/// Configuration management.
pub mod config;

/// Defaults and fixed values.
pub mod constants;

/// Error handling.
pub mod error;

/// Log frequency analysis.
pub mod logs;

/// Service status checks.
pub mod services;

#[doc(hidden)]
pub mod test_utils;
