//! Defaults and fixed values shared across hostkeep commands.

// ============================================================================
// Configuration
// ============================================================================

/// Configuration file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "hostkeep.yaml";

/// Default logging filter when neither `--log-level` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

// ============================================================================
// Log analysis
// ============================================================================

/// Number of addresses shown in the frequency report.
pub const DEFAULT_TOP_N: usize = 5;

/// Loose IPv4 lexical pattern. Octets are not range-checked, so `999.1.1.1`
/// counts as an address.
pub const IPV4_PATTERN: &str = r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}";

// ============================================================================
// Service supervision
// ============================================================================

/// Service-manager program used for status queries and start commands.
pub const DEFAULT_SERVICE_MANAGER: &str = "systemctl";

/// The only operator answer treated as consent. Matched case-sensitively.
pub const CONSENT_ANSWER: &str = "y";

// ============================================================================
// Backup
// ============================================================================

/// Directory name prefix for timestamped backup directories.
pub const DEFAULT_BACKUP_PREFIX: &str = "backup";

/// Parent directory for backup destinations.
pub const DEFAULT_BACKUP_DESTINATION: &str = ".";

/// `chrono` format string embedded in backup directory names.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
