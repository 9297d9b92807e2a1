//! Command-line interface for hostkeep.
use std::{path::PathBuf, str::FromStr};

use clap::{ArgGroup, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

/// Verbosity accepted by `--log-level`: a level name or its rank, from
/// `0` (silent) to `5` (trace).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevelArg(LevelFilter);

/// Indexed by rank.
static LEVELS: [(LevelFilter, &str, &[&str]); 6] = [
    (LevelFilter::OFF, "off", &["none", "quiet"]),
    (LevelFilter::ERROR, "error", &["err"]),
    (LevelFilter::WARN, "warn", &["warning"]),
    (LevelFilter::INFO, "info", &[]),
    (LevelFilter::DEBUG, "debug", &[]),
    (LevelFilter::TRACE, "trace", &[]),
];

impl LogLevelArg {
    /// Directive handed to the diagnostics filter.
    pub fn as_str(&self) -> &'static str {
        LEVELS
            .iter()
            .find(|(level, ..)| *level == self.0)
            .map_or("warn", |(_, name, _)| *name)
    }

    /// The parsed level.
    pub fn level(&self) -> LevelFilter {
        self.0
    }
}

impl FromStr for LogLevelArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        if wanted.is_empty() {
            return Err("log level cannot be empty".into());
        }

        let found = match wanted.parse::<usize>() {
            Ok(rank) => LEVELS.get(rank),
            Err(_) => LEVELS.iter().find(|(_, name, aliases)| {
                *name == wanted || aliases.contains(&wanted.as_str())
            }),
        };

        found.map(|(level, ..)| LogLevelArg(*level)).ok_or_else(|| {
            format!(
                "unknown log level '{}' (expected off, error, warn, info, debug, trace, or 0-5)",
                value.trim()
            )
        })
    }
}

/// Command-line interface for hostkeep.
#[derive(Parser)]
#[command(name = "hk", version, author)]
#[command(about = "Host maintenance: log IP reports, service checks, and backups", long_about = None)]
pub struct Cli {
    /// Override the logging verbosity for this invocation only.
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Path to the configuration file (defaults to `hostkeep.yaml` if present).
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for hostkeep.
#[derive(Subcommand)]
pub enum Commands {
    /// Report the most frequent IPv4 addresses in a log file.
    Logs {
        /// Log file to analyze.
        path: PathBuf,

        /// Number of addresses to report (default: 5).
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Emit machine-readable JSON output instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Check services and offer to start the ones that are stopped.
    #[command(group(ArgGroup::new("answer").args(["yes", "no_prompt"])))]
    Services {
        /// Services to check (defaults to `services.names` from the config).
        names: Vec<String>,

        /// Service-manager program (default: systemctl).
        #[arg(long, value_name = "PROGRAM")]
        manager: Option<String>,

        /// Start every stopped service without asking.
        #[arg(short, long)]
        yes: bool,

        /// Never start anything; only report.
        #[arg(long = "no-prompt")]
        no_prompt: bool,

        /// Emit the outcomes as JSON after the run.
        #[arg(long)]
        json: bool,
    },

    /// Copy files with the given extensions into a new timestamped directory.
    Backup {
        /// Directory to collect files from (searched recursively).
        source: PathBuf,

        /// Comma-separated extensions, e.g. `txt,py`.
        extensions: String,

        /// Parent directory for the timestamped backup (default: current directory).
        #[arg(short, long, value_name = "DIR")]
        dest: Option<PathBuf>,

        /// Emit the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Parses command-line arguments and returns a `Cli` struct.
pub fn parse_args() -> Cli {
    Cli::parse()
}
