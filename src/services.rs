//! Service status checks with an operator-confirmed start for stopped services.
use serde::Serialize;
use std::{
    io::{self, BufRead, Write},
    process::{Command, Stdio},
};
use strum_macros::{AsRefStr, Display};
use tracing::{debug, error, info, warn};

use crate::constants::CONSENT_ANSWER;
use crate::error::HostkeepError;

/// Observed state of a service, queried fresh on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// The service manager reports the unit as active.
    Running,
    /// The service manager reports the unit as anything but active.
    Stopped,
    /// The state could not be determined.
    Unknown,
}

/// The two capabilities hostkeep needs from the OS service manager.
pub trait ServiceManager {
    /// Returns whether `name` is active.
    fn query_status(&self, name: &str) -> ServiceStatus;

    /// Starts `name` and returns the command's exit code (`None` if it was
    /// terminated by a signal).
    fn start(&self, name: &str) -> Result<Option<i32>, HostkeepError>;
}

/// A `systemctl`-compatible service manager driven through its CLI.
#[derive(Debug, Clone)]
pub struct CommandServiceManager {
    program: String,
}

impl CommandServiceManager {
    /// Uses `program` for `is-active --quiet <name>` and `start <name>`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ServiceManager for CommandServiceManager {
    fn query_status(&self, name: &str) -> ServiceStatus {
        let mut cmd = Command::new(&self.program);
        cmd.args(["is-active", "--quiet", name])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        debug!("Executing command: {cmd:?}");

        match cmd.status() {
            Ok(status) if status.success() => ServiceStatus::Running,
            Ok(status) => {
                debug!("'{name}' is-active exited with {status}");
                ServiceStatus::Stopped
            }
            Err(err) => {
                warn!("Failed to run '{}' for '{name}': {err}", self.program);
                ServiceStatus::Unknown
            }
        }
    }

    fn start(&self, name: &str) -> Result<Option<i32>, HostkeepError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["start", name]);

        debug!("Executing command: {cmd:?}");

        let status =
            cmd.status()
                .map_err(|source| HostkeepError::ServiceManagerUnavailable {
                    manager: self.program.clone(),
                    source,
                })?;
        Ok(status.code())
    }
}

/// Asks the operator a yes/no question.
pub trait Prompter {
    /// Returns `true` only on explicit consent.
    fn prompt_yes_no(&mut self, message: &str) -> bool;
}

impl<P: Prompter + ?Sized> Prompter for Box<P> {
    fn prompt_yes_no(&mut self, message: &str) -> bool {
        (**self).prompt_yes_no(message)
    }
}

/// Reads the answer as one line of input. Only the exact answer `y` consents;
/// end of input or a read error counts as a refusal.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    /// Prompts on `output` and reads answers from `input`.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LinePrompter<io::StdinLock<'static>, io::Stderr> {
    /// Prompts on stderr and reads stdin, keeping stdout for the report.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn prompt_yes_no(&mut self, message: &str) -> bool {
        let _ = write!(self.output, "{message} (y/n) ");
        let _ = self.output.flush();

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) => {
                debug!("Input closed while prompting");
                false
            }
            Ok(_) => answer.trim_end_matches(['\r', '\n']) == CONSENT_ANSWER,
            Err(err) => {
                warn!("Failed to read answer: {err}");
                false
            }
        }
    }
}

/// Answers every prompt the same way, for unattended runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Prompter for FixedAnswer {
    fn prompt_yes_no(&mut self, message: &str) -> bool {
        debug!("{message} -> answering {}", if self.0 { "y" } else { "n" });
        self.0
    }
}

/// What was done for one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceAction {
    /// Nothing to do, or the operator declined.
    None,
    /// The start command succeeded.
    Started,
    /// The start command failed with this exit code.
    StartFailed(Option<i32>),
    /// The name was rejected before reaching the service manager.
    Skipped,
}

/// Result for one configured service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceOutcome {
    /// Service name as configured.
    pub name: String,
    /// Status observed before any action.
    pub status: ServiceStatus,
    /// Action taken.
    pub action: ServiceAction,
}

/// Outcomes of one supervision pass, in configuration order.
#[derive(Debug, Default, Serialize)]
pub struct ServiceReport {
    /// One entry per configured service.
    pub outcomes: Vec<ServiceOutcome>,
}

impl ServiceReport {
    /// The first failed start, as the error the process should exit with.
    pub fn first_failure(&self) -> Option<HostkeepError> {
        self.outcomes.iter().find_map(|outcome| match outcome.action {
            ServiceAction::StartFailed(code) => Some(HostkeepError::ServiceCommandFailure {
                service: outcome.name.clone(),
                code,
            }),
            _ => None,
        })
    }
}

/// Rejects names that could be read as manager flags or split into several
/// arguments.
pub fn is_valid_service_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('-') && !name.chars().any(char::is_whitespace)
}

/// Checks a fixed list of services and offers to start the stopped ones.
pub struct ServiceSupervisor<M, P> {
    services: Vec<String>,
    manager: M,
    prompter: P,
}

impl<M: ServiceManager, P: Prompter> ServiceSupervisor<M, P> {
    /// Creates a supervisor for `services`.
    pub fn new(services: Vec<String>, manager: M, prompter: P) -> Self {
        Self {
            services,
            manager,
            prompter,
        }
    }

    /// Configured service names.
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// Checks every service once, writing one status line per service to
    /// `out`. A failed start is reported and the pass continues.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<ServiceReport, HostkeepError> {
        let mut report = ServiceReport::default();

        for name in &self.services {
            let outcome = Self::supervise(&self.manager, &mut self.prompter, name, out)?;
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    fn supervise<W: Write>(
        manager: &M,
        prompter: &mut P,
        name: &str,
        out: &mut W,
    ) -> Result<ServiceOutcome, HostkeepError> {
        let outcome = |status, action| ServiceOutcome {
            name: name.to_string(),
            status,
            action,
        };

        if !is_valid_service_name(name) {
            warn!("Skipping invalid service name {name:?}");
            writeln!(out, "{name:?} is not a valid service name")?;
            return Ok(outcome(ServiceStatus::Unknown, ServiceAction::Skipped));
        }

        let status = manager.query_status(name);
        match status {
            ServiceStatus::Running => {
                writeln!(out, "{name} is running")?;
                Ok(outcome(status, ServiceAction::None))
            }
            ServiceStatus::Unknown => {
                writeln!(out, "{name} status is unknown")?;
                Ok(outcome(status, ServiceAction::None))
            }
            ServiceStatus::Stopped => {
                writeln!(out, "{name} is not running")?;
                out.flush()?;

                if !prompter.prompt_yes_no(&format!("Start {name}?")) {
                    info!("Leaving '{name}' stopped");
                    return Ok(outcome(status, ServiceAction::None));
                }

                info!("Starting '{name}'");
                let code = match manager.start(name) {
                    Ok(code) => code,
                    Err(err) => {
                        error!("{err}");
                        None
                    }
                };

                if code == Some(0) {
                    writeln!(out, "{name} started")?;
                    Ok(outcome(status, ServiceAction::Started))
                } else {
                    let shown = code.map_or_else(|| "none".to_string(), |c| c.to_string());
                    error!("Start command for '{name}' exited with status {shown}");
                    writeln!(out, "{name} failed to start (exit status {shown})")?;
                    Ok(outcome(status, ServiceAction::StartFailed(code)))
                }
            }
        }
    }
}
