use std::{
    io::{self, Write},
    process::ExitCode,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use hostkeep::{
    backup::{self, BackupCollector, ExtensionFilter},
    cli::{Cli, Commands, parse_args},
    config::{Config, load_config},
    constants::DEFAULT_LOG_FILTER,
    error::HostkeepError,
    logs::{self, LogAnalyzer},
    services::{CommandServiceManager, FixedAnswer, LinePrompter, Prompter, ServiceSupervisor},
};

fn main() -> ExitCode {
    let args = parse_args();
    init_logging(&args);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!("Exiting with status {}: {err:?}", err.exit_code());
            eprintln!("Error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn init_logging(args: &Cli) {
    let filter = if let Some(level) = args.log_level {
        EnvFilter::new(level.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(args: Cli) -> Result<(), HostkeepError> {
    let config = load_config(args.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Commands::Logs { path, top, json } => {
            let analyzer = LogAnalyzer::new(top.unwrap_or(config.logs.top));
            let entries = analyzer.analyze(&path)?;
            info!("Reporting {} address(es) from {}", entries.len(), path.display());

            if json {
                logs::write_json_report(&mut out, &entries)?;
            } else {
                logs::write_report(&mut out, &entries)?;
            }
        }
        Commands::Services {
            names,
            manager,
            yes,
            no_prompt,
            json,
        } => {
            let prompter: Box<dyn Prompter> = if yes {
                Box::new(FixedAnswer(true))
            } else if no_prompt {
                Box::new(FixedAnswer(false))
            } else {
                Box::new(LinePrompter::stdio())
            };
            run_services(&config, names, manager, prompter, json, &mut out)?;
        }
        Commands::Backup {
            source,
            extensions,
            dest,
            json,
        } => {
            let filter = ExtensionFilter::parse(&extensions)?;
            let destination_root = dest.unwrap_or_else(|| config.backup.destination.clone());
            let collector =
                BackupCollector::new(source, filter, destination_root, &config.backup.prefix);

            let report = collector.run()?;
            if json {
                serde_json::to_writer_pretty(&mut out, &report)?;
                writeln!(out)?;
            } else {
                backup::write_report(&mut out, &report)?;
            }
            report.into_result()?;
        }
    }

    Ok(())
}

fn run_services<W: Write>(
    config: &Config,
    names: Vec<String>,
    manager: Option<String>,
    prompter: Box<dyn Prompter>,
    json: bool,
    out: &mut W,
) -> Result<(), HostkeepError> {
    let names = if names.is_empty() {
        config.services.names.clone()
    } else {
        names
    };
    if names.is_empty() {
        warn!("No services named on the command line or in the configuration");
        return Ok(());
    }

    let manager = manager.unwrap_or_else(|| config.services.manager.clone());
    debug!("Checking {} service(s) with '{manager}'", names.len());

    let mut supervisor =
        ServiceSupervisor::new(names, CommandServiceManager::new(manager), prompter);
    let report = if json {
        let report = supervisor.run(&mut io::sink())?;
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        report
    } else {
        supervisor.run(&mut *out)?
    };

    match report.first_failure() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
