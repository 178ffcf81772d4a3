use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::info;

use crate::aliases::AliasTier;
use crate::config::{self, ConfigError};
use crate::core_service::{CoreService, ServiceError};
use crate::discovery::SourceOutcome;
use crate::logging::{self, LogConfig};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
    #[error("application not found: {0}")]
    NotFound(String),
    #[error("path rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Parser)]
#[command(name = "yuko-core", about = "Resolve and launch installed applications by spoken name")]
pub struct Cli {
    /// Config file (defaults to the per-user data directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Rebuild the application catalog
    Index,
    /// Print the launch target for a spoken name
    Resolve {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Resolve and start an application; arguments after `--` are passed through
    Launch {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Map a spoken phrase to a catalog name
    Teach { spoken: String, canonical: String },
    /// List static and learned aliases
    Aliases,
    /// List cached application paths
    Cached,
    /// Cache an executable path under a name
    Register { name: String, path: String },
    /// Run an action tag such as `open_app:discord`
    Tag { payload: String },
}

pub fn parse_cli_args(args: &[String]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("yuko-core".to_string()).chain(args.iter().cloned()))
}

pub fn run_with_options(cli: Cli) -> Result<(), RuntimeError> {
    let config = config::load(cli.config.as_deref())?;
    if let Err(error) = logging::init(LogConfig::from_env(&config.logs_dir)) {
        eprintln!("[yuko-core] file logging disabled: {error}");
    }
    if !config.config_path.exists() {
        config::save(&config)?;
        info!(path = %config.config_path.display(), "wrote default config");
    }

    let mut service = CoreService::new(config)?;
    match cli.command {
        Command::Index => {
            let report = service.rebuild_index();
            for source in &report.sources {
                match &source.outcome {
                    SourceOutcome::Collected(entries) => {
                        println!("{:<20} {}", source.source, entries.len())
                    }
                    SourceOutcome::Skipped(reason) => {
                        println!("{:<20} skipped ({reason})", source.source)
                    }
                }
            }
            println!(
                "{} entries -> {}",
                report.entries.len(),
                service.config().catalog_path.display()
            );
        }
        Command::Resolve { name } => {
            let name = name.join(" ");
            let resolution = service
                .resolve(&name)
                .ok_or_else(|| RuntimeError::NotFound(name.clone()))?;
            match resolution.score {
                Some(score) => println!(
                    "{} ({}, score {score:.2})",
                    resolution.target,
                    resolution.source.label()
                ),
                None => println!("{} ({})", resolution.target, resolution.source.label()),
            }
        }
        Command::Launch { name, args } => {
            let resolution = service.launch(&name.join(" "), &args)?;
            println!("started {}", resolution.target);
        }
        Command::Teach { spoken, canonical } => {
            if service.teach_alias(&spoken, &canonical) {
                println!("learned: {spoken} -> {canonical}");
            } else {
                println!("unchanged");
            }
        }
        Command::Aliases => {
            for alias in service.list_aliases() {
                let tier = match alias.tier {
                    AliasTier::Static => "static",
                    AliasTier::Dynamic => "learned",
                };
                println!("{tier:<8} {} -> {}", alias.spoken, alias.canonical);
            }
        }
        Command::Cached => {
            for app in service.registered_apps() {
                let marker = if app.valid { "ok" } else { "stale" };
                println!("{marker:<6} {} -> {}", app.name, app.path);
            }
        }
        Command::Register { name, path } => match service.register_app(&name, &path) {
            Ok(true) => println!("registered {name}"),
            Ok(false) => println!("unchanged"),
            Err(ServiceError::RejectedPath(path)) => return Err(RuntimeError::Rejected(path)),
            Err(error) => return Err(error.into()),
        },
        Command::Tag { payload } => {
            let resolution = service.execute_action_tag(&payload)?;
            println!("started {}", resolution.target);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_cli_args, Command};

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn multi_word_names_are_joined_by_callers() {
        let cli = parse_cli_args(&args(&["resolve", "escape", "from", "tarkov"])).unwrap();
        assert_eq!(
            cli.command,
            Command::Resolve {
                name: args(&["escape", "from", "tarkov"])
            }
        );
    }

    #[test]
    fn launch_arguments_follow_double_dash() {
        let cli = parse_cli_args(&args(&["launch", "obs", "--", "--startrecording"])).unwrap();
        assert_eq!(
            cli.command,
            Command::Launch {
                name: args(&["obs"]),
                args: args(&["--startrecording"])
            }
        );
    }

    #[test]
    fn config_flag_is_global() {
        let cli = parse_cli_args(&args(&["cached", "--config", "/tmp/yuko.toml"])).unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/yuko.toml")));
        assert_eq!(cli.command, Command::Cached);
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(parse_cli_args(&[]).is_err());
    }
}
