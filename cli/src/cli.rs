//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;
use crate::domain::FlagOverrides;
use crate::infra::config::YamlConfigStore;

/// Per-user, per-project container environments on a podman host
#[derive(Parser)]
#[command(
    name = "studentbox",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Log orchestration steps to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Podman service URL
    #[arg(short, long, global = true, env = "STUDENTBOX_SOCKET")]
    pub socket: Option<String>,

    /// Absolute parent directory of the data path on the podman host
    #[arg(long = "hostpath", global = true, env = "HOSTPATH")]
    pub host_path: Option<PathBuf>,

    /// Data directory, relative to the host path
    #[arg(long = "datapath", global = true, env = "DATAPATH")]
    pub data_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List every managed container
    #[command(visible_alias = "ls")]
    List,

    /// Show the state of a project's containers
    Status(commands::Target),

    /// Spawn a runtime as a pod
    Spawn(commands::spawn::SpawnArgs),

    /// Spawn one container from an allow-listed image
    Run(commands::run::RunArgs),

    /// Show the live environment of a project's containers
    Envs(commands::envs::EnvsArgs),

    /// Remove a project's pod and containers
    #[command(visible_alias = "rm")]
    Remove(commands::Target),

    /// List available runtimes
    Runtimes,

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose: _,
            yes,
            socket,
            host_path,
            data_path,
            command,
        } = self;

        let flags = AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
            overrides: FlagOverrides {
                socket,
                host_path,
                data_path,
            },
        };
        let app = AppContext::new(&flags, &YamlConfigStore)?;

        match command {
            Command::Version => commands::version::run(&app),
            Command::Runtimes => commands::runtimes::run(&app),
            Command::List => commands::list::run(&app, &app.manager()?).await,
            Command::Status(target) => commands::status::run(&app, &app.manager()?, &target).await,
            Command::Spawn(args) => {
                let catalogue = app.catalogue()?;
                commands::spawn::run(&app, &app.manager()?, &catalogue, &args).await
            }
            Command::Run(args) => commands::run::run(&app, &app.manager()?, &args).await,
            Command::Envs(args) => commands::envs::run(&app, &app.manager()?, &args).await,
            Command::Remove(target) => commands::remove::run(&app, &app.manager()?, &target).await,
        }
    }
}
