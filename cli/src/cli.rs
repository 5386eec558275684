//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Project-scoped issue board server instances
#[derive(Parser)]
#[command(
    name = "portico",
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
    ///
    /// The `NO_COLOR` environment variable is honored at render time, not
    /// here: its conventional values ("1", anything non-empty) are not
    /// parseable as a bool flag.
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the server (per-project instance inside a project)
    Start(commands::start::StartArgs),

    /// Stop a running instance
    Stop(commands::stop::StopArgs),

    /// Stop, then start again
    Restart(commands::restart::RestartArgs),

    /// Show every known instance and its status
    List,

    /// Stop all registered instances
    StopAll,

    /// Restart all registered instances on their recorded ports
    RestartAll,

    /// Find project directories under the given roots
    Discover(commands::discover::DiscoverArgs),

    /// Migrate away from the legacy single-daemon setup
    Migrate(commands::migrate::MigrateArgs),

    /// Show the tail of an instance's log
    Logs(commands::logs::LogsArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            command,
        } = self;
        let app = AppContext::new(&AppFlags {
            no_color,
            quiet,
            json,
        })?;
        match command {
            Command::Start(args) => commands::start::run(&app, &args).await,
            Command::Stop(args) => commands::stop::run(&app, &args).await,
            Command::Restart(args) => commands::restart::run(&app, &args).await,
            Command::List => commands::list::run(&app),
            Command::StopAll => commands::stop_all::run(&app).await,
            Command::RestartAll => commands::restart_all::run(&app).await,
            Command::Discover(args) => commands::discover::run(&app, &args),
            Command::Migrate(args) => commands::migrate::run(&app, &args).await,
            Command::Logs(args) => commands::logs::run(&app, &args),
        }
    }
}
