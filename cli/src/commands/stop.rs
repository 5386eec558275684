//! `portico stop` — stop a running instance.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::lifecycle::{self, StopOutcome};
use crate::domain::config::STOP_TIMEOUT;
use crate::infra::probe::SignalProbe;

/// Arguments for the stop command.
#[derive(Args, Default)]
pub struct StopArgs {
    /// Port of the instance to stop (default instance when omitted)
    #[arg(long)]
    pub port: Option<u16>,
}

/// Run `portico stop`.
///
/// Exit codes: `0` on success (including "nothing on that port"), `1` when
/// the process refused to die, `2` when the default instance was simply not
/// running.
///
/// # Errors
///
/// Returns an error if the registry cannot be rewritten.
pub async fn run(app: &AppContext, args: &StopArgs) -> Result<ExitCode> {
    let registry_port = args.port.unwrap_or(app.settings.default_port);
    let outcome = lifecycle::stop_instance(
        &SignalProbe,
        &app.controller()?,
        &app.registry,
        args.port,
        registry_port,
        STOP_TIMEOUT,
    )
    .await?;

    let ctx = &app.output;
    match outcome {
        StopOutcome::NotRunning => {
            if let Some(port) = args.port {
                ctx.info(&format!("No instance on port {port}."));
                Ok(ExitCode::SUCCESS)
            } else {
                ctx.info("Server was not running.");
                Ok(ExitCode::from(2))
            }
        }
        StopOutcome::StaleCleaned => {
            ctx.info("Server was not running; cleaned up stale state.");
            Ok(ExitCode::SUCCESS)
        }
        StopOutcome::Stopped { pid } => {
            ctx.success(&format!("Server stopped (pid {pid})."));
            Ok(ExitCode::SUCCESS)
        }
        StopOutcome::TimedOut { pid } => {
            ctx.error(&format!(
                "Process {pid} did not exit in time; state kept for a retry."
            ));
            Ok(ExitCode::FAILURE)
        }
    }
}
