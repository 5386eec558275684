//! `portico restart` — stop, then start again on the same port.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::lifecycle::{self, StartOutcome, StartRequest, StopOutcome};
use crate::domain::config::STOP_TIMEOUT;
use crate::infra::daemon::TcpPortScanner;
use crate::infra::probe::SignalProbe;
use crate::infra::spawner::DetachedSpawner;

/// Arguments for the restart command.
#[derive(Args, Default)]
pub struct RestartArgs {
    /// Port of the instance to restart (workspace's instance, then the
    /// default, when omitted)
    #[arg(long)]
    pub port: Option<u16>,
}

/// Run `portico restart`.
///
/// # Errors
///
/// Returns an error if the old process refuses to die or the new one cannot
/// be spawned.
pub async fn run(app: &AppContext, args: &RestartArgs) -> Result<ExitCode> {
    let workspace = app.workspace()?;
    let target =
        lifecycle::resolve_restart_target(&app.registry, &app.settings, args.port, &workspace);
    let controller = app.controller()?;
    let ctx = &app.output;

    let stopped = lifecycle::stop_instance(
        &SignalProbe,
        &controller,
        &app.registry,
        target.pid_scope,
        target.port,
        STOP_TIMEOUT,
    )
    .await?;
    if let StopOutcome::TimedOut { pid } = stopped {
        ctx.error(&format!("Process {pid} did not exit; restart aborted."));
        return Ok(ExitCode::FAILURE);
    }

    // Pin the port only when the target did; a default-instance restart
    // must land back on the default PID file, not a port-scoped one.
    let req = StartRequest {
        workspace,
        explicit_port: target.pid_scope,
        debug: false,
        dedicated: target.dedicated,
    };
    let outcome = lifecycle::start_instance(
        &SignalProbe,
        &DetachedSpawner,
        &TcpPortScanner,
        &controller,
        &app.registry,
        &app.settings,
        &req,
    )
    .await?;

    match outcome {
        StartOutcome::Started { port, pid } | StartOutcome::AlreadyRunning { port, pid } => {
            ctx.success(&format!("Server restarted on port {port} (pid {pid})."));
        }
    }
    Ok(ExitCode::SUCCESS)
}
