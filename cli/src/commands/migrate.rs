//! `portico migrate` — move off the legacy single-daemon setup.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::migrate::{self, MigrateOutcome};
use crate::domain::config::STOP_TIMEOUT;
use crate::infra::probe::SignalProbe;
use crate::infra::registry::{LEGACY_PID_FILE, portico_home};
use crate::output::OutputContext;

/// Arguments for the migrate command.
#[derive(Args, Default)]
pub struct MigrateArgs {
    /// Terminate a still-running legacy daemon
    #[arg(long)]
    pub force: bool,
}

/// Run `portico migrate`.
///
/// # Errors
///
/// Returns an error if the legacy PID file cannot be removed.
pub async fn run(app: &AppContext, args: &MigrateArgs) -> Result<ExitCode> {
    let legacy_path = portico_home()?.join(LEGACY_PID_FILE);
    let outcome = migrate::migrate_legacy(&SignalProbe, &legacy_path, args.force, STOP_TIMEOUT)
        .await?;

    let ctx = &app.output;
    match outcome {
        MigrateOutcome::NothingToDo => {
            ctx.info("No legacy daemon state found; nothing to migrate.");
            Ok(ExitCode::SUCCESS)
        }
        MigrateOutcome::CleanedStale => {
            ctx.success("Removed stale legacy PID file.");
            Ok(ExitCode::SUCCESS)
        }
        MigrateOutcome::LiveNeedsForce { pid } => {
            ctx.warn(&format!(
                "A legacy daemon is still running (pid {pid}). Rerun with --force to stop it."
            ));
            print_guidance(ctx);
            Ok(ExitCode::FAILURE)
        }
        MigrateOutcome::Migrated { pid } => {
            ctx.success(&format!("Stopped legacy daemon (pid {pid})."));
            print_guidance(ctx);
            Ok(ExitCode::SUCCESS)
        }
        MigrateOutcome::ForceFailed { pid } => {
            ctx.error(&format!("Legacy daemon (pid {pid}) did not exit in time."));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_guidance(ctx: &OutputContext) {
    ctx.kv("Find projects", "portico discover");
    ctx.kv("Per-project server", "portico start (inside a project)");
}
