//! `portico restart-all` — restart every registered instance on its
//! recorded port.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::fleet;
use crate::domain::config::STOP_TIMEOUT;
use crate::infra::probe::SignalProbe;
use crate::infra::spawner::DetachedSpawner;

/// Run `portico restart-all`.
///
/// # Errors
///
/// Returns an error if the registry cannot be rewritten.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let tally = fleet::restart_all(
        &SignalProbe,
        &DetachedSpawner,
        &app.registry,
        &app.resolver,
        &app.settings,
        STOP_TIMEOUT,
    )
    .await?;

    let ctx = &app.output;
    for warning in &tally.warnings {
        ctx.warn(warning);
    }
    ctx.info(&format!(
        "Restarted: {}, Failed: {}",
        tally.succeeded, tally.failed
    ));

    if tally.all_ok() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
