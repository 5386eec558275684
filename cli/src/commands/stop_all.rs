//! `portico stop-all` — stop every running registered instance.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::fleet;
use crate::domain::config::STOP_TIMEOUT;
use crate::infra::probe::SignalProbe;

/// Run `portico stop-all`.
///
/// # Errors
///
/// Returns an error if the registry cannot be rewritten.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let tally = fleet::stop_all(&SignalProbe, &app.registry, &app.resolver, STOP_TIMEOUT).await?;

    let ctx = &app.output;
    for warning in &tally.warnings {
        ctx.warn(warning);
    }
    ctx.info(&format!(
        "Stopped: {}, Failed: {}, Skipped: {}",
        tally.succeeded, tally.failed, tally.skipped
    ));

    if tally.all_ok() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
