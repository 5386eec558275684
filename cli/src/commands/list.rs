//! `portico list` — show every known instance. Strictly read-only.

use std::process::ExitCode;

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::application::services::fleet;
use crate::infra::probe::SignalProbe;

/// Run `portico list`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    let snapshot = fleet::list_instances(&SignalProbe, &app.controller()?, &app.registry);

    if app.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).context("serializing instance list")?
        );
        return Ok(ExitCode::SUCCESS);
    }

    let ctx = &app.output;
    ctx.header("Instances");

    match snapshot.default_pid {
        Some(pid) if snapshot.default_running => {
            ctx.kv("default", &format!("running (pid {pid})"));
        }
        Some(pid) => ctx.kv("default", &format!("stale (pid {pid})")),
        None => ctx.kv("default", "not running"),
    }

    if snapshot.entries.is_empty() {
        ctx.info("No registered instances.");
        return Ok(ExitCode::SUCCESS);
    }

    for entry in &snapshot.entries {
        let state = if entry.running {
            "running".to_string()
        } else if entry.instance.is_stopped() {
            "stopped".to_string()
        } else {
            "stale".to_string()
        };
        ctx.kv(
            &format!("port {}", entry.instance.port),
            &format!(
                "{}  {} (pid {})",
                state,
                entry.instance.workspace.display(),
                entry.instance.pid
            ),
        );
    }
    Ok(ExitCode::SUCCESS)
}
