//! Migration away from the legacy single global PID file.
//!
//! Early versions tracked exactly one daemon through `daemon.pid` in the
//! portico home. This service detects a leftover file, cleans it up when the
//! process is gone, and — only with explicit consent — terminates a daemon
//! that is still alive.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::ProcessProbe;
use crate::application::services::lifecycle::terminate_with_timeout;
use crate::infra::registry::pid_i32;

/// Result of a migration check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateOutcome {
    /// No legacy PID file exists.
    NothingToDo,
    /// The legacy file pointed at a dead process and was removed.
    CleanedStale,
    /// A legacy daemon is alive; rerun with the force flag to migrate.
    LiveNeedsForce { pid: u32 },
    /// The legacy daemon was terminated and its file removed.
    Migrated { pid: u32 },
    /// Force was given but the legacy daemon would not die.
    ForceFailed { pid: u32 },
}

/// Inspect the legacy PID file and migrate if possible.
///
/// # Errors
///
/// Returns an error if the legacy file exists but cannot be removed.
pub async fn migrate_legacy(
    probe: &impl ProcessProbe,
    legacy_path: &Path,
    force: bool,
    timeout: Duration,
) -> Result<MigrateOutcome> {
    let pid: Option<u32> = std::fs::read_to_string(legacy_path)
        .ok()
        .and_then(|s| s.trim().parse().ok());

    let Some(pid) = pid else {
        if legacy_path.exists() {
            // Unparseable leftover; treat like a stale file.
            remove(legacy_path)?;
            return Ok(MigrateOutcome::CleanedStale);
        }
        return Ok(MigrateOutcome::NothingToDo);
    };

    if !probe.is_running(pid_i32(pid)) {
        remove(legacy_path)?;
        return Ok(MigrateOutcome::CleanedStale);
    }

    if !force {
        return Ok(MigrateOutcome::LiveNeedsForce { pid });
    }

    if terminate_with_timeout(probe, pid_i32(pid), timeout).await {
        remove(legacy_path)?;
        Ok(MigrateOutcome::Migrated { pid })
    } else {
        Ok(MigrateOutcome::ForceFailed { pid })
    }
}

fn remove(path: &Path) -> Result<()> {
    std::fs::remove_file(path)
        .map_err(|e| anyhow::anyhow!("removing legacy PID file {}: {e}", path.display()))
}
