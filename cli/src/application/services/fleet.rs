//! Fleet operations across every registered instance: list, stop-all,
//! restart-all.

use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::application::ports::{DaemonSpawner, ProcessProbe};
use crate::application::services::lifecycle::terminate_with_timeout;
use crate::domain::{Instance, Settings};
use crate::infra::daemon::{DaemonController, SpawnOptions};
use crate::infra::registry::{InstanceRegistry, pid_i32};
use crate::infra::runtime_dir::RuntimeDirResolver;

/// One registry record annotated with observed liveness.
#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    #[serde(flatten)]
    pub instance: Instance,
    pub running: bool,
}

/// Read-only view produced by `list`.
#[derive(Debug, Clone, Serialize)]
pub struct ListSnapshot {
    /// PID recorded for the default instance, if its PID file exists.
    pub default_pid: Option<u32>,
    /// Whether that pid passed the liveness probe.
    pub default_running: bool,
    pub entries: Vec<ListEntry>,
}

/// Observe the default instance and every registry record. Strictly
/// read-only: stale entries are annotated, never removed.
#[must_use]
pub fn list_instances(
    probe: &impl ProcessProbe,
    controller: &DaemonController,
    registry: &InstanceRegistry,
) -> ListSnapshot {
    let default_pid = controller.read_pid(None);
    let default_running = default_pid.is_some_and(|pid| probe.is_running(pid_i32(pid)));
    let entries = registry
        .read()
        .into_iter()
        .map(|instance| {
            let running = !instance.is_stopped() && probe.is_running(pid_i32(instance.pid));
            ListEntry { instance, running }
        })
        .collect();
    ListSnapshot {
        default_pid,
        default_running,
        entries,
    }
}

/// Counts reported by a bulk operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetTally {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Non-fatal problems encountered along the way.
    pub warnings: Vec<String>,
}

impl FleetTally {
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.failed == 0
    }
}

/// Stop every running registered instance.
///
/// Stopped records are soft-marked rather than removed, so a later
/// `restart-all` can bring the fleet back on the same ports. Finishes with
/// a stale sweep.
///
/// # Errors
///
/// Returns an error if the registry cannot be rewritten.
pub async fn stop_all(
    probe: &impl ProcessProbe,
    registry: &InstanceRegistry,
    resolver: &RuntimeDirResolver,
    timeout: Duration,
) -> Result<FleetTally> {
    let mut tally = FleetTally::default();
    for record in registry.read() {
        if record.is_stopped() || !probe.is_running(pid_i32(record.pid)) {
            tally.skipped += 1;
            continue;
        }
        if terminate_with_timeout(probe, pid_i32(record.pid), timeout).await {
            let controller = DaemonController::new(resolver.resolve_for_workspace(&record.workspace));
            controller.remove_pid_file(Some(record.port));
            registry.mark_stopped(&record.workspace)?;
            tally.succeeded += 1;
        } else {
            tally.warnings.push(format!(
                "process {} (port {}) did not exit in time",
                record.pid, record.port
            ));
            tally.failed += 1;
        }
    }
    registry.clean_stale(probe)?;
    Ok(tally)
}

/// Restart every registered instance on its recorded workspace and port.
///
/// A record whose old process refuses to die is still restarted — the
/// failure is carried as a warning, matching the "keep the fleet moving"
/// contract of a bulk restart.
///
/// # Errors
///
/// Returns an error if the registry cannot be rewritten.
pub async fn restart_all(
    probe: &impl ProcessProbe,
    spawner: &impl DaemonSpawner,
    registry: &InstanceRegistry,
    resolver: &RuntimeDirResolver,
    settings: &Settings,
    timeout: Duration,
) -> Result<FleetTally> {
    let mut tally = FleetTally::default();
    for record in registry.read() {
        if probe.is_running(pid_i32(record.pid))
            && !terminate_with_timeout(probe, pid_i32(record.pid), timeout).await
        {
            tally.warnings.push(format!(
                "process {} (port {}) did not exit; starting a replacement anyway",
                record.pid, record.port
            ));
        }

        let controller = DaemonController::new(resolver.resolve_for_workspace(&record.workspace));
        let opts = SpawnOptions {
            host: settings.host.clone(),
            port: record.port,
            debug: false,
        };
        match controller.spawn_daemon(spawner, settings, &opts, Some(record.port)) {
            Ok(pid) => {
                registry.register(Instance::new(record.workspace.clone(), record.port, pid))?;
                tally.succeeded += 1;
            }
            Err(e) => {
                tally.warnings.push(format!(
                    "restart of {} (port {}) failed: {e:#}",
                    record.workspace.display(),
                    record.port
                ));
                tally.failed += 1;
            }
        }
    }
    Ok(tally)
}
