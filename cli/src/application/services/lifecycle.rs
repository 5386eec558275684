//! Single-instance lifecycle: start, stop, termination protocol, restart
//! target resolution.
//!
//! Imports only from `crate::domain`, `crate::application::ports`, and the
//! file-backed infra components.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::application::ports::{DaemonSpawner, PortScanner, ProcessProbe};
use crate::domain::config::{KILL_GRACE, POLL_INTERVAL, PORT_SCAN_ATTEMPTS, STOP_TIMEOUT};
use crate::domain::{Instance, InstanceError, Settings};
use crate::infra::daemon::{DaemonController, SpawnOptions};
use crate::infra::registry::{InstanceRegistry, pid_i32};

/// How a `start` invocation wants its instance placed.
#[derive(Debug, Clone)]
pub struct StartRequest {
    /// Workspace recorded in the registry (the invocation's project root).
    pub workspace: PathBuf,
    /// Port pinned by the caller, if any.
    pub explicit_port: Option<u16>,
    /// Pass `--debug` through to the server.
    pub debug: bool,
    /// Dedicated per-workspace instance (registry-backed, port-scoped
    /// files) rather than the default global instance.
    pub dedicated: bool,
}

/// Result of a `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// An instance already serves this target; nothing was spawned.
    AlreadyRunning { port: u16, pid: u32 },
    /// A fresh process was spawned.
    Started { port: u16, pid: u32 },
}

/// Result of a `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// No PID file existed.
    NotRunning,
    /// A PID file existed but its process was already dead; state removed.
    StaleCleaned,
    /// The process was terminated and state removed.
    Stopped { pid: u32 },
    /// The process survived both signals; state left intact for a retry.
    TimedOut { pid: u32 },
}

/// Graceful-then-forceful termination with bounded polling.
///
/// Sends the termination signal and polls liveness until `timeout` elapses;
/// if the process is still alive, escalates to the kill signal and polls
/// for a short fixed grace period. An already-dead process resolves to
/// `true` immediately, with no waiting.
pub async fn terminate_with_timeout(
    probe: &impl ProcessProbe,
    pid: i32,
    timeout: Duration,
) -> bool {
    if !probe.send_term(pid) {
        return true;
    }
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !probe.is_running(pid) {
            return true;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    if !probe.is_running(pid) {
        return true;
    }
    if !probe.send_kill(pid) {
        return true;
    }
    let deadline = Instant::now() + KILL_GRACE;
    while Instant::now() < deadline {
        if !probe.is_running(pid) {
            return true;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    !probe.is_running(pid)
}

/// Start an instance.
///
/// Global mode reuses the default PID file (or the port-scoped one when a
/// port is pinned) and treats a live process there as idempotent success.
/// Dedicated mode reconciles any existing record for
/// the workspace (replacing a live instance, cleaning up a dead orphan and
/// reusing its port), runs stale cleanup, resolves a port, spawns, and
/// registers the result.
///
/// # Errors
///
/// Returns an error if an existing instance refuses to die, no free port is
/// found in the scan range, the spawn fails, or the registry cannot be
/// written.
#[allow(clippy::too_many_arguments)]
pub async fn start_instance(
    probe: &impl ProcessProbe,
    spawner: &impl DaemonSpawner,
    scanner: &impl PortScanner,
    controller: &DaemonController,
    registry: &InstanceRegistry,
    settings: &Settings,
    req: &StartRequest,
) -> Result<StartOutcome> {
    if !req.dedicated {
        return start_global(probe, spawner, controller, registry, settings, req);
    }

    let mut reuse_port = None;
    if let Some(existing) = registry.find_by_workspace(&req.workspace) {
        let alive = probe.is_running(pid_i32(existing.pid));
        let pinned_elsewhere = req
            .explicit_port
            .is_some_and(|p| p != existing.port);
        if alive && pinned_elsewhere {
            // The caller wants a second instance on a different port; the
            // existing one keeps running.
        } else {
            if alive
                && !terminate_with_timeout(probe, pid_i32(existing.pid), STOP_TIMEOUT).await
            {
                return Err(InstanceError::TerminateTimeout {
                    pid: existing.pid,
                    timeout_ms: STOP_TIMEOUT.as_millis(),
                }
                .into());
            }
            controller.remove_pid_file(Some(existing.port));
            registry.unregister(existing.port)?;
            reuse_port = Some(existing.port);
        }
    }

    registry.clean_stale(probe)?;

    let port = match req.explicit_port.or(reuse_port) {
        Some(port) => port,
        None => auto_select_port(scanner, settings)?,
    };

    let opts = SpawnOptions {
        host: settings.host.clone(),
        port,
        debug: req.debug,
    };
    let pid = controller.spawn_daemon(spawner, settings, &opts, Some(port))?;
    registry.register(Instance::new(req.workspace.clone(), port, pid))?;
    Ok(StartOutcome::Started { port, pid })
}

/// An explicit port keys the PID file to that port, so a later
/// `stop --port N` or a port-pinned restart finds the process it spawned;
/// only a portless start owns the default `portico.pid`.
fn start_global(
    probe: &impl ProcessProbe,
    spawner: &impl DaemonSpawner,
    controller: &DaemonController,
    registry: &InstanceRegistry,
    settings: &Settings,
    req: &StartRequest,
) -> Result<StartOutcome> {
    let port = req.explicit_port.unwrap_or(settings.default_port);
    let pid_scope = req.explicit_port;
    if let Some(pid) = controller.read_pid(pid_scope) {
        if probe.is_running(pid_i32(pid)) {
            return Ok(StartOutcome::AlreadyRunning { port, pid });
        }
        controller.remove_pid_file(pid_scope);
    }
    registry.clean_stale(probe)?;

    let opts = SpawnOptions {
        host: settings.host.clone(),
        port,
        debug: req.debug,
    };
    let pid = controller.spawn_daemon(spawner, settings, &opts, pid_scope)?;
    Ok(StartOutcome::Started { port, pid })
}

/// Scan for a free port: one above the default when something already holds
/// the default (a global instance, typically), otherwise from the default.
fn auto_select_port(scanner: &impl PortScanner, settings: &Settings) -> Result<u16> {
    let default = settings.default_port;
    let start = if scanner.find_available(default, 1).is_none() {
        default.saturating_add(1)
    } else {
        default
    };
    scanner
        .find_available(start, PORT_SCAN_ATTEMPTS)
        .ok_or_else(|| {
            InstanceError::PortExhausted {
                start,
                end: start.saturating_add(PORT_SCAN_ATTEMPTS - 1),
            }
            .into()
        })
}

/// Stop the instance recorded in `pid_scope`'s PID file (`None` selects the
/// default instance).
///
/// The matching registry entry is unregistered on every success path,
/// including "nothing was running" — this makes `stop` self-healing against
/// processes killed outside the tool. On a termination timeout the PID file
/// and registry entry are left intact so a retry can pick up where this
/// attempt left off.
///
/// # Errors
///
/// Returns an error if the registry cannot be rewritten.
pub async fn stop_instance(
    probe: &impl ProcessProbe,
    controller: &DaemonController,
    registry: &InstanceRegistry,
    pid_scope: Option<u16>,
    registry_port: u16,
    timeout: Duration,
) -> Result<StopOutcome> {
    let Some(pid) = controller.read_pid(pid_scope) else {
        registry.unregister(registry_port)?;
        return Ok(StopOutcome::NotRunning);
    };

    if !probe.is_running(pid_i32(pid)) {
        controller.remove_pid_file(pid_scope);
        registry.unregister(registry_port)?;
        return Ok(StopOutcome::StaleCleaned);
    }

    if terminate_with_timeout(probe, pid_i32(pid), timeout).await {
        controller.remove_pid_file(pid_scope);
        registry.unregister(registry_port)?;
        Ok(StopOutcome::Stopped { pid })
    } else {
        Ok(StopOutcome::TimedOut { pid })
    }
}

/// Where a `restart` should aim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartTarget {
    pub port: u16,
    /// PID file scope; `None` is the default instance's file.
    pub pid_scope: Option<u16>,
    /// Restart as a dedicated instance (re-registers the workspace).
    pub dedicated: bool,
}

/// Resolve the restart target: explicit port beats the workspace's
/// registered port beats the default. Only a workspace-derived port makes
/// the restart a dedicated one.
#[must_use]
pub fn resolve_restart_target(
    registry: &InstanceRegistry,
    settings: &Settings,
    explicit_port: Option<u16>,
    workspace: &Path,
) -> RestartTarget {
    if let Some(port) = explicit_port {
        return RestartTarget {
            port,
            pid_scope: Some(port),
            dedicated: false,
        };
    }
    if let Some(record) = registry.find_by_workspace(workspace) {
        return RestartTarget {
            port: record.port,
            pid_scope: Some(record.port),
            dedicated: true,
        };
    }
    RestartTarget {
        port: settings.default_port,
        pid_scope: None,
        dedicated: false,
    }
}
