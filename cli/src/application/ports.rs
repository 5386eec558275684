//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! Process signalling, detached spawning, and port scanning all live behind
//! traits so orchestration logic can be exercised with fakes, and so a
//! non-POSIX target can substitute a process-table query without touching
//! the services.

use std::path::Path;

use anyhow::Result;

// ── Process Probe Port ────────────────────────────────────────────────────────

/// Zero-effect liveness probing and signal delivery for OS processes.
pub trait ProcessProbe {
    /// Whether `pid` currently refers to a live process.
    ///
    /// `pid <= 0` is always `false`. "Operation not permitted" counts as
    /// alive — the process exists, it just belongs to another user. Refusing
    /// to double-start is safer than silently spawning a duplicate.
    fn is_running(&self, pid: i32) -> bool;

    /// Send the graceful-termination signal.
    ///
    /// Returns `false` when the process did not exist (already dead), `true`
    /// when the signal was delivered or at least attempted.
    fn send_term(&self, pid: i32) -> bool;

    /// Send the forceful-kill signal. Same return convention as
    /// [`ProcessProbe::send_term`].
    fn send_kill(&self, pid: i32) -> bool;
}

// ── Daemon Spawner Port ───────────────────────────────────────────────────────

/// What to launch, with which environment, and where its output goes.
#[derive(Debug)]
pub struct SpawnRequest<'a> {
    /// Server entry point.
    pub program: &'a Path,
    /// Extra command-line arguments.
    pub args: &'a [String],
    /// Environment injected into the child (at minimum `HOST`/`PORT`).
    pub env: &'a [(String, String)],
    /// Log file receiving the child's stdout and stderr, opened for append.
    pub log_path: &'a Path,
}

/// Launches the managed server as a detached child that survives this CLI
/// process exiting.
pub trait DaemonSpawner {
    /// Spawn the request and return the child's pid.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be opened or the process
    /// cannot be spawned.
    fn spawn_detached(&self, req: &SpawnRequest<'_>) -> Result<u32>;
}

// ── Port Scanner Port ─────────────────────────────────────────────────────────

/// Sequential free-port discovery.
///
/// Bind-then-release is inherently racy against concurrent binders; that is
/// accepted for a single-operator local tool and explicitly not a
/// transactional reservation.
pub trait PortScanner {
    /// First port in `start..start + attempts` that can be bound, if any.
    fn find_available(&self, start: u16, attempts: u16) -> Option<u16>;
}
