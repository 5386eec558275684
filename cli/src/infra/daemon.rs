//! Daemon control — PID/log file management, spawn persistence, port scan.
//!
//! One controller per runtime directory. Paths are deterministic: the
//! default instance uses `portico.pid` / `portico.log`, a port-scoped
//! instance uses `portico-<port>.pid` / `portico-<port>.log` so that
//! multiple instances sharing a runtime directory never collide.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{DaemonSpawner, PortScanner, SpawnRequest};
use crate::domain::Settings;

/// Spawn parameters resolved by the caller.
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    /// Bind host, injected as `HOST`.
    pub host: String,
    /// Bind port, injected as `PORT`.
    pub port: u16,
    /// Pass `--debug` to the server.
    pub debug: bool,
}

/// Manages the PID file and log file of one runtime directory, and persists
/// spawn results there.
#[derive(Debug, Clone)]
pub struct DaemonController {
    runtime_dir: PathBuf,
}

impl DaemonController {
    #[must_use]
    pub fn new(runtime_dir: PathBuf) -> Self {
        Self { runtime_dir }
    }

    #[must_use]
    pub fn runtime_dir(&self) -> &Path {
        &self.runtime_dir
    }

    /// PID file path; `None` selects the default instance's file.
    #[must_use]
    pub fn pid_file_path(&self, port: Option<u16>) -> PathBuf {
        self.runtime_dir.join(scoped_name("pid", port))
    }

    /// Log file path; `None` selects the default instance's file.
    #[must_use]
    pub fn log_file_path(&self, port: Option<u16>) -> PathBuf {
        self.runtime_dir.join(scoped_name("log", port))
    }

    /// Parse the PID file. Missing file or malformed content yields `None`,
    /// never an error.
    #[must_use]
    pub fn read_pid(&self, port: Option<u16>) -> Option<u32> {
        std::fs::read_to_string(self.pid_file_path(port))
            .ok()?
            .trim()
            .parse()
            .ok()
    }

    /// Persist the pid. A write failure degrades management capability but
    /// must not take the launched process down with it, so callers treat
    /// this as best-effort.
    ///
    /// # Errors
    ///
    /// Returns an error if the PID file cannot be written.
    pub fn write_pid(&self, pid: u32, port: Option<u16>) -> Result<()> {
        let path = self.pid_file_path(port);
        std::fs::write(&path, format!("{pid}\n"))
            .with_context(|| format!("writing PID file {}", path.display()))
    }

    /// Remove the PID file. Absence is not an error.
    pub fn remove_pid_file(&self, port: Option<u16>) {
        let _ = std::fs::remove_file(self.pid_file_path(port));
    }

    /// Launch the managed server detached, with `HOST`/`PORT` injected and
    /// output appended to the instance log, then persist the PID file
    /// immediately. `pid_scope` selects which PID file records the result
    /// (`None` for the default instance).
    ///
    /// # Errors
    ///
    /// Returns an error if the spawn fails; the failure is also appended to
    /// the log file for post-mortem inspection.
    pub fn spawn_daemon(
        &self,
        spawner: &impl DaemonSpawner,
        settings: &Settings,
        opts: &SpawnOptions,
        pid_scope: Option<u16>,
    ) -> Result<u32> {
        let log_path = self.log_file_path(pid_scope);
        let env = vec![
            ("HOST".to_string(), opts.host.clone()),
            ("PORT".to_string(), opts.port.to_string()),
        ];
        let args: Vec<String> = if opts.debug {
            vec!["--debug".to_string()]
        } else {
            Vec::new()
        };
        let req = SpawnRequest {
            program: &settings.server_bin,
            args: &args,
            env: &env,
            log_path: &log_path,
        };

        match spawner.spawn_detached(&req) {
            Ok(pid) => {
                if let Err(e) = self.write_pid(pid, pid_scope) {
                    self.append_to_log(&log_path, &format!("portico: {e:#}"));
                }
                Ok(pid)
            }
            Err(e) => {
                self.append_to_log(&log_path, &format!("portico: spawn failed: {e:#}"));
                Err(e)
            }
        }
    }

    fn append_to_log(&self, log_path: &Path, line: &str) {
        if let Ok(mut f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
        {
            let _ = writeln!(f, "{line}");
        }
    }
}

fn scoped_name(ext: &str, port: Option<u16>) -> String {
    match port {
        Some(p) => format!("portico-{p}.{ext}"),
        None => format!("portico.{ext}"),
    }
}

// ── Port scanning ─────────────────────────────────────────────────────────────

/// Bind-and-release scanner over the loopback interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpPortScanner;

impl PortScanner for TcpPortScanner {
    fn find_available(&self, start: u16, attempts: u16) -> Option<u16> {
        for offset in 0..attempts {
            let port = start.checked_add(offset)?;
            if std::net::TcpListener::bind(("127.0.0.1", port)).is_ok() {
                return Some(port);
            }
        }
        None
    }
}
