//! Detached process spawning — implements the `DaemonSpawner` port.
//!
//! The child is placed in its own process group so it survives this CLI
//! exiting (and is not reaped by the shell's job control), stdin is closed,
//! and both output streams are appended to the instance log.

use std::fs::OpenOptions;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

use crate::application::ports::{DaemonSpawner, SpawnRequest};

/// Production spawner using `std::process` with POSIX detach semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedSpawner;

impl DaemonSpawner for DetachedSpawner {
    fn spawn_detached(&self, req: &SpawnRequest<'_>) -> Result<u32> {
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(req.log_path)
            .with_context(|| format!("opening log file {}", req.log_path.display()))?;
        let log_err = log
            .try_clone()
            .context("duplicating log file descriptor")?;

        let mut cmd = Command::new(req.program);
        cmd.args(req.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));
        for (key, value) in req.env {
            cmd.env(key, value);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("spawning {}", req.program.display()))?;
        Ok(child.id())
    }
}
