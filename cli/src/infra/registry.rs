//! The instance registry — a durable, file-backed table of instance records
//! shared across CLI invocations.
//!
//! The registry is the sole source of truth for *what instances exist*; it
//! is never the source of truth for *what is alive* — "running" is computed
//! at read time against a [`ProcessProbe`]. Writes go through an atomic
//! temp-file-then-rename so a concurrent reader never observes a
//! half-written file. There is no locking: two invocations racing on
//! read-modify-write can both observe "port free" — an accepted limitation
//! for a single-operator local tool, not a defect to fix with distributed
//! locking.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::application::ports::ProcessProbe;
use crate::domain::Instance;

/// File name of the registry inside the portico home directory.
const REGISTRY_FILE: &str = "instances.json";

/// File name of the legacy single global PID file (pre-multi-instance).
pub const LEGACY_PID_FILE: &str = "daemon.pid";

/// Resolve the portico home directory: `PORTICO_HOME` when set, otherwise
/// `~/.portico`.
///
/// # Errors
///
/// Returns an error if neither `PORTICO_HOME` nor the home directory can be
/// determined.
pub fn portico_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os("PORTICO_HOME") {
        return Ok(PathBuf::from(home));
    }
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".portico"))
}

/// File-backed registry of [`Instance`] records, keyed by port.
pub struct InstanceRegistry {
    path: PathBuf,
}

impl InstanceRegistry {
    /// Create a registry at the default path (`<portico home>/instances.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(portico_home()?.join(REGISTRY_FILE)))
    }

    /// Create a registry with an explicit path (used in tests).
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records. Missing file or malformed content degrades to an
    /// empty list, never an error — the next successful write repairs it.
    #[must_use]
    pub fn read(&self) -> Vec<Instance> {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Replace the registry contents atomically (temp file + rename) with
    /// owner-only permissions.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written or renamed into place.
    pub fn write(&self, records: &[Instance]) -> Result<()> {
        let parent = self.path.parent().context("registry path has no parent")?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700));
        }

        let content = serde_json::to_string_pretty(records).context("serializing registry")?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("creating temp file in {}", parent.display()))?;
        tmp.write_all(content.as_bytes())
            .context("writing registry temp file")?;
        tmp.persist(&self.path)
            .with_context(|| format!("replacing registry {}", self.path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", self.path.display()))?;
        }
        Ok(())
    }

    /// Upsert by port: any existing record with the same port is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewrite fails.
    pub fn register(&self, entry: Instance) -> Result<()> {
        let mut records = self.read();
        records.retain(|r| r.port != entry.port);
        records.push(entry);
        self.write(&records)
    }

    /// Remove the record with this port. Absence is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewrite fails.
    pub fn unregister(&self, port: u16) -> Result<()> {
        let records = self.read();
        let remaining: Vec<Instance> = records
            .iter()
            .filter(|r| r.port != port)
            .cloned()
            .collect();
        if remaining.len() == records.len() {
            return Ok(());
        }
        self.write(&remaining)
    }

    /// Find the record for a workspace: exact path match first, then the
    /// longest registered ancestor — so invoking from a subdirectory of a
    /// registered project still finds its instance. Records without
    /// `stopped_at` win over soft-stopped ones.
    #[must_use]
    pub fn find_by_workspace(&self, workspace: &Path) -> Option<Instance> {
        let query = normalize(workspace);
        let records = self.read();

        let best = |candidates: Vec<&Instance>| -> Option<Instance> {
            candidates
                .into_iter()
                .max_by_key(|r| {
                    (
                        !r.is_stopped(),
                        normalize(&r.workspace).components().count(),
                        r.started_at,
                    )
                })
                .cloned()
        };

        let exact: Vec<&Instance> = records
            .iter()
            .filter(|r| normalize(&r.workspace) == query)
            .collect();
        if !exact.is_empty() {
            return best(exact);
        }

        let ancestors: Vec<&Instance> = records
            .iter()
            .filter(|r| {
                let ws = normalize(&r.workspace);
                ws != query && query.starts_with(&ws)
            })
            .collect();
        best(ancestors)
    }

    /// Drop records whose pid fails the liveness probe, except soft-stopped
    /// records (those are retained deliberately so `restart-all` can reuse
    /// their port). Rewrites only when something changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewrite fails.
    pub fn clean_stale(&self, probe: &impl ProcessProbe) -> Result<usize> {
        let records = self.read();
        let kept: Vec<Instance> = records
            .iter()
            .filter(|r| r.is_stopped() || probe.is_running(pid_i32(r.pid)))
            .cloned()
            .collect();
        let removed = records.len() - kept.len();
        if removed > 0 {
            self.write(&kept)?;
        }
        Ok(removed)
    }

    /// Soft-stop: annotate the workspace's record with `stopped_at` without
    /// removing it. Returns whether a record was marked.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewrite fails.
    pub fn mark_stopped(&self, workspace: &Path) -> Result<bool> {
        let query = normalize(workspace);
        let mut records = self.read();
        let mut marked = false;
        for record in &mut records {
            if normalize(&record.workspace) == query && !record.is_stopped() {
                record.stopped_at = Some(Utc::now());
                marked = true;
            }
        }
        if marked {
            self.write(&records)?;
        }
        Ok(marked)
    }
}

/// Convert a stored pid for probing; pids beyond `i32` are treated as dead.
#[must_use]
pub fn pid_i32(pid: u32) -> i32 {
    i32::try_from(pid).unwrap_or(-1)
}

/// Logical path normalization: absolutize against the current directory and
/// resolve `.`/`..` components without touching the filesystem — the
/// workspace of a dead instance may no longer exist, so `canonicalize` is
/// not an option.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
