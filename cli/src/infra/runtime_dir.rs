//! Runtime directory resolution.
//!
//! Each instance gets one directory holding its PID file and log file.
//! Resolution order, first match wins:
//!
//! 1. explicit override (`PORTICO_RUNTIME_DIR`) — deliberate isolated mode;
//! 2. nearest ancestor of the working directory containing an `.issues`
//!    marker — one runtime directory per project;
//! 3. the global root (`PORTICO_HOME`), when set;
//! 4. the OS temporary-files root.

use std::path::{Path, PathBuf};

use crate::domain::config::{MARKER_DIR, MAX_ANCESTOR_STEPS};

/// Resolves the runtime directory for an invocation or a workspace.
///
/// Both inputs are explicit constructor parameters so tests can point the
/// resolver at temporary directories instead of mutating process-wide
/// environment state.
#[derive(Debug, Clone)]
pub struct RuntimeDirResolver {
    override_dir: Option<PathBuf>,
    global_root: Option<PathBuf>,
}

impl RuntimeDirResolver {
    #[must_use]
    pub fn new(override_dir: Option<PathBuf>, global_root: Option<PathBuf>) -> Self {
        Self {
            override_dir,
            global_root,
        }
    }

    /// Build a resolver from `PORTICO_RUNTIME_DIR` / `PORTICO_HOME`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            std::env::var_os("PORTICO_RUNTIME_DIR").map(PathBuf::from),
            std::env::var_os("PORTICO_HOME").map(PathBuf::from),
        )
    }

    /// Resolve the runtime directory for an invocation rooted at `cwd`.
    ///
    /// The directory is created lazily with owner-only permissions; creation
    /// is best-effort and never raises here — failures surface later as
    /// file-operation errors.
    #[must_use]
    pub fn resolve(&self, cwd: &Path) -> PathBuf {
        let dir = self
            .override_dir
            .clone()
            .or_else(|| find_marker_ancestor(cwd).map(|p| p.join(MARKER_DIR)))
            .or_else(|| self.global_root.clone())
            .unwrap_or_else(std::env::temp_dir);
        ensure_private_dir(&dir);
        dir
    }

    /// Resolve the runtime directory for a known workspace path (used by
    /// bulk operations that act on registry records rather than the cwd).
    #[must_use]
    pub fn resolve_for_workspace(&self, workspace: &Path) -> PathBuf {
        let marker = workspace.join(MARKER_DIR);
        let dir = if let Some(dir) = self.override_dir.clone() {
            dir
        } else if marker.is_dir() {
            marker
        } else {
            self.global_root
                .clone()
                .unwrap_or_else(std::env::temp_dir)
        };
        ensure_private_dir(&dir);
        dir
    }
}

/// Walk upward from `start` looking for a directory that contains the
/// project marker. Bounded so a pathological parent chain never loops.
#[must_use]
pub fn find_marker_ancestor(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    for _ in 0..MAX_ANCESTOR_STEPS {
        if current.join(MARKER_DIR).is_dir() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
    None
}

fn ensure_private_dir(dir: &Path) {
    // Only restrict directories we created ourselves — the temp-root
    // fallback resolves to a shared system directory.
    if dir.is_dir() {
        return;
    }
    let _ = std::fs::create_dir_all(dir);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700));
    }
}
