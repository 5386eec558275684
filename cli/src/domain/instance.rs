//! The instance record — one managed server process per entry.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One registered server instance.
///
/// `port` is the primary key of the registry: re-registering a port replaces
/// its prior record. `pid` is meaningful only together with a liveness probe —
/// the registry never promises the process is currently alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Absolute path of the workspace this instance serves.
    pub workspace: PathBuf,
    /// Port the instance is bound to.
    pub port: u16,
    /// Process id recorded at spawn time.
    pub pid: u32,
    /// When the process was spawned.
    pub started_at: DateTime<Utc>,
    /// Set when the record was soft-stopped (retained so a later
    /// `restart-all` can reuse the same port without re-discovery).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
}

impl Instance {
    /// Create a record for a freshly spawned process.
    #[must_use]
    pub fn new(workspace: PathBuf, port: u16, pid: u32) -> Self {
        Self {
            workspace,
            port,
            pid,
            started_at: Utc::now(),
            stopped_at: None,
        }
    }

    /// Whether this record was soft-stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped_at.is_some()
    }

    /// Browser URL for this instance.
    #[must_use]
    pub fn url(&self, host: &str) -> String {
        format!("http://{host}:{}", self.port)
    }
}
