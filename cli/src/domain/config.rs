//! Settings resolved from the environment.
//!
//! Every value has a default; `PORTICO_*` variables override them. The
//! runtime-directory override (`PORTICO_RUNTIME_DIR`) and global root
//! (`PORTICO_HOME`) are consumed by the resolver in `infra`, not here.

use std::path::PathBuf;
use std::time::Duration;

/// Marker subdirectory that identifies a workspace. Its contents belong to
/// the issue tracker and are opaque to portico.
pub const MARKER_DIR: &str = ".issues";

/// Default port for the global instance.
pub const DEFAULT_PORT: u16 = 3000;

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server entry point, looked up on `PATH`.
pub const DEFAULT_SERVER_BIN: &str = "portico-server";

/// How many consecutive ports the free-port scan tries.
pub const PORT_SCAN_ATTEMPTS: u16 = 100;

/// Graceful-termination window before escalating to SIGKILL.
pub const STOP_TIMEOUT: Duration = Duration::from_millis(5000);

/// Extra wait after SIGKILL before giving up.
pub const KILL_GRACE: Duration = Duration::from_millis(500);

/// Liveness poll interval while waiting for a process to exit.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Depth bound for project discovery walks.
pub const DISCOVER_MAX_DEPTH: usize = 4;

/// Bound on the upward marker search, so a cycle or deep mount never loops.
pub const MAX_ANCESTOR_STEPS: usize = 64;

/// Resolved settings for one CLI invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Port of the default (global) instance.
    pub default_port: u16,
    /// Bind host handed to spawned servers.
    pub host: String,
    /// Server entry point.
    pub server_bin: PathBuf,
    /// Roots searched by `portico discover` when no paths are given.
    pub discover_roots: Vec<PathBuf>,
}

impl Settings {
    /// Resolve settings from `PORTICO_*` environment variables, falling back
    /// to the defaults above.
    #[must_use]
    pub fn from_env() -> Self {
        let default_port = std::env::var("PORTICO_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let host = std::env::var("PORTICO_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let server_bin = std::env::var("PORTICO_SERVER_BIN")
            .map_or_else(|_| PathBuf::from(DEFAULT_SERVER_BIN), PathBuf::from);
        let discover_roots = std::env::var("PORTICO_DISCOVER_ROOTS").map_or_else(
            |_| default_discover_roots(),
            |v| v.split(':').filter(|s| !s.is_empty()).map(PathBuf::from).collect(),
        );
        Self {
            default_port,
            host,
            server_bin,
            discover_roots,
        }
    }
}

fn default_discover_roots() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    vec![
        home.join("src"),
        home.join("projects"),
        home.join("code"),
        home,
    ]
}
