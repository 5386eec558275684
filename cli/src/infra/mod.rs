//! Infrastructure layer — concrete implementations of application port
//! traits plus the file-backed components they operate on.
//!
//! This module contains all I/O-performing code: signal delivery, detached
//! process spawning, PID file and registry persistence, port scanning, and
//! filesystem walks.

pub mod daemon;
pub mod discovery;
pub mod probe;
pub mod registry;
pub mod runtime_dir;
pub mod spawner;

pub use daemon::{DaemonController, SpawnOptions, TcpPortScanner};
pub use probe::SignalProbe;
pub use registry::InstanceRegistry;
pub use runtime_dir::RuntimeDirResolver;
pub use spawner::DetachedSpawner;
