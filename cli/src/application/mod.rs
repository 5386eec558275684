//! Application layer — port trait definitions and use-case orchestration.
//!
//! Services depend on `crate::domain`, the port traits, and the file-backed
//! infra components (registry, PID files) — never on `crate::commands` or
//! `crate::output`.

pub mod ports;
pub mod services;

pub use ports::{DaemonSpawner, PortScanner, ProcessProbe, SpawnRequest};
