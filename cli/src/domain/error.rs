//! Typed domain error enums.
//!
//! Expected conditions (missing PID file, dead process, empty registry) are
//! sentinel values in the components that produce them, never errors. These
//! variants cover the failures that genuinely stop an operation; they
//! implement `thiserror::Error` and convert to `anyhow::Error` via `?`.

use thiserror::Error;

/// Failures of instance lifecycle operations.
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("No free port found in {start}..{end}. Stop an instance and retry, or pass --port.")]
    PortExhausted { start: u16, end: u16 },

    #[error(
        "Process {pid} did not exit within {timeout_ms} ms. \
         Instance state was left in place; retry 'portico stop'."
    )]
    TerminateTimeout { pid: u32, timeout_ms: u128 },

    #[error("No log file for this instance yet: {0}")]
    LogMissing(String),
}
