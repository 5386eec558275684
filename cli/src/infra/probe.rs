//! POSIX implementation of the `ProcessProbe` port.
//!
//! Liveness is checked with signal 0 — a zero-effect delivery that only
//! performs the existence and permission checks.

use crate::application::ports::ProcessProbe;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{Signal, kill};
#[cfg(unix)]
use nix::unistd::Pid;

/// Signal-based probe for POSIX targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalProbe;

#[cfg(unix)]
impl SignalProbe {
    fn send(pid: i32, signal: Option<Signal>) -> bool {
        if pid <= 0 {
            return false;
        }
        // ESRCH means no such process. Anything else — including EPERM,
        // which implies the process exists but is not signalable by this
        // user — counts as "the process is there".
        !matches!(kill(Pid::from_raw(pid), signal), Err(Errno::ESRCH))
    }
}

#[cfg(unix)]
impl ProcessProbe for SignalProbe {
    fn is_running(&self, pid: i32) -> bool {
        Self::send(pid, None)
    }

    fn send_term(&self, pid: i32) -> bool {
        Self::send(pid, Some(Signal::SIGTERM))
    }

    fn send_kill(&self, pid: i32) -> bool {
        Self::send(pid, Some(Signal::SIGKILL))
    }
}
