//! Application context — unified state passed to every command handler.
//!
//! `AppContext` replaces the per-command pattern of constructing loose
//! `OutputContext`, `Settings`, and `InstanceRegistry` instances. Adding a
//! new cross-cutting concern requires only one field change here — zero
//! command signatures change.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::domain::Settings;
use crate::infra::daemon::DaemonController;
use crate::infra::registry::InstanceRegistry;
use crate::infra::runtime_dir::{RuntimeDirResolver, find_marker_ancestor};
use crate::output::OutputContext;

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// When `true`, machine-readable JSON output is active.
    pub json: bool,
    /// Settings resolved from the environment.
    pub settings: Settings,
    /// The file-backed instance registry.
    pub registry: InstanceRegistry,
    /// Runtime directory resolution.
    pub resolver: RuntimeDirResolver,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            json: flags.json,
            settings: Settings::from_env(),
            registry: InstanceRegistry::new()?,
            resolver: RuntimeDirResolver::from_env(),
        })
    }

    /// The controller for this invocation's runtime directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be read.
    pub fn controller(&self) -> Result<DaemonController> {
        let cwd = std::env::current_dir().context("reading current directory")?;
        Ok(DaemonController::new(self.resolver.resolve(&cwd)))
    }

    /// The workspace this invocation belongs to: the nearest marker-carrying
    /// ancestor of the current directory, or the current directory itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be read.
    pub fn workspace(&self) -> Result<PathBuf> {
        let cwd = std::env::current_dir().context("reading current directory")?;
        Ok(find_marker_ancestor(&cwd).unwrap_or(cwd))
    }
}
