//! `portico start` — start the server for this project or the default
//! instance.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::lifecycle::{self, StartOutcome, StartRequest};
use crate::domain::Instance;
use crate::infra::daemon::TcpPortScanner;
use crate::infra::probe::SignalProbe;
use crate::infra::spawner::DetachedSpawner;

/// Arguments for the start command.
#[derive(Args, Default)]
pub struct StartArgs {
    /// Port to bind (auto-selected when omitted)
    #[arg(long)]
    pub port: Option<u16>,

    /// Host to bind (overrides PORTICO_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Run the server with debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Open the board in the browser once started
    #[arg(long)]
    pub open: bool,

    /// Force a dedicated instance even outside a project
    #[arg(long, hide = true)]
    pub new_instance: bool,
}

/// Run `portico start`.
///
/// # Errors
///
/// Returns an error if no free port is found, the spawn fails, or the
/// registry cannot be written.
pub async fn run(app: &AppContext, args: &StartArgs) -> Result<ExitCode> {
    let mut settings = app.settings.clone();
    if let Some(host) = &args.host {
        settings.host.clone_from(host);
    }
    let workspace = app.workspace()?;
    let dedicated = args.new_instance || workspace.join(crate::domain::config::MARKER_DIR).is_dir();
    let req = StartRequest {
        workspace,
        explicit_port: args.port,
        debug: args.debug,
        dedicated,
    };

    let outcome = lifecycle::start_instance(
        &SignalProbe,
        &DetachedSpawner,
        &TcpPortScanner,
        &app.controller()?,
        &app.registry,
        &settings,
        &req,
    )
    .await?;

    let ctx = &app.output;
    let (port, pid) = match outcome {
        StartOutcome::AlreadyRunning { port, pid } => {
            ctx.info(&format!("Server is already running (pid {pid})."));
            (port, pid)
        }
        StartOutcome::Started { port, pid } => {
            ctx.success(&format!("Server started (pid {pid})."));
            (port, pid)
        }
    };

    let url = Instance::new(req.workspace.clone(), port, pid).url(&settings.host);
    ctx.kv("URL", &url);
    if args.open {
        open_browser(app, &url);
    }
    Ok(ExitCode::SUCCESS)
}

/// Best-effort browser launch; a failure never fails the start.
fn open_browser(app: &AppContext, url: &str) {
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(not(target_os = "macos"))]
    let opener = "xdg-open";

    if std::process::Command::new(opener).arg(url).spawn().is_err() {
        app.output
            .warn(&format!("Could not open a browser; visit {url}"));
    }
}
