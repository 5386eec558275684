//! `portico discover` — find project directories under the given roots.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::infra::discovery;

/// Arguments for the discover command.
#[derive(Args, Default)]
pub struct DiscoverArgs {
    /// Roots to search (configured defaults when omitted)
    pub paths: Vec<PathBuf>,
}

/// Run `portico discover`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(app: &AppContext, args: &DiscoverArgs) -> Result<ExitCode> {
    let roots = if args.paths.is_empty() {
        app.settings.discover_roots.clone()
    } else {
        args.paths.clone()
    };

    let ctx = &app.output;
    let mut all: Vec<PathBuf> = Vec::new();
    for root in &roots {
        let projects = discovery::find_projects(root);
        if !app.json {
            ctx.kv(
                &root.display().to_string(),
                &format!("{} project(s)", projects.len()),
            );
        }
        all.extend(projects);
    }
    all.sort();
    all.dedup();

    if app.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&all).context("serializing project list")?
        );
        return Ok(ExitCode::SUCCESS);
    }

    if all.is_empty() {
        ctx.info("No projects found.");
    } else {
        ctx.header("Projects");
        for project in &all {
            ctx.plain(&project.display().to_string());
        }
    }
    Ok(ExitCode::SUCCESS)
}
