//! `portico logs` — show the tail of an instance's log file.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::domain::InstanceError;

/// Arguments for the logs command.
#[derive(Args)]
pub struct LogsArgs {
    /// Port of the instance (default instance when omitted)
    #[arg(long)]
    pub port: Option<u16>,

    /// Number of lines to show
    #[arg(short = 'n', long, default_value_t = 50)]
    pub lines: usize,
}

/// Run `portico logs`.
///
/// # Errors
///
/// Returns an error if the log file does not exist or cannot be read.
pub fn run(app: &AppContext, args: &LogsArgs) -> Result<ExitCode> {
    let controller = app.controller()?;
    let path = controller.log_file_path(args.port);
    if !path.exists() {
        return Err(InstanceError::LogMissing(path.display().to_string()).into());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading log file {}", path.display()))?;
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(args.lines);
    for line in &lines[start..] {
        println!("{line}");
    }
    Ok(ExitCode::SUCCESS)
}
