//! Push command - mirror a project to its master location.

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::PathBuf;

use projlog_cli::capture::ProjectSession;

/// Arguments for the push command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    projlog push house.skp                          Push to the saved master path\n    \
    projlog push house.skp --to /srv/master/h.skp   Push to an explicit target")]
pub struct Args {
    /// The project file to mirror
    #[arg(value_name = "ARTIFACT")]
    pub artifact: PathBuf,

    /// Target file (defaults to the saved master file path)
    #[arg(long, value_name = "TARGET")]
    pub to: Option<PathBuf>,
}

/// Executes the push command.
pub fn run(args: Args) -> Result<()> {
    let session = ProjectSession::open(&args.artifact)?;

    let report = match args.to {
        Some(target) => session.push(&target)?,
        None => {
            if session.settings().master_file_path().trim().is_empty() {
                bail!(
                    "No master file path configured.\n\n\
                    Pass --to <TARGET>, or save one with:\n  \
                    projlog settings {} set master_file_path <TARGET>",
                    args.artifact.display()
                );
            }
            session.push_to_configured()?
        }
    };

    println!(
        "{}",
        format!("Pushed to master {}", report.artifact.display()).green()
    );
    if let Some(log) = report.log {
        println!("  {}  {}", "Change log:".dimmed(), log.display());
    }
    Ok(())
}
