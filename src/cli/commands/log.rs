//! Log command - record a change note.
//!
//! Appends a note to the project's change log, remembers the push
//! preference, and optionally mirrors the project to its master location.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::io::Read;
use std::path::PathBuf;

use projlog_cli::capture::{MirrorOutcome, ProjectSession};

/// Arguments for the log command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    projlog log house.skp -m \"Moved the stairs\"                 Record a note\n    \
    projlog log house.skp -m \"Roof\" --push /srv/master/house.skp  Record and push\n    \
    projlog log house.skp -m \"Roof\" --push                       Push to the saved master path\n    \
    git log -1 --format=%B | projlog log house.skp              Read the note from stdin")]
pub struct Args {
    /// The project file the note belongs to
    #[arg(value_name = "ARTIFACT")]
    pub artifact: PathBuf,

    /// The change note (read from stdin when omitted)
    #[arg(short, long, value_name = "MESSAGE")]
    pub message: Option<String>,

    /// Push to master after logging, optionally to a new target
    #[arg(long, value_name = "TARGET", num_args = 0..=1, default_missing_value = "")]
    #[arg(
        long_help = "Mirror the project and its change log after recording the note.\n\
        With a TARGET, that path becomes the saved master file path;\n\
        without one, the saved master file path is used."
    )]
    pub push: Option<String>,
}

/// Executes the log command.
pub fn run(args: Args) -> Result<()> {
    let message = match args.message {
        Some(message) => message,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read change note from stdin")?;
            buf
        }
    };
    let message = message.trim_end_matches(['\r', '\n']);
    if message.trim().is_empty() {
        bail!("Aborting: empty change note");
    }

    let mut session = ProjectSession::open(&args.artifact)?;

    let push_requested = args.push.is_some();
    let master_path = match args.push {
        Some(target) if !target.trim().is_empty() => target,
        _ => session.settings().master_file_path(),
    };
    if push_requested && master_path.trim().is_empty() {
        bail!("No master file path configured. Pass one with --push <TARGET>.");
    }

    let outcome = session.commit(message, push_requested, &master_path)?;

    println!(
        "{}",
        format!("Change logged to {}", outcome.log_path.display()).green()
    );

    match outcome.mirror {
        MirrorOutcome::NotRequested => Ok(()),
        MirrorOutcome::Pushed(report) => {
            println!(
                "{}",
                format!("Pushed to master {}", report.artifact.display()).green()
            );
            Ok(())
        }
        MirrorOutcome::Failed(e) => {
            Err(e).context("Change logged, but push to master failed")
        }
    }
}
