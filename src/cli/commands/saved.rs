//! Saved command - handle a save event.
//!
//! Runs the capture throttle for a project that was just saved and prints
//! whether the host should prompt for a change note. A prompt decision is
//! remembered immediately, so repeated saves within the threshold are
//! suppressed even if no note is ever written.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use projlog_cli::capture::{Decision, ProjectSession, Reason};

use crate::cli::OutputFormat;

/// Arguments for the saved command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    projlog saved house.skp            Decide whether to prompt after a save\n    \
    projlog saved house.skp --force    Manual \"log now\": always prompt")]
pub struct Args {
    /// The project file that was saved
    #[arg(value_name = "ARTIFACT")]
    pub artifact: PathBuf,

    /// Treat as a manual capture request, ignoring the throttle
    #[arg(long)]
    pub force: bool,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the saved command.
pub fn run(args: Args) -> Result<()> {
    let mut session = ProjectSession::open(&args.artifact)?;
    let evaluation = session.on_saved(args.force)?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
        }
        OutputFormat::Text => {
            let decision = match evaluation.decision {
                Decision::Prompt => "prompt".green().bold(),
                Decision::Suppress => "suppress".dimmed(),
            };
            println!("{}  {}", decision, describe(&evaluation.reason).dimmed());
        }
    }

    Ok(())
}

fn describe(reason: &Reason) -> String {
    match reason {
        Reason::Forced => "manual capture".to_string(),
        Reason::AutoPromptsDisabled => "auto prompts are disabled".to_string(),
        Reason::NeverPrompted => "first capture for this project".to_string(),
        Reason::UnreadableLastPrompt => "last prompt time unreadable".to_string(),
        Reason::WithinThreshold {
            elapsed_minutes,
            threshold_minutes,
        } => format!("{elapsed_minutes:.1} of {threshold_minutes} minutes since last prompt"),
        Reason::ThresholdElapsed {
            elapsed_minutes, ..
        } => format!("{elapsed_minutes:.1} minutes since last prompt"),
    }
}
