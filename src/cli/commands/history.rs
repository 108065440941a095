//! History command - show a project's change log.
//!
//! Prints every recorded note, oldest first, in text or JSON.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use projlog_cli::capture::ProjectSession;
use projlog_cli::storage::Record;

use crate::cli::OutputFormat;

/// Arguments for the history command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    projlog history house.skp                Show all notes\n    \
    projlog history house.skp --limit 5      Show the five most recent notes\n    \
    projlog history house.skp --legacy       Show the old free-text log\n    \
    projlog history house.skp --format json  Output as JSON")]
pub struct Args {
    /// The project file whose history to show
    #[arg(value_name = "ARTIFACT")]
    pub artifact: PathBuf,

    /// Only show the N most recent notes
    #[arg(short, long, value_name = "N")]
    pub limit: Option<usize>,

    /// Read the legacy free-text log instead of the change log
    #[arg(long)]
    pub legacy: bool,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the history command.
pub fn run(args: Args) -> Result<()> {
    let session = ProjectSession::open(&args.artifact)?;
    let mut records = if args.legacy {
        session.legacy_history()?
    } else {
        session.history()?
    };

    if let Some(limit) = args.limit {
        let skip = records.len().saturating_sub(limit);
        records.drain(..skip);
    }

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        OutputFormat::Text => print_records(&records),
    }

    Ok(())
}

fn print_records(records: &[Record]) {
    if records.is_empty() {
        println!("{}", "No changes logged yet.".dimmed());
        return;
    }

    for record in records {
        println!("{}  {}", record.timestamp.dimmed(), record.author.cyan());
        for line in record.message.lines() {
            println!("    {line}");
        }
        println!();
    }
}
