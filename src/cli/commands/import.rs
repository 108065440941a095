//! Import command - bring a legacy free-text log into the change log.
//!
//! Older versions wrote notes as free-text blocks to `<name>_changelog.txt`.
//! This command appends those entries to `<name>_changelog.csv` in order.
//! Entries already in the change log are skipped, so importing again is
//! safe. The legacy file is left untouched.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use projlog_cli::capture::ProjectSession;

/// Arguments for the import command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    projlog import house.skp             Import house_changelog.txt\n    \
    projlog import house.skp --dry-run   Preview what would be imported")]
pub struct Args {
    /// The project file whose legacy log to import
    #[arg(value_name = "ARTIFACT")]
    pub artifact: PathBuf,

    /// Preview what would be imported without making changes
    #[arg(long)]
    pub dry_run: bool,
}

/// Executes the import command.
pub fn run(args: Args) -> Result<()> {
    let session = ProjectSession::open(&args.artifact)?;

    if args.dry_run {
        let records = session.pending_legacy()?;
        println!("Would import {} entries", records.len().to_string().bold());
        for record in &records {
            let first_line = record.message.lines().next().unwrap_or("");
            println!("  {}  {}", record.timestamp.dimmed(), first_line);
        }
        return Ok(());
    }

    let count = session.import_legacy()?;
    if count == 0 {
        println!("{}", "No new legacy entries to import.".dimmed());
    } else {
        println!(
            "{}",
            format!("Imported {count} entries into {}", session.log_path().display()).green()
        );
    }
    Ok(())
}
