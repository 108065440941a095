//! Settings command - view and change per-project settings.
//!
//! Settings are stored next to the project file and created on the first
//! `set`. Reading a key that was never set shows its default.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use projlog_cli::config::{
    SettingValue, SettingsStore, DISABLE_AUTO_PROMPTS, KNOWN_KEYS, LAST_PROMPT_TIME,
    MASTER_FILE_PATH, PUSH_TO_MASTER_ENABLED, SKIP_THRESHOLD_MINUTES,
};

/// Arguments for the settings command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    projlog settings house.skp                                   Show all settings\n    \
    projlog settings house.skp get skip_threshold_minutes       Read one value\n    \
    projlog settings house.skp set skip_threshold_minutes 10    Change the throttle\n    \
    projlog settings house.skp set disable_auto_prompts true    Only prompt on demand")]
pub struct Args {
    /// The project file whose settings to manage
    #[arg(value_name = "ARTIFACT")]
    pub artifact: PathBuf,

    #[command(subcommand)]
    pub command: Option<SettingsCommand>,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show current settings
    Show,
    /// Get a setting value
    Get { key: String },
    /// Set a setting value
    Set { key: String, value: String },
}

pub fn run(args: Args) -> Result<()> {
    let mut store = SettingsStore::for_artifact(&args.artifact)?;
    match args.command {
        Some(SettingsCommand::Show) | None => show_settings(&store),
        Some(SettingsCommand::Get { key }) => get_setting(&store, &key),
        Some(SettingsCommand::Set { key, value }) => set_setting(&mut store, &key, &value),
    }
}

/// The value a well-known key reads as when unset.
fn default_for(key: &str) -> Option<SettingValue> {
    match key {
        MASTER_FILE_PATH => Some(SettingValue::Text(String::new())),
        PUSH_TO_MASTER_ENABLED | DISABLE_AUTO_PROMPTS => Some(SettingValue::Bool(false)),
        SKIP_THRESHOLD_MINUTES => Some(SettingValue::Number(
            projlog_cli::config::DEFAULT_SKIP_THRESHOLD_MINUTES,
        )),
        _ => None,
    }
}

fn show_settings(store: &SettingsStore) -> Result<()> {
    println!("{}", "Project Settings".bold());
    println!();

    if let Some(path) = store.path() {
        let state = if store.has_container() { "" } else { " (not created yet)" };
        println!("  {}  {}{}", "File:".dimmed(), path.display(), state.dimmed());
        println!();
    }

    for key in KNOWN_KEYS {
        match store.raw(key) {
            Some(value) => println!("  {key} = {value}"),
            None => match default_for(key) {
                Some(default) => println!("  {key} = {} {}", default, "(default)".dimmed()),
                None => println!("  {key} {}", "(not set)".dimmed()),
            },
        }
    }

    let extra: Vec<_> = store
        .entries()
        .filter(|(key, _)| !KNOWN_KEYS.contains(key))
        .collect();
    if !extra.is_empty() {
        println!();
        println!("{}", "Other:".bold());
        for (key, value) in extra {
            println!("  {key} = {value}");
        }
    }

    Ok(())
}

fn get_setting(store: &SettingsStore, key: &str) -> Result<()> {
    match store.raw(key).cloned().or_else(|| default_for(key)) {
        Some(value) => println!("{value}"),
        None => println!("{}", format!("Setting '{key}' is not set").yellow()),
    }
    Ok(())
}

fn set_setting(store: &mut SettingsStore, key: &str, value: &str) -> Result<()> {
    if !KNOWN_KEYS.contains(&key) {
        println!(
            "{}",
            format!("Note: '{key}' is not a setting projlog reads").yellow()
        );
    }

    // Paths and timestamps stay text even when they look like something else.
    let value = match key {
        MASTER_FILE_PATH | LAST_PROMPT_TIME => SettingValue::Text(value.to_string()),
        _ => SettingValue::parse(value),
    };
    store.set(key, value.clone())?;

    println!("{}", format!("Set {key} = {value}").green());
    Ok(())
}
