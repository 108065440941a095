use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::commands;

/// The main CLI command line interface.
#[derive(Parser)]
#[command(name = "projlog")]
#[command(version)]
#[command(about = "Change notes for every project save")]
#[command(long_about = "projlog keeps an append-only change log next to a project file,\n\
    decides when a save should ask for a note, and mirrors the project\n\
    and its log to a master copy on request.")]
#[command(after_help = "EXAMPLES:\n    \
    projlog saved house.skp                   Should this save prompt for a note?\n    \
    projlog log house.skp -m \"Moved stairs\"   Record a note\n    \
    projlog history house.skp                 Show all notes\n    \
    projlog push house.skp                    Mirror to the master copy\n    \
    projlog settings house.skp                Show project settings\n\n\
    For more information about a command, run 'projlog <command> --help'.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Handle a save event: decide whether to prompt for a note
    #[command(long_about = "Runs the capture throttle for a project that was just saved.\n\
        Prints 'prompt' or 'suppress'. A prompt is remembered immediately,\n\
        so further saves within the skip threshold are suppressed.")]
    Saved(commands::saved::Args),

    /// Record a change note, optionally pushing to master
    Log(commands::log::Args),

    /// Show the change history of a project
    History(commands::history::Args),

    /// Mirror a project and its change log to the master location
    #[command(long_about = "Copies the project file over the master file and, when the\n\
        project has a change log, copies that log next to it under the\n\
        master's name. Missing directories are created.")]
    Push(commands::push::Args),

    /// View and change per-project settings
    Settings(commands::settings::Args),

    /// Import a legacy free-text change log
    Import(commands::import::Args),

    /// Generate shell completion scripts
    Completions(commands::completions::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "projlog=debug,projlog_cli=debug"
    } else {
        "projlog=info,projlog_cli=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Saved(args) => commands::saved::run(args),
        Commands::Log(args) => commands::log::run(args),
        Commands::History(args) => commands::history::run(args),
        Commands::Push(args) => commands::push::run(args),
        Commands::Settings(args) => commands::settings::run(args),
        Commands::Import(args) => commands::import::run(args),
        Commands::Completions(args) => {
            commands::completions::generate_completions(&mut Cli::command(), args.shell);
            Ok(())
        }
    }
}
