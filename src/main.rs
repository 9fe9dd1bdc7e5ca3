use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;

use shell_history_sync::cleanup;
use shell_history_sync::config::Settings;
use shell_history_sync::logger;
use shell_history_sync::sync::{SyncOptions, SyncOrchestrator, SyncOutcome};

#[derive(Parser)]
#[command(name = "hist-sync")]
#[command(about = "Merge and synchronize timestamped shell history files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Strictly merge history files, dedupe, and print the result to stdout
    Cleanup {
        /// History files to merge
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Merge the local history with a companion copy and rewrite both
    Sync {
        /// Local history file (default: configured or ~/.bash_history)
        #[arg(short, long)]
        local: Option<PathBuf>,

        /// Companion history file, e.g. on a shared mount
        #[arg(short, long)]
        companion: Option<PathBuf>,

        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show or update the default history locations
    Config {
        /// Show the current configuration
        #[arg(long)]
        show: bool,

        /// Set the default local history file
        #[arg(long)]
        local: Option<PathBuf>,

        /// Set the default companion history file
        #[arg(long)]
        companion: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    logger::init_logger()?;
    logger::rotate_log_if_needed()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Cleanup { files } => handle_cleanup(&files),
        Commands::Sync {
            local,
            companion,
            dry_run,
        } => handle_sync(local, companion, dry_run),
        Commands::Config {
            show,
            local,
            companion,
        } => handle_config(show, local, companion),
    }
}

fn handle_cleanup(files: &[PathBuf]) -> Result<()> {
    // The whole stream is built before the first byte is printed, so a
    // malformed file produces a diagnostic and no partial output
    let merged = cleanup::merge_files(files)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(merged.as_bytes())?;
    out.flush()?;

    Ok(())
}

fn handle_sync(local: Option<PathBuf>, companion: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let settings = Settings::load()?;
    let options = SyncOptions {
        local: settings.resolve_local(local)?,
        companion: settings.resolve_companion(companion)?,
        dry_run,
    };

    println!("{}", "Syncing shell histories...".cyan().bold());
    println!("  Local:     {}", options.local.display());
    println!("  Companion: {}", options.companion.display());

    let outcome = SyncOrchestrator::new(options).run()?;
    match outcome {
        SyncOutcome::AlreadyInSync => {
            println!(
                "{} No changes needed; histories already in sync",
                "✓".green()
            );
        }
        SyncOutcome::DryRun { stats } => {
            print_merge_summary(&stats);
            println!(
                "{} Would back up and update both histories",
                "[dry-run]".yellow()
            );
        }
        SyncOutcome::Synced {
            stats,
            local_backup,
            companion_backup,
        } => {
            print_merge_summary(&stats);
            if let Some(backup) = &companion_backup {
                println!("  {} companion -> {}", "Backed up".cyan(), backup.display());
            }
            if let Some(backup) = &local_backup {
                println!("  {} local -> {}", "Backed up".cyan(), backup.display());
            }
            println!("{} Wrote merged history to both locations", "✓".green());
        }
    }

    Ok(())
}

fn print_merge_summary(stats: &shell_history_sync::merge::MergeStats) {
    println!(
        "  {} {} entries (companion: {} + local: {}, duplicates dropped: {})",
        "Merged".cyan(),
        stats.merged_entries,
        stats.base_entries,
        stats.incoming_entries,
        stats.duplicates_removed
    );
}

fn handle_config(show: bool, local: Option<PathBuf>, companion: Option<PathBuf>) -> Result<()> {
    let mut settings = Settings::load()?;

    if show || (local.is_none() && companion.is_none()) {
        println!("{}", "Current configuration:".cyan().bold());
        match &settings.local_history {
            Some(path) => println!("  local_history:     {}", path.display()),
            None => println!("  local_history:     (default ~/.bash_history)"),
        }
        match &settings.companion_history {
            Some(path) => println!("  companion_history: {}", path.display()),
            None => println!("  companion_history: {}", "(not set)".yellow()),
        }
        return Ok(());
    }

    if let Some(path) = local {
        settings.local_history = Some(path);
    }
    if let Some(path) = companion {
        settings.companion_history = Some(path);
    }
    settings.save()?;
    println!("{} Configuration updated", "✓".green());

    Ok(())
}
