//! filetask - Conflict-aware recursive copy, move and delete.
//!
//! Usage:
//!   filetask copy SRC... DEST     Copy files and directory trees into DEST
//!   filetask move SRC... DEST     Move files and directory trees into DEST
//!   filetask delete PATH...       Delete files and directory trees
//!   filetask size PATH...         Show the total size of a selection
//!   filetask --help               Show help

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use tracing_subscriber::EnvFilter;

use filetask_core::{
    BatchConfig, BatchOutcome, ConflictDecision, ConflictStrategy, DeleteMode, MoveCleanup,
    SizePolicy, TransferMode,
};
use filetask_ops::{BatchEvent, FileTask, start_batch, total_size};

#[derive(Parser)]
#[command(
    name = "filetask",
    version,
    about = "Conflict-aware recursive copy, move and delete",
    long_about = "filetask copies and moves files and whole directory trees with \
                  byte-accurate progress across the batch.\n\n\
                  When a destination already exists you are asked what to do; \
                  answer in uppercase to reuse the answer for the rest of the batch."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy files and directories into a destination directory
    Copy {
        #[command(flatten)]
        args: TransferArgs,
    },

    /// Move files and directories into a destination directory
    Move {
        #[command(flatten)]
        args: TransferArgs,

        /// Remove every requested source as soon as one directory was moved
        #[arg(long)]
        legacy_cleanup: bool,
    },

    /// Delete files and directory trees
    Delete {
        /// Paths to delete
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Move to the system trash instead of deleting permanently
        #[arg(long)]
        trash: bool,
    },

    /// Show the total size of files and directory trees
    Size {
        /// Paths to measure
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Fail on entries that cannot be read instead of counting them as 0
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Args)]
struct TransferArgs {
    /// Source paths followed by the destination directory
    #[arg(required = true, num_args = 2..)]
    paths: Vec<PathBuf>,

    /// What to do when a destination already exists
    #[arg(short = 'c', long, default_value = "ask")]
    on_conflict: ConflictChoice,

    /// Streaming chunk size (e.g., "64KB", "1MB")
    #[arg(long, default_value = "64KB")]
    chunk_size: String,

    /// Fail if any source entry cannot be sized
    #[arg(long)]
    strict_size: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum ConflictChoice {
    #[default]
    Ask,
    Skip,
    KeepBoth,
    Overwrite,
}

impl ConflictChoice {
    /// The fixed answer for every conflict, or `None` to prompt.
    fn decision(self) -> Option<ConflictDecision> {
        match self {
            Self::Ask => None,
            Self::Skip => Some(ConflictDecision::always(ConflictStrategy::Skip)),
            Self::KeepBoth => Some(ConflictDecision::always(ConflictStrategy::KeepBoth)),
            Self::Overwrite => Some(ConflictDecision::always(ConflictStrategy::Overwrite)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Copy { args } => {
            run_transfer(args, TransferMode::Copy, MoveCleanup::PerItem).await?;
        }
        Command::Move {
            args,
            legacy_cleanup,
        } => {
            let cleanup = if legacy_cleanup {
                MoveCleanup::WholeBatch
            } else {
                MoveCleanup::PerItem
            };
            run_transfer(args, TransferMode::Move, cleanup).await?;
        }
        Command::Delete { paths, trash } => {
            run_delete(&paths, trash)?;
        }
        Command::Size { paths, strict } => {
            run_size(&paths, strict)?;
        }
    }

    Ok(())
}

/// Run a copy or move batch, answering conflicts from the terminal.
async fn run_transfer(args: TransferArgs, mode: TransferMode, cleanup: MoveCleanup) -> Result<()> {
    let (destination, sources) = args
        .paths
        .split_last()
        .ok_or_else(|| eyre!("A destination directory is required"))?;

    let config = BatchConfig::builder()
        .chunk_size(parse_size(&args.chunk_size)? as usize)
        .size_policy(if args.strict_size {
            SizePolicy::Strict
        } else {
            SizePolicy::Lenient
        })
        .move_cleanup(cleanup)
        .build()
        .wrap_err("Invalid batch configuration")?;

    let preset = args.on_conflict.decision();
    let verb = match mode {
        TransferMode::Copy => "Copying",
        TransferMode::Move => "Moving",
    };

    let mut handle = start_batch(
        FileTask::new(config),
        sources.to_vec(),
        destination.clone(),
        mode,
    );

    while let Some(event) = handle.next_event().await {
        match event {
            BatchEvent::Progress(percent) => {
                eprint!("\r{verb} {percent:>3}%");
            }
            BatchEvent::Conflict(request) => {
                let decision = match preset {
                    Some(decision) => decision,
                    None => {
                        eprintln!();
                        prompt_conflict(request.source.clone()).await?
                    }
                };
                request.answer(decision);
            }
        }
    }
    eprintln!();

    let outcome = handle
        .wait()
        .await
        .wrap_err_with(|| format!("{mode} into {} failed", destination.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome, mode);
    }

    Ok(())
}

/// Print a human-readable batch summary.
fn print_outcome(outcome: &BatchOutcome, mode: TransferMode) {
    let verb = match mode {
        TransferMode::Copy => "Copied",
        TransferMode::Move => "Moved",
    };

    println!(
        " {} ({} of {})",
        outcome.summary(verb),
        format_size(outcome.bytes_copied),
        format_size(outcome.bytes_total)
    );
    for entry in &outcome.entries {
        println!("   {} -> {}", entry.source.display(), entry.destination.display());
    }

    if !outcome.skipped.is_empty() {
        println!();
        println!(" Skipped:");
        for item in &outcome.skipped {
            println!("   {} ({})", item.path.display(), item.reason);
        }
    }
}

/// Ask on the terminal what to do with a conflicting item.
async fn prompt_conflict(source: PathBuf) -> Result<ConflictDecision> {
    tokio::task::spawn_blocking(move || read_decision(&source)).await?
}

fn read_decision(source: &Path) -> Result<ConflictDecision> {
    let stdin = io::stdin();
    loop {
        eprint!(
            "{} already exists at the destination. \
             [s]kip, [k]eep both, [o]verwrite (uppercase applies to all): ",
            source.display()
        );
        io::stderr().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            bail!("Input closed while waiting for a conflict decision");
        }
        if let Some(decision) = parse_decision(line.trim()) {
            return Ok(decision);
        }
    }
}

/// Parse a one-letter answer; uppercase makes it sticky.
fn parse_decision(answer: &str) -> Option<ConflictDecision> {
    let mut chars = answer.chars();
    let letter = chars.next()?;
    if chars.next().is_some() {
        return None;
    }

    let strategy = match letter.to_ascii_lowercase() {
        's' => ConflictStrategy::Skip,
        'k' => ConflictStrategy::KeepBoth,
        'o' => ConflictStrategy::Overwrite,
        _ => return None,
    };
    Some(ConflictDecision::new(strategy, letter.is_ascii_uppercase()))
}

/// Delete paths and report what happened.
fn run_delete(paths: &[PathBuf], trash: bool) -> Result<()> {
    let config = BatchConfig::builder()
        .delete_mode(if trash {
            DeleteMode::Trash
        } else {
            DeleteMode::Permanent
        })
        .build()
        .wrap_err("Invalid batch configuration")?;

    let task = FileTask::new(config);
    let deleted = task.delete_paths(paths);
    println!(" Deleted {} items", deleted.len());

    let remaining: Vec<&PathBuf> = paths
        .iter()
        .filter(|path| std::fs::symlink_metadata(path).is_ok())
        .collect();
    if !remaining.is_empty() {
        for path in &remaining {
            eprintln!("   failed: {}", path.display());
        }
        bail!("{} paths could not be deleted", remaining.len());
    }

    Ok(())
}

/// Print the total size of a selection.
fn run_size(paths: &[PathBuf], strict: bool) -> Result<()> {
    let policy = if strict {
        SizePolicy::Strict
    } else {
        SizePolicy::Lenient
    };
    let total = total_size(paths, policy).wrap_err("Size computation failed")?;
    println!("{} ({} bytes)", format_size(total), total);
    Ok(())
}

/// Format a byte size for display.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let digits = s.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.');

    let multiplier: u64 = if s.ends_with("GB") || s.ends_with('G') {
        1024 * 1024 * 1024
    } else if s.ends_with("MB") || s.ends_with('M') {
        1024 * 1024
    } else if s.ends_with("KB") || s.ends_with('K') {
        1024
    } else {
        1
    };

    let num: f64 = digits
        .parse()
        .wrap_err_with(|| format!("Invalid size: {s}"))?;
    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decision() {
        assert_eq!(
            parse_decision("k"),
            Some(ConflictDecision::once(ConflictStrategy::KeepBoth))
        );
        assert_eq!(
            parse_decision("S"),
            Some(ConflictDecision::always(ConflictStrategy::Skip))
        );
        assert_eq!(parse_decision("x"), None);
        assert_eq!(parse_decision("skip"), None);
        assert_eq!(parse_decision(""), None);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("64KB").unwrap(), 65536);
        assert_eq!(parse_size("1m").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("512").unwrap(), 512);
        assert!(parse_size("lots").is_err());
    }
}
