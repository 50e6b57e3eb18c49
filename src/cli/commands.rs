//! CLI command definitions.
//!
//! The CLI is a read-side projection over the same library the host
//! embeds; the only mutation it offers is the intent status update.

use super::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Gatehouse CLI - tool-call mediation for agentic coding workflows.
#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Workspace root (defaults to the current directory)
    #[arg(long, short = 'w', global = true)]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Intent policy commands
    #[command(subcommand)]
    Intents(IntentCommands),

    /// Audit ledger commands
    #[command(subcommand)]
    Trace(TraceCommands),

    /// Check whether a path is inside an intent's owned scope
    Check(CheckArgs),

    /// Print the structural fingerprint of a file
    Fingerprint(FingerprintArgs),
}

/// Intent subcommands.
#[derive(Subcommand)]
pub enum IntentCommands {
    /// List all intents in the workspace policy file
    List,
    /// Show one intent by id
    Show(IntentShowArgs),
    /// Update an intent's status
    SetStatus(IntentSetStatusArgs),
}

#[derive(Args)]
pub struct IntentShowArgs {
    /// Intent id
    pub id: String,
}

#[derive(Args)]
pub struct IntentSetStatusArgs {
    /// Intent id
    pub id: String,

    /// New status (PENDING, IN_PROGRESS, BLOCKED, COMPLETE)
    pub status: String,
}

/// Trace subcommands.
#[derive(Subcommand)]
pub enum TraceCommands {
    /// Show the last entries of the audit ledger
    Tail(TraceTailArgs),
}

#[derive(Args)]
pub struct TraceTailArgs {
    /// Number of entries to show
    #[arg(long, short = 'n', default_value_t = 10)]
    pub count: usize,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Intent id
    pub intent_id: String,

    /// Workspace-relative or absolute target path
    pub path: PathBuf,
}

#[derive(Args)]
pub struct FingerprintArgs {
    /// File to fingerprint
    pub path: PathBuf,
}
