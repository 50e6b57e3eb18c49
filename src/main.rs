//! Gatehouse CLI entrypoint.

use clap::Parser;
use gatehouse::cli::commands::{
    CheckArgs, Cli, Commands, FingerprintArgs, IntentCommands, IntentSetStatusArgs,
    IntentShowArgs, TraceCommands, TraceTailArgs,
};
use gatehouse::cli::output::{emit_record, emit_rows, fail, OutputFormat};
use gatehouse::core::error::{ExitCode, GatehouseError};
use gatehouse::core::intent::IntentStatus;
use gatehouse::core::{fingerprint, policy, trace};
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    process::exit(run(cli).code());
}

fn run(cli: Cli) -> ExitCode {
    let workspace = cli
        .workspace
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Commands::Intents(cmd) => handle_intents(cmd, &workspace, cli.format),
        Commands::Trace(cmd) => handle_trace(cmd, &workspace, cli.format),
        Commands::Check(args) => handle_check(&args, &workspace, cli.format),
        Commands::Fingerprint(args) => handle_fingerprint(&args, cli.format),
    }
}

fn handle_intents(cmd: IntentCommands, workspace: &Path, format: OutputFormat) -> ExitCode {
    match cmd {
        IntentCommands::List => match policy::load_intents(workspace) {
            Ok(intents) => emit_rows(&intents, format),
            Err(e) => fail(&e, format),
        },
        IntentCommands::Show(IntentShowArgs { id }) => match policy::find_intent(workspace, &id) {
            Ok(Some(intent)) => emit_record(&intent, format),
            Ok(None) => {
                fail(
                    &GatehouseError::input(
                        "unknown_intent",
                        format!("No intent with id '{id}'"),
                        "cli:intents",
                    ),
                    format,
                );
                ExitCode::NotFound
            }
            Err(e) => fail(&e, format),
        },
        IntentCommands::SetStatus(IntentSetStatusArgs { id, status }) => {
            let Ok(status) = status.parse::<IntentStatus>() else {
                return fail(
                    &GatehouseError::input(
                        "invalid_status",
                        format!("'{status}' is not a valid intent status"),
                        "cli:intents",
                    )
                    .with_hint("Use PENDING, IN_PROGRESS, BLOCKED or COMPLETE"),
                    format,
                );
            };
            match policy::update_intent_status(workspace, &id, status) {
                Ok(updated) => emit_record(&updated, format),
                Err(e) => fail(&e, format),
            }
        }
    }
}

fn handle_trace(cmd: TraceCommands, workspace: &Path, format: OutputFormat) -> ExitCode {
    match cmd {
        TraceCommands::Tail(TraceTailArgs { count }) => match trace::read_entries(workspace) {
            Ok(entries) => {
                let start = entries.len().saturating_sub(count);
                emit_rows(&entries[start..], format)
            }
            Err(e) => fail(
                &GatehouseError::io(
                    "ledger_read_failed",
                    format!("Failed to read trace ledger: {e}"),
                    "cli:trace",
                ),
                format,
            ),
        },
    }
}

fn handle_check(args: &CheckArgs, workspace: &Path, format: OutputFormat) -> ExitCode {
    let intent = match policy::find_intent(workspace, &args.intent_id) {
        Ok(Some(intent)) => intent,
        Ok(None) => {
            fail(
                &GatehouseError::input(
                    "unknown_intent",
                    format!("No intent with id '{}'", args.intent_id),
                    "cli:check",
                ),
                format,
            );
            return ExitCode::NotFound;
        }
        Err(e) => return fail(&e, format),
    };

    let absolute = if args.path.is_absolute() {
        args.path.clone()
    } else {
        workspace.join(&args.path)
    };

    let ignored = policy::is_file_ignored(workspace, &absolute);
    let in_scope = policy::is_file_in_scope(workspace, &intent, &absolute);

    let verdict = serde_json::json!({
        "intent_id": intent.id,
        "path": absolute.display().to_string(),
        "in_scope": in_scope,
        "ignored": ignored,
        "would_block": !in_scope && !ignored,
    });

    let emitted = emit_record(&verdict, format);
    if emitted != ExitCode::Success {
        return emitted;
    }
    if in_scope || ignored {
        ExitCode::Success
    } else {
        ExitCode::Blocked
    }
}

fn handle_fingerprint(args: &FingerprintArgs, format: OutputFormat) -> ExitCode {
    match std::fs::read_to_string(&args.path) {
        Ok(content) => emit_record(&fingerprint::fingerprint_content(&args.path, &content), format),
        Err(e) => fail(
            &GatehouseError::io(
                "file_read_failed",
                format!("Failed to read {}: {e}", args.path.display()),
                "cli:fingerprint",
            ),
            format,
        ),
    }
}
