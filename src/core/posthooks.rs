//! Post-hooks: observability after tool execution.
//!
//! All three are best-effort. The trace logger appends the audit ledger
//! line, the intent-map updater refreshes a human-readable view, and the
//! lesson recorder notes exported-surface changes in CLAUDE.md. None of
//! them may alter the tool result; the engine swallows their failures.

use crate::core::classify::{self, Classification, MutationClass};
use crate::core::context::ToolContext;
use crate::core::error::{GatehouseError, Result};
use crate::core::fingerprint;
use crate::core::intent::EntityType;
use crate::core::pipeline::PostHook;
use crate::core::policy::ORCHESTRATION_DIR;
use crate::core::trace::{
    RelatedRef, TraceContributor, TraceConversation, TraceEntry, TraceFile, TraceRange,
};
use crate::core::{policy, tools, trace, vcs};
use chrono::{SecondsFormat, Utc};
use fs2::FileExt;
use std::io::Write;
use std::path::Path;

/// Human-readable intent state view under the orchestration directory.
pub const INTENT_MAP_FILE: &str = "INTENT_MAP.md";
/// Lesson notes file at the workspace root.
pub const LESSONS_FILE: &str = "CLAUDE.md";

const LESSONS_HEADER: &str = "\
# CLAUDE.md

Lessons recorded by the tool-call mediation layer. Each section notes a
mutation that changed an exported API surface.
";

/// Appends one audit ledger line per successful write.
pub struct TraceLogger;

impl PostHook for TraceLogger {
    fn name(&self) -> &'static str {
        "trace_logger"
    }

    fn run(&self, ctx: &mut ToolContext) -> Result<()> {
        if !tools::is_write_tool(&ctx.tool_name) {
            return Ok(());
        }
        let Some(target) = tools::resolve_target(ctx) else {
            return Ok(());
        };

        // The file may have been deleted by the tool; trace it as empty.
        let new_content = std::fs::read_to_string(&target).unwrap_or_default();
        let fp = fingerprint::fingerprint_content(&target, &new_content);

        let classification = match &ctx.old_content_snapshot {
            Some(old) => classify::classify(old, &new_content, &target),
            None => Classification {
                mutation_class: MutationClass::Unknown,
                reason: "No old content captured before the write".to_string(),
                added: Vec::new(),
                removed: Vec::new(),
                changed: Vec::new(),
            },
        };
        ctx.mutation_class = Some(classification.mutation_class);

        if ctx.vcs_revision.is_none() {
            ctx.vcs_revision = vcs::current_revision(&ctx.workspace);
        }

        let related = ctx
            .intent_id
            .as_ref()
            .map(|id| vec![RelatedRef::intent(id.clone())])
            .unwrap_or_default();

        let entry = TraceEntry::new(
            ctx.vcs_revision.clone(),
            classification.mutation_class,
            classification.reason,
            vec![TraceFile {
                relative_path: vcs::to_relative_path(&ctx.workspace, &target),
                conversations: vec![TraceConversation {
                    session_id: ctx.session_id.clone(),
                    contributor: TraceContributor {
                        entity_type: EntityType::Ai,
                        model_identifier: ctx.model_identifier.clone(),
                    },
                    ranges: vec![TraceRange::whole_file(&new_content, &fp)],
                    related,
                }],
            }],
        );

        trace::append_entry(&ctx.workspace, &entry).map_err(|e| {
            GatehouseError::io(
                "ledger_append_failed",
                format!("Failed to append trace entry: {e}"),
                "posthooks:trace_logger",
            )
        })
    }
}

/// Rewrites the human-readable intent map after each write.
pub struct IntentMapUpdater;

impl PostHook for IntentMapUpdater {
    fn name(&self) -> &'static str {
        "intent_map_updater"
    }

    fn run(&self, ctx: &mut ToolContext) -> Result<()> {
        if !tools::is_write_tool(&ctx.tool_name) {
            return Ok(());
        }

        let intents = policy::load_intents(&ctx.workspace)?;
        if intents.is_empty() {
            return Ok(());
        }
        let entries = trace::read_entries(&ctx.workspace).unwrap_or_default();

        let mut view = String::from("# Intent Map\n\nGenerated by the mediation layer.\n");
        for intent in &intents {
            view.push_str(&format!("\n## {} ({})\n\n", intent.id, intent.status));
            view.push_str(&format!("- Name: {}\n", intent.name));
            view.push_str(&format!("- Scope: {}\n", intent.owned_scope.join(", ")));

            let mut touched: Vec<&str> = entries
                .iter()
                .rev()
                .flat_map(|e| &e.files)
                .filter(|f| {
                    f.conversations.iter().any(|c| {
                        c.related
                            .iter()
                            .any(|r| r.kind == "intent" && r.value == intent.id)
                    })
                })
                .map(|f| f.relative_path.as_str())
                .collect();
            touched.dedup();
            touched.truncate(10);
            if !touched.is_empty() {
                view.push_str(&format!("- Recent files: {}\n", touched.join(", ")));
            }
        }

        let path = ctx
            .workspace
            .join(ORCHESTRATION_DIR)
            .join(INTENT_MAP_FILE);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(map_io_err)?;
        }
        std::fs::write(&path, view).map_err(map_io_err)
    }
}

fn map_io_err(e: std::io::Error) -> GatehouseError {
    GatehouseError::io(
        "intent_map_write_failed",
        format!("Failed to write intent map: {e}"),
        "posthooks:intent_map_updater",
    )
}

/// Appends a lesson section to CLAUDE.md when the exported surface changed.
pub struct LessonRecorder;

impl PostHook for LessonRecorder {
    fn name(&self) -> &'static str {
        "lesson_recorder"
    }

    fn run(&self, ctx: &mut ToolContext) -> Result<()> {
        if ctx.mutation_class != Some(MutationClass::IntentEvolution) {
            return Ok(());
        }
        let Some(intent_id) = ctx.intent_id.clone() else {
            return Ok(());
        };

        let target = tools::resolve_target(ctx)
            .map(|t| vcs::to_relative_path(&ctx.workspace, &t))
            .unwrap_or_else(|| "(unknown file)".to_string());

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let section = format!(
            "\n## {timestamp} · {intent_id}\n\n\
             - Tool: `{}`\n\
             - File: `{target}`\n\
             - The exported API surface changed. Review consumers of this \
             module and update the intent's acceptance criteria if the \
             contract moved intentionally.\n",
            ctx.tool_name
        );

        append_lesson(&ctx.workspace, &section).map_err(|e| {
            GatehouseError::io(
                "lesson_append_failed",
                format!("Failed to append lesson: {e}"),
                "posthooks:lesson_recorder",
            )
        })
    }
}

fn append_lesson(workspace: &Path, section: &str) -> std::io::Result<()> {
    let path = workspace.join(LESSONS_FILE);
    let needs_header = !path.exists();

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    file.lock_exclusive()?;
    let result = (|| {
        if needs_header {
            file.write_all(LESSONS_HEADER.as_bytes())?;
        }
        file.write_all(section.as_bytes())?;
        file.flush()
    })();
    let _ = file.unlock();
    result
}
