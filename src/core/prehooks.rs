//! Pre-hooks: authorization and enrichment before tool execution.
//!
//! Registration order is load-bearing: the context injector answers the
//! handshake, the gatekeeper requires a declared intent, the scope
//! enforcer checks path authorization, and the lock guard detects stale
//! reads while capturing the pre-write snapshot.

use crate::core::block::{BlockCode, BlockSignal};
use crate::core::context::ToolContext;
use crate::core::fingerprint;
use crate::core::intent::{Intent, IntentStatus};
use crate::core::pipeline::{HookResult, PreHook};
use crate::core::{policy, tools};

/// Escapes text for embedding in the intent context document.
fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Renders the `<intent_context>` document injected for the handshake.
fn render_intent_context(intent: &Intent) -> String {
    let mut doc = String::from("<intent_context>\n");
    doc.push_str(&format!("  <id>{}</id>", xml_escape(&intent.id)));
    doc.push_str(&format!("<name>{}</name>", xml_escape(&intent.name)));
    doc.push_str(&format!("<status>{}</status>\n", intent.status));

    doc.push_str("  <owned_scope>");
    for path in &intent.owned_scope {
        doc.push_str(&format!("<path>{}</path>", xml_escape(path)));
    }
    doc.push_str("</owned_scope>\n");

    doc.push_str("  <constraints>");
    for rule in &intent.constraints {
        doc.push_str(&format!("<rule>{}</rule>", xml_escape(rule)));
    }
    doc.push_str("</constraints>\n");

    doc.push_str("  <acceptance_criteria>");
    for criterion in &intent.acceptance_criteria {
        doc.push_str(&format!("<criterion>{}</criterion>", xml_escape(criterion)));
    }
    doc.push_str("</acceptance_criteria>\n");

    doc.push_str(&format!(
        "  <instructions>You are now working under intent {}. \
         Modify only paths matching the owned scope above and honor every \
         constraint. Calls outside the scope will be blocked.</instructions>\n",
        xml_escape(&intent.id)
    ));
    doc.push_str("</intent_context>");
    doc
}

/// Answers the `select_active_intent` handshake with a synthesized result.
///
/// The real tool is never executed: on success the context carries the
/// injected `<intent_context>` document and the declared intent id.
pub struct ContextInjector;

impl PreHook for ContextInjector {
    fn name(&self) -> &'static str {
        "context_injector"
    }

    fn run(&self, ctx: ToolContext) -> HookResult {
        if ctx.tool_name != tools::SELECT_ACTIVE_INTENT {
            return Ok(ctx);
        }

        let intent_id = match ctx.string_param("intent_id") {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => {
                return Err(BlockSignal::generic(
                    "select_active_intent requires a non-empty string 'intent_id' parameter",
                )
                .into())
            }
        };

        let Some(intent) = policy::find_intent(&ctx.workspace, &intent_id)? else {
            let available: Vec<String> = policy::load_intents(&ctx.workspace)?
                .into_iter()
                .map(|i| i.id)
                .collect();
            return Err(BlockSignal::unknown_intent(format!(
                "No intent with id '{intent_id}'. Available intents: [{}]",
                available.join(", ")
            ))
            .into());
        };

        match intent.status {
            IntentStatus::Complete => Err(BlockSignal::new(
                BlockCode::CompleteIntent,
                format!(
                    "Intent '{intent_id}' is COMPLETE; select an open intent instead"
                ),
            )
            .into()),
            IntentStatus::Blocked => {
                let reason = intent
                    .blocked_reason
                    .as_deref()
                    .unwrap_or("no reason recorded");
                Err(BlockSignal::new(
                    BlockCode::BlockedIntent,
                    format!("Intent '{intent_id}' is BLOCKED: {reason}"),
                )
                .into())
            }
            IntentStatus::Pending | IntentStatus::InProgress => {
                let document = render_intent_context(&intent);
                Ok(ctx.with_intent(intent_id).with_injected_result(document))
            }
        }
    }
}

/// Requires a declared intent before any destructive tool runs.
pub struct IntentGatekeeper;

impl PreHook for IntentGatekeeper {
    fn name(&self) -> &'static str {
        "intent_gatekeeper"
    }

    fn run(&self, ctx: ToolContext) -> HookResult {
        if tools::is_read_only(&ctx.tool_name) {
            return Ok(ctx);
        }

        if tools::is_destructive(&ctx.tool_name) && ctx.intent_id.is_none() {
            return Err(BlockSignal::no_intent_declared(format!(
                "Tool '{}' modifies workspace state but no intent is active. \
                 Call select_active_intent with the id of an intent from \
                 .orchestration/active_intents.yaml before making changes.",
                ctx.tool_name
            ))
            .into());
        }

        Ok(ctx)
    }
}

/// Blocks writes whose target path falls outside the intent's owned scope.
pub struct ScopeEnforcer;

impl PreHook for ScopeEnforcer {
    fn name(&self) -> &'static str {
        "scope_enforcer"
    }

    fn run(&self, ctx: ToolContext) -> HookResult {
        if tools::is_read_only(&ctx.tool_name) {
            return Ok(ctx);
        }
        let Some(intent_id) = ctx.intent_id.clone() else {
            return Ok(ctx);
        };
        let Some(target) = tools::resolve_target(&ctx) else {
            return Ok(ctx);
        };

        if policy::is_file_ignored(&ctx.workspace, &target) {
            return Ok(ctx);
        }

        // The gatekeeper already handled the intent-missing case.
        let Some(intent) = policy::find_intent(&ctx.workspace, &intent_id)? else {
            return Ok(ctx);
        };

        if policy::is_file_in_scope(&ctx.workspace, &intent, &target) {
            return Ok(ctx);
        }

        let relative = policy::workspace_relative(&ctx.workspace, &target)
            .unwrap_or_else(|| target.display().to_string());
        Err(BlockSignal::scope_violation(format!(
            "Intent '{intent_id}' does not authorize writing to '{relative}'. \
             Authorized scope: [{}]. Options: stay inside the scope, select an \
             intent that owns this path, or ask a human to extend the scope.",
            intent.owned_scope.join(", ")
        ))
        .into())
    }
}

/// Detects stale reads before a write and captures the pre-write snapshot.
///
/// Two agents racing on the same file resolve here: exactly one wins; the
/// loser is told to re-read.
pub struct OptimisticLockGuard;

impl PreHook for OptimisticLockGuard {
    fn name(&self) -> &'static str {
        "optimistic_lock_guard"
    }

    fn run(&self, ctx: ToolContext) -> HookResult {
        if !tools::is_write_tool(&ctx.tool_name) {
            return Ok(ctx);
        }
        let Some(target) = tools::resolve_target(&ctx) else {
            return Ok(ctx);
        };
        if !target.exists() {
            // New-file case: nothing to be stale against.
            return Ok(ctx);
        }
        let Ok(current_content) = std::fs::read_to_string(&target) else {
            return Ok(ctx);
        };

        let current_hash = fingerprint::raw_hash(&current_content);

        if let Some(declared) = ctx.string_param("read_hash") {
            if declared != current_hash {
                let relative = policy::workspace_relative(&ctx.workspace, &target)
                    .unwrap_or_else(|| target.display().to_string());
                return Err(BlockSignal::stale_file(format!(
                    "File '{relative}' changed since it was read. Declared hash \
                     {declared}, current hash {current_hash}. Re-read the file \
                     and retry with content based on the fresh version.",
                ))
                .into());
            }
        }

        Ok(ctx.with_snapshot(current_content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};
    use std::path::Path;
    use tempfile::TempDir;

    const INTENTS_YAML: &str = r#"# ============================================================
# ACTIVE INTENTS - agent work authorization contract
# Human-authored. The mediation layer only updates status fields.
# ============================================================
active_intents:
  - id: INT-001
    name: API layer
    status: IN_PROGRESS
    owned_scope: ["src/api/**"]
    constraints: ["Keep endpoints backward compatible"]
    acceptance_criteria: ["Routes respond with JSON"]
    created_at: 2025-01-01T00:00:00Z
    updated_at: 2025-01-01T00:00:00Z
  - id: INT-002
    name: Finished work
    status: COMPLETE
    owned_scope: ["docs/**"]
    created_at: 2025-01-01T00:00:00Z
    updated_at: 2025-01-01T00:00:00Z
  - id: INT-003
    name: Stuck work
    status: BLOCKED
    blocked_reason: waiting on schema review
    owned_scope: ["db/**"]
    created_at: 2025-01-01T00:00:00Z
    updated_at: 2025-01-01T00:00:00Z
"#;

    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        let orchestration = dir.path().join(".orchestration");
        std::fs::create_dir_all(&orchestration).unwrap();
        std::fs::write(orchestration.join("active_intents.yaml"), INTENTS_YAML).unwrap();
        dir
    }

    fn ctx(tool: &str, ws: &Path, pairs: &[(&str, Value)]) -> ToolContext {
        let params: Map<String, Value> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        ToolContext::new(tool, params, ws, "session-1")
    }

    fn block_of(result: HookResult) -> BlockSignal {
        match result {
            Err(crate::core::pipeline::HookError::Block(signal)) => signal,
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn injector_answers_handshake() {
        let ws = workspace();
        let ctx = ctx(
            "select_active_intent",
            ws.path(),
            &[("intent_id", json!("INT-001"))],
        );

        let enriched = ContextInjector.run(ctx).unwrap();
        assert_eq!(enriched.intent_id.as_deref(), Some("INT-001"));

        let doc = enriched.injected_result.unwrap();
        assert!(doc.contains("<id>INT-001</id>"));
        assert!(doc.contains("<path>src/api/**</path>"));
        assert!(doc.contains("<status>IN_PROGRESS</status>"));
        assert!(doc.contains("<rule>Keep endpoints backward compatible</rule>"));
    }

    #[test]
    fn injector_ignores_other_tools() {
        let ws = workspace();
        let ctx = ctx("read_file", ws.path(), &[("path", json!("a.ts"))]);
        let out = ContextInjector.run(ctx).unwrap();
        assert!(out.injected_result.is_none());
    }

    #[test]
    fn injector_rejects_missing_param() {
        let ws = workspace();
        let signal = block_of(ContextInjector.run(ctx("select_active_intent", ws.path(), &[])));
        assert_eq!(signal.code, BlockCode::GenericBlock);

        let signal = block_of(ContextInjector.run(ctx(
            "select_active_intent",
            ws.path(),
            &[("intent_id", json!(7))],
        )));
        assert_eq!(signal.code, BlockCode::GenericBlock);
    }

    #[test]
    fn injector_unknown_intent_lists_available() {
        let ws = workspace();
        let signal = block_of(ContextInjector.run(ctx(
            "select_active_intent",
            ws.path(),
            &[("intent_id", json!("INT-404"))],
        )));

        assert_eq!(signal.code, BlockCode::UnknownIntent);
        assert!(signal.reason.contains("INT-001"));
        assert!(signal.reason.contains("INT-003"));
    }

    #[test]
    fn injector_refuses_complete_and_blocked() {
        let ws = workspace();

        let signal = block_of(ContextInjector.run(ctx(
            "select_active_intent",
            ws.path(),
            &[("intent_id", json!("INT-002"))],
        )));
        assert_eq!(signal.code, BlockCode::CompleteIntent);

        let signal = block_of(ContextInjector.run(ctx(
            "select_active_intent",
            ws.path(),
            &[("intent_id", json!("INT-003"))],
        )));
        assert_eq!(signal.code, BlockCode::BlockedIntent);
        assert!(signal.reason.contains("waiting on schema review"));
    }

    #[test]
    fn gatekeeper_blocks_destructive_without_intent() {
        let ws = workspace();
        let signal = block_of(IntentGatekeeper.run(ctx(
            "write_to_file",
            ws.path(),
            &[("path", json!("src/api/a.ts"))],
        )));
        assert_eq!(signal.code, BlockCode::NoIntentDeclared);
        assert!(signal.reason.contains("select_active_intent"));
    }

    #[test]
    fn gatekeeper_passes_read_only_and_unknown_tools() {
        let ws = workspace();
        assert!(IntentGatekeeper
            .run(ctx("read_file", ws.path(), &[("path", json!("a.ts"))]))
            .is_ok());
        assert!(IntentGatekeeper
            .run(ctx("custom_plugin_tool", ws.path(), &[]))
            .is_ok());
    }

    #[test]
    fn gatekeeper_passes_destructive_with_intent() {
        let ws = workspace();
        let context = ctx("write_to_file", ws.path(), &[("path", json!("x.ts"))])
            .with_intent("INT-001");
        assert!(IntentGatekeeper.run(context).is_ok());
    }

    #[test]
    fn enforcer_allows_in_scope_blocks_out_of_scope() {
        let ws = workspace();

        let allowed = ctx(
            "write_to_file",
            ws.path(),
            &[("path", json!("src/api/routes.ts"))],
        )
        .with_intent("INT-001");
        assert!(ScopeEnforcer.run(allowed).is_ok());

        let denied = ctx(
            "write_to_file",
            ws.path(),
            &[("path", json!("src/ui/button.tsx"))],
        )
        .with_intent("INT-001");
        let signal = block_of(ScopeEnforcer.run(denied));
        assert_eq!(signal.code, BlockCode::ScopeViolation);
        assert!(signal.reason.contains("src/api/**"));
    }

    #[test]
    fn enforcer_passes_without_path_or_intent() {
        let ws = workspace();

        assert!(ScopeEnforcer
            .run(ctx("execute_command", ws.path(), &[("command", json!("ls"))])
                .with_intent("INT-001"))
            .is_ok());
        assert!(ScopeEnforcer
            .run(ctx(
                "write_to_file",
                ws.path(),
                &[("path", json!("anywhere.ts"))]
            ))
            .is_ok());
    }

    #[test]
    fn enforcer_passes_ignored_paths() {
        let ws = workspace();
        std::fs::write(ws.path().join(".intentignore"), "dist/**\n").unwrap();

        let context = ctx(
            "write_to_file",
            ws.path(),
            &[("path", json!("dist/bundle.js"))],
        )
        .with_intent("INT-001");
        assert!(ScopeEnforcer.run(context).is_ok());
    }

    #[test]
    fn enforcer_passes_when_intent_vanished() {
        let ws = workspace();
        let context = ctx(
            "write_to_file",
            ws.path(),
            &[("path", json!("src/ui/button.tsx"))],
        )
        .with_intent("INT-GONE");
        assert!(ScopeEnforcer.run(context).is_ok());
    }

    #[test]
    fn lock_guard_passes_new_file_and_captures_snapshot() {
        let ws = workspace();
        std::fs::create_dir_all(ws.path().join("src")).unwrap();

        let fresh = ctx(
            "write_to_file",
            ws.path(),
            &[("path", json!("src/new.ts")), ("content", json!("x"))],
        );
        let out = OptimisticLockGuard.run(fresh).unwrap();
        assert!(out.old_content_snapshot.is_none());

        std::fs::write(ws.path().join("src/existing.ts"), "old content").unwrap();
        let existing = ctx(
            "write_to_file",
            ws.path(),
            &[("path", json!("src/existing.ts"))],
        );
        let out = OptimisticLockGuard.run(existing).unwrap();
        assert_eq!(out.old_content_snapshot.as_deref(), Some("old content"));
    }

    #[test]
    fn lock_guard_honest_about_hashes() {
        let ws = workspace();
        std::fs::create_dir_all(ws.path().join("src")).unwrap();
        std::fs::write(ws.path().join("src/a.ts"), "current").unwrap();
        let good_hash = fingerprint::raw_hash("current");

        let matching = ctx(
            "write_to_file",
            ws.path(),
            &[("path", json!("src/a.ts")), ("read_hash", json!(good_hash))],
        );
        assert!(OptimisticLockGuard.run(matching).is_ok());

        let stale = ctx(
            "write_to_file",
            ws.path(),
            &[
                ("path", json!("src/a.ts")),
                ("read_hash", json!("raw-sha256:deadbeef")),
            ],
        );
        let signal = block_of(OptimisticLockGuard.run(stale));
        assert_eq!(signal.code, BlockCode::StaleFile);
        assert!(signal.reason.contains("raw-sha256:deadbeef"));
        assert!(signal.reason.contains(&fingerprint::raw_hash("current")));
    }

    #[test]
    fn lock_guard_ignores_non_write_tools() {
        let ws = workspace();
        let context = ctx(
            "execute_command",
            ws.path(),
            &[("path", json!("src/a.ts"))],
        );
        let out = OptimisticLockGuard.run(context).unwrap();
        assert!(out.old_content_snapshot.is_none());
    }

    #[test]
    fn xml_escaping_in_injected_document() {
        let ws = TempDir::new().unwrap();
        let orchestration = ws.path().join(".orchestration");
        std::fs::create_dir_all(&orchestration).unwrap();
        std::fs::write(
            orchestration.join("active_intents.yaml"),
            r#"active_intents:
  - id: INT-XML
    name: Fix <markup> & "quotes"
    status: PENDING
    owned_scope: ["src/**"]
    created_at: 2025-01-01T00:00:00Z
    updated_at: 2025-01-01T00:00:00Z
"#,
        )
        .unwrap();

        let enriched = ContextInjector
            .run(ctx(
                "select_active_intent",
                ws.path(),
                &[("intent_id", json!("INT-XML"))],
            ))
            .unwrap();
        let doc = enriched.injected_result.unwrap();
        assert!(doc.contains("Fix &lt;markup&gt; &amp; &quot;quotes&quot;"));
    }
}
