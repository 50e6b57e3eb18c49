//! Fixed tool classifications and parameter conventions.
//!
//! The mediation layer does not implement tools; it only needs to know
//! which names are read-only, which are destructive, and which of the
//! destructive set actually write a target file.

use crate::core::context::ToolContext;
use std::path::PathBuf;

/// The handshake tool, answered by injection and never executed.
pub const SELECT_ACTIVE_INTENT: &str = "select_active_intent";

/// Read-only and meta tools that pass the gatekeeper unconditionally.
pub const READ_ONLY_TOOLS: &[&str] = &[
    "read_file",
    "list_files",
    "list_directory",
    "search_files",
    "get_file_info",
    "codebase_search",
    "read_command_output",
    "select_active_intent",
    "attempt_completion",
    "ask_followup_question",
    "switch_mode",
    "use_mcp_tool",
    "access_mcp_resource",
    "run_slash_command",
    "skill",
    "update_todo_list",
    "new_task",
];

/// Tools that mutate workspace state and require a declared intent.
pub const DESTRUCTIVE_TOOLS: &[&str] = &[
    "write_file",
    "write_to_file",
    "create_file",
    "apply_diff",
    "apply_patch",
    "edit",
    "search_and_replace",
    "search_replace",
    "edit_file",
    "insert_code_block",
    "replace_in_file",
    "delete_file",
    "execute_command",
    "run_terminal_command",
    "generate_image",
];

/// Destructive tools with no meaningful target file; excluded from the
/// write subset used by the lock guard and trace logger.
const NON_WRITE_DESTRUCTIVE: &[&str] = &["execute_command", "run_terminal_command", "generate_image"];

/// Parameter names probed, in order, for the target path of a tool call.
pub const PATH_PARAM_KEYS: &[&str] = &["path", "file_path", "target_file", "destination"];

/// Checks membership in the read-only/meta allowlist.
#[must_use]
pub fn is_read_only(tool_name: &str) -> bool {
    READ_ONLY_TOOLS.contains(&tool_name)
}

/// Checks membership in the destructive set.
#[must_use]
pub fn is_destructive(tool_name: &str) -> bool {
    DESTRUCTIVE_TOOLS.contains(&tool_name)
}

/// Checks membership in the write subset of the destructive set.
#[must_use]
pub fn is_write_tool(tool_name: &str) -> bool {
    is_destructive(tool_name) && !NON_WRITE_DESTRUCTIVE.contains(&tool_name)
}

/// Extracts the target path parameter from a call, first key wins.
#[must_use]
pub fn target_path(ctx: &ToolContext) -> Option<String> {
    PATH_PARAM_KEYS
        .iter()
        .find_map(|key| ctx.string_param(key))
        .map(str::to_string)
}

/// Resolves the target path to an absolute path under the workspace.
#[must_use]
pub fn resolve_target(ctx: &ToolContext) -> Option<PathBuf> {
    let raw = target_path(ctx)?;
    let path = PathBuf::from(&raw);
    if path.is_absolute() {
        Some(path)
    } else {
        Some(ctx.workspace.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx_with(pairs: &[(&str, &str)]) -> ToolContext {
        let params = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), json!(v)))
            .collect();
        ToolContext::new("write_file", params, "/work", "session-1")
    }

    #[test]
    fn classification_is_disjoint_for_known_tools() {
        for name in READ_ONLY_TOOLS {
            assert!(!is_destructive(name), "{name} in both sets");
        }
        assert!(is_read_only("read_file"));
        assert!(is_destructive("write_to_file"));
        assert!(!is_read_only("write_to_file"));
        assert!(!is_destructive("some_plugin_tool"));
    }

    #[test]
    fn write_subset_excludes_process_tools() {
        assert!(is_write_tool("write_file"));
        assert!(is_write_tool("apply_diff"));
        assert!(is_destructive("execute_command"));
        assert!(!is_write_tool("execute_command"));
        assert!(!is_write_tool("generate_image"));
    }

    #[test]
    fn path_keys_probed_in_order() {
        let ctx = ctx_with(&[("target_file", "b.ts"), ("path", "a.ts")]);
        assert_eq!(target_path(&ctx), Some("a.ts".to_string()));

        let ctx = ctx_with(&[("destination", "d.ts")]);
        assert_eq!(target_path(&ctx), Some("d.ts".to_string()));

        let ctx = ctx_with(&[("content", "no path here")]);
        assert_eq!(target_path(&ctx), None);
    }

    #[test]
    fn target_resolution_joins_workspace() {
        let ctx = ctx_with(&[("path", "src/a.ts")]);
        assert_eq!(resolve_target(&ctx), Some(PathBuf::from("/work/src/a.ts")));

        let ctx = ctx_with(&[("path", "/abs/a.ts")]);
        assert_eq!(resolve_target(&ctx), Some(PathBuf::from("/abs/a.ts")));
    }
}
