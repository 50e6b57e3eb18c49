//! Intent policy store - the single reader of the workspace policy files.
//!
//! Every public call re-reads from disk: humans may edit the intent file
//! while an agent is running, and the extra I/O is negligible next to
//! tool-call latency. Nothing here caches.

use crate::core::error::{GatehouseError, Result};
use crate::core::intent::{Intent, IntentStatus};
use chrono::Utc;
use fs2::FileExt;
use globset::GlobBuilder;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Directory holding the policy and ledger files, relative to the workspace.
pub const ORCHESTRATION_DIR: &str = ".orchestration";
/// Intent file name under [`ORCHESTRATION_DIR`].
pub const INTENTS_FILE: &str = "active_intents.yaml";
/// Ignore file name at the workspace root.
pub const IGNORE_FILE: &str = ".intentignore";

/// Invariant header comment preserved across rewrites of the intent file.
const INTENTS_HEADER: &str = "\
# ============================================================
# ACTIVE INTENTS - agent work authorization contract
# Human-authored. The mediation layer only updates status fields.
# ============================================================
";

#[derive(Debug, Default, Serialize, Deserialize)]
struct IntentsDocument {
    #[serde(default)]
    active_intents: Vec<Intent>,
}

/// Returns the path of the intent file for a workspace.
#[must_use]
pub fn intents_path(workspace: &Path) -> PathBuf {
    workspace.join(ORCHESTRATION_DIR).join(INTENTS_FILE)
}

/// Returns the path of the ignore file for a workspace.
#[must_use]
pub fn ignore_path(workspace: &Path) -> PathBuf {
    workspace.join(IGNORE_FILE)
}

/// Loads all intents from the workspace intent file.
///
/// Returns an empty list if the file does not exist.
///
/// # Errors
/// Returns `malformed_intents` if the file exists but cannot be parsed.
pub fn load_intents(workspace: &Path) -> Result<Vec<Intent>> {
    let path = intents_path(workspace);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| {
        GatehouseError::io(
            "intents_read_failed",
            format!("Failed to read {}: {e}", path.display()),
            "core:policy",
        )
    })?;

    let doc: IntentsDocument = serde_yaml::from_str(&content).map_err(|e| {
        GatehouseError::policy(
            "malformed_intents",
            format!("Failed to parse {}: {e}", path.display()),
            "core:policy",
        )
        .with_hint("Fix the YAML by hand; the engine never repairs the intent file")
    })?;

    Ok(doc.active_intents)
}

/// Finds an intent by id.
///
/// # Errors
/// Propagates intent-file read/parse failures.
pub fn find_intent(workspace: &Path, id: &str) -> Result<Option<Intent>> {
    Ok(load_intents(workspace)?.into_iter().find(|i| i.id == id))
}

/// Updates the status of one intent and rewrites the intent file.
///
/// The four-line header comment is preserved; `updated_at` is set to the
/// current UTC time. Status is the only field the engine ever changes.
///
/// # Errors
/// Returns `unknown_intent` if no intent has the given id, or a system
/// error if the rewrite fails.
pub fn update_intent_status(workspace: &Path, id: &str, status: IntentStatus) -> Result<Intent> {
    let mut intents = load_intents(workspace)?;

    let intent = intents.iter_mut().find(|i| i.id == id).ok_or_else(|| {
        GatehouseError::policy(
            "unknown_intent",
            format!("No intent with id '{id}' in the intent file"),
            "core:policy",
        )
    })?;

    intent.status = status;
    intent.updated_at = Utc::now();
    let updated = intent.clone();

    write_intents(workspace, &intents)?;
    Ok(updated)
}

fn write_intents(workspace: &Path, intents: &[Intent]) -> Result<()> {
    let path = intents_path(workspace);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            GatehouseError::io(
                "intents_write_failed",
                format!("Failed to create {}: {e}", parent.display()),
                "core:policy",
            )
        })?;
    }

    let doc = IntentsDocument {
        active_intents: intents.to_vec(),
    };
    let yaml = serde_yaml::to_string(&doc).map_err(|e| {
        GatehouseError::io(
            "intents_write_failed",
            format!("Failed to serialize intents: {e}"),
            "core:policy",
        )
    })?;

    let io_err = |e: std::io::Error| {
        GatehouseError::io(
            "intents_write_failed",
            format!("Failed to rewrite {}: {e}", path.display()),
            "core:policy",
        )
    };

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .map_err(io_err)?;
    file.lock_exclusive().map_err(io_err)?;
    let result = file
        .write_all(INTENTS_HEADER.as_bytes())
        .and_then(|()| file.write_all(yaml.as_bytes()))
        .and_then(|()| file.flush());
    let _ = file.unlock();
    result.map_err(io_err)
}

/// Converts an absolute path to a workspace-relative POSIX path.
///
/// Returns `None` when the path is not under the workspace root.
#[must_use]
pub fn workspace_relative(workspace: &Path, absolute: &Path) -> Option<String> {
    let relative = absolute.strip_prefix(workspace).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

/// Tests whether a single pattern matches a workspace-relative POSIX path.
///
/// `*` matches within one path segment; `**` crosses segments; dotfiles
/// are matched like any other name. Invalid patterns never match.
#[must_use]
pub fn pattern_matches(pattern: &str, relative: &str) -> bool {
    let Ok(glob) = GlobBuilder::new(pattern).literal_separator(true).build() else {
        tracing::warn!(pattern, "skipping invalid scope pattern");
        return false;
    };
    glob.compile_matcher().is_match(relative)
}

/// Checks whether an absolute path falls inside an intent's owned scope.
///
/// Patterns are interpreted relative to the workspace root, never expanded
/// against an arbitrary cwd. Paths outside the workspace are never in scope.
#[must_use]
pub fn is_file_in_scope(workspace: &Path, intent: &Intent, absolute: &Path) -> bool {
    let Some(relative) = workspace_relative(workspace, absolute) else {
        return false;
    };
    intent
        .owned_scope
        .iter()
        .any(|pattern| pattern_matches(pattern, &relative))
}

/// Checks whether an absolute path is covered by `.intentignore`.
///
/// Blank lines and `#`-prefixed comments are skipped. A missing or
/// unreadable ignore file covers nothing.
#[must_use]
pub fn is_file_ignored(workspace: &Path, absolute: &Path) -> bool {
    let Some(relative) = workspace_relative(workspace, absolute) else {
        return false;
    };
    let Ok(content) = std::fs::read_to_string(ignore_path(workspace)) else {
        return false;
    };

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .any(|pattern| pattern_matches(pattern, &relative))
}
