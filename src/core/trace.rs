//! Append-only audit ledger.
//!
//! One self-contained JSON line per successful mutation, appended to
//! `.orchestration/agent_trace.jsonl`. Per-line atomicity relies on
//! POSIX append semantics plus an advisory lock around the write.

use crate::core::classify::MutationClass;
use crate::core::fingerprint::{Fingerprint, HashMethod};
use crate::core::intent::EntityType;
use crate::core::policy::ORCHESTRATION_DIR;
use chrono::{SecondsFormat, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Ledger file name under the orchestration directory.
pub const TRACE_FILE: &str = "agent_trace.jsonl";

/// Errors from the ledger writer.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Version-control identity captured with an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsInfo {
    /// Head commit at trace time; null when unavailable.
    pub revision_id: Option<String>,
}

/// A hashed line range of the post-write content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRange {
    pub start_line: usize,
    pub end_line: usize,
    pub content_hash: String,
    pub hash_method: HashMethod,
    pub ast_node_count: usize,
}

impl TraceRange {
    /// Builds the whole-file range for the given content and fingerprint.
    #[must_use]
    pub fn whole_file(content: &str, fingerprint: &Fingerprint) -> Self {
        Self {
            start_line: 1,
            end_line: content.lines().count(),
            content_hash: fingerprint.hash.clone(),
            hash_method: fingerprint.method,
            ast_node_count: fingerprint.node_count,
        }
    }
}

/// A typed cross-reference attached to a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl RelatedRef {
    /// References the intent a mutation was made under.
    #[must_use]
    pub fn intent(id: impl Into<String>) -> Self {
        Self {
            kind: "intent".to_string(),
            value: id.into(),
        }
    }
}

/// The contributing agent recorded with a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContributor {
    pub entity_type: EntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_identifier: Option<String>,
}

/// One session's touch on a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceConversation {
    pub session_id: String,
    pub contributor: TraceContributor,
    pub ranges: Vec<TraceRange>,
    #[serde(default)]
    pub related: Vec<RelatedRef>,
}

/// A file touched by the traced mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFile {
    pub relative_path: String,
    pub conversations: Vec<TraceConversation>,
}

/// One line of the audit ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub id: Uuid,
    /// ISO-8601 UTC with trailing `Z`.
    pub timestamp: String,
    pub vcs: VcsInfo,
    pub mutation_class: MutationClass,
    pub classification_reason: String,
    pub files: Vec<TraceFile>,
}

impl TraceEntry {
    /// Creates an entry stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(
        revision_id: Option<String>,
        mutation_class: MutationClass,
        classification_reason: impl Into<String>,
        files: Vec<TraceFile>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            vcs: VcsInfo { revision_id },
            mutation_class,
            classification_reason: classification_reason.into(),
            files,
        }
    }
}

/// Returns the ledger path for a workspace.
#[must_use]
pub fn trace_path(workspace: &Path) -> PathBuf {
    workspace.join(ORCHESTRATION_DIR).join(TRACE_FILE)
}

/// Appends one entry as a single JSON line, creating directories as needed.
///
/// # Errors
/// Returns an error if the directory, lock or write fails; callers in the
/// post-chain log and swallow it.
pub fn append_entry(workspace: &Path, entry: &TraceEntry) -> Result<()> {
    let path = trace_path(workspace);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(entry)?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    file.lock_exclusive()?;
    let result = writeln!(file, "{json}").and_then(|()| file.flush());
    let _ = file.unlock();
    result?;
    Ok(())
}

/// Reads all parseable entries from the ledger, oldest first.
///
/// Unparseable lines are skipped: a torn or foreign line must not make
/// the whole ledger unreadable.
///
/// # Errors
/// Returns an error only when the file exists but cannot be read.
pub fn read_entries(workspace: &Path) -> Result<Vec<TraceEntry>> {
    let path = trace_path(workspace);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&path)?;
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<TraceEntry>(line).ok())
        .collect())
}
