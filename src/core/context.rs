//! Per-call tool context.
//!
//! One context is created per tool call and discarded after post-hooks
//! finish. Hooks never mutate shared input: each pre-hook receives the
//! context by value and returns a new or enriched copy.

use crate::core::classify::MutationClass;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Everything the pipeline knows about one tool call.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Name of the tool the agent is invoking.
    pub tool_name: String,
    /// Tool parameters as sent by the agent.
    pub params: Map<String, Value>,
    /// Absolute workspace root.
    pub workspace: PathBuf,
    /// Active intent, once declared via the handshake or session state.
    pub intent_id: Option<String>,
    /// Mutation class, computed by the trace logger.
    pub mutation_class: Option<MutationClass>,
    /// Pre-write file content captured by the lock guard.
    pub old_content_snapshot: Option<String>,
    /// Result synthesized by a pre-hook; when set, the real tool is skipped.
    pub injected_result: Option<String>,
    /// Head revision, populated lazily by whoever needs it first.
    pub vcs_revision: Option<String>,
    /// Session identifier of the calling agent.
    pub session_id: String,
    /// Model identifier of the calling agent, when known.
    pub model_identifier: Option<String>,
}

impl ToolContext {
    /// Creates a context for one tool call.
    #[must_use]
    pub fn new(
        tool_name: impl Into<String>,
        params: Map<String, Value>,
        workspace: impl Into<PathBuf>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            params,
            workspace: workspace.into(),
            intent_id: None,
            mutation_class: None,
            old_content_snapshot: None,
            injected_result: None,
            vcs_revision: None,
            session_id: session_id.into(),
            model_identifier: None,
        }
    }

    /// Sets the active intent.
    #[must_use]
    pub fn with_intent(mut self, intent_id: impl Into<String>) -> Self {
        self.intent_id = Some(intent_id.into());
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model(mut self, model_identifier: impl Into<String>) -> Self {
        self.model_identifier = Some(model_identifier.into());
        self
    }

    /// Sets the injected result, short-circuiting the real tool.
    #[must_use]
    pub fn with_injected_result(mut self, result: impl Into<String>) -> Self {
        self.injected_result = Some(result.into());
        self
    }

    /// Sets the pre-write content snapshot.
    #[must_use]
    pub fn with_snapshot(mut self, content: impl Into<String>) -> Self {
        self.old_content_snapshot = Some(content.into());
        self
    }

    /// Returns a string parameter, if present and a string.
    #[must_use]
    pub fn string_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}
