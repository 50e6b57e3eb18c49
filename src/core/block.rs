//! Block signals - pipeline short-circuits surfaced to the agent.
//!
//! A block signal is not an internal error: it is an intentional policy
//! verdict carrying a reason and a machine-readable code, returned to the
//! agent as the tool's result.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Machine-readable block code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockCode {
    /// A destructive tool was called without an active intent.
    NoIntentDeclared,
    /// The target path is outside the intent's owned scope.
    ScopeViolation,
    /// The file changed since the agent last read it.
    StaleFile,
    /// The requested intent id does not exist.
    UnknownIntent,
    /// The requested intent is already complete.
    CompleteIntent,
    /// The requested intent is blocked.
    BlockedIntent,
    /// Catch-all for contained pre-hook failures and invalid input.
    GenericBlock,
}

impl std::fmt::Display for BlockCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoIntentDeclared => "NO_INTENT_DECLARED",
            Self::ScopeViolation => "SCOPE_VIOLATION",
            Self::StaleFile => "STALE_FILE",
            Self::UnknownIntent => "UNKNOWN_INTENT",
            Self::CompleteIntent => "COMPLETE_INTENT",
            Self::BlockedIntent => "BLOCKED_INTENT",
            Self::GenericBlock => "GENERIC_BLOCK",
        };
        write!(f, "{s}")
    }
}

/// A pipeline short-circuit: reason plus code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSignal {
    /// Human-readable reason with remediation guidance.
    pub reason: String,
    /// Machine-readable block code.
    pub code: BlockCode,
}

impl BlockSignal {
    /// Creates a new block signal.
    #[must_use]
    pub fn new(code: BlockCode, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            code,
        }
    }

    /// Creates a `NO_INTENT_DECLARED` block.
    #[must_use]
    pub fn no_intent_declared(reason: impl Into<String>) -> Self {
        Self::new(BlockCode::NoIntentDeclared, reason)
    }

    /// Creates a `SCOPE_VIOLATION` block.
    #[must_use]
    pub fn scope_violation(reason: impl Into<String>) -> Self {
        Self::new(BlockCode::ScopeViolation, reason)
    }

    /// Creates a `STALE_FILE` block.
    #[must_use]
    pub fn stale_file(reason: impl Into<String>) -> Self {
        Self::new(BlockCode::StaleFile, reason)
    }

    /// Creates an `UNKNOWN_INTENT` block.
    #[must_use]
    pub fn unknown_intent(reason: impl Into<String>) -> Self {
        Self::new(BlockCode::UnknownIntent, reason)
    }

    /// Creates a `GENERIC_BLOCK` block.
    #[must_use]
    pub fn generic(reason: impl Into<String>) -> Self {
        Self::new(BlockCode::GenericBlock, reason)
    }

    /// Renders the agent-facing error payload.
    #[must_use]
    pub fn error_payload(&self) -> Value {
        json!({
            "type": "error",
            "error": self.reason,
            "code": self.code,
        })
    }
}

impl std::fmt::Display for BlockSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.reason)
    }
}
