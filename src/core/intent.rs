//! Intent model - declarative work units from the workspace policy file.
//!
//! An intent binds an identifier to an authorized scope and a set of
//! human-readable constraints. Intents are human-authored; the engine only
//! ever updates `status` and `updated_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    /// Declared but not started.
    Pending,
    /// Actively being worked.
    InProgress,
    /// Blocked on something external; see `blocked_reason`.
    Blocked,
    /// Finished; no further modifications authorized.
    Complete,
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Blocked => "BLOCKED",
            Self::Complete => "COMPLETE",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for IntentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "BLOCKED" => Ok(Self::Blocked),
            "COMPLETE" => Ok(Self::Complete),
            other => Err(format!("unknown intent status: {other}")),
        }
    }
}

/// Kind of entity contributing to an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Ai,
    Human,
}

/// A contributor record attached to an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    /// Whether this contributor is an AI agent or a human.
    pub entity_type: EntityType,
    /// Model identifier for AI contributors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_identifier: Option<String>,
    /// Session identifier for AI contributors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Last time this contributor was active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<DateTime<Utc>>,
}

/// A declarative work unit binding an id to an authorized scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Unique identifier (e.g. "INT-001").
    pub id: String,
    /// Short human-readable name.
    pub name: String,
    /// Lifecycle status.
    pub status: IntentStatus,
    /// Glob patterns (workspace-relative, POSIX separators) the intent may modify.
    #[serde(default)]
    pub owned_scope: Vec<String>,
    /// Human-readable rules; opaque to the engine.
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Completion criteria; opaque to the engine.
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    /// Ids of intents this one depends on.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Contributors working under this intent.
    #[serde(default)]
    pub contributors: Vec<Contributor>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp; touched by status updates.
    pub updated_at: DateTime<Utc>,
    /// Why the intent is blocked, when `status == BLOCKED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
}

impl Intent {
    /// Creates a minimal intent with the given id, name and scope.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, owned_scope: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            status: IntentStatus::Pending,
            owned_scope,
            constraints: Vec::new(),
            acceptance_criteria: Vec::new(),
            depends_on: Vec::new(),
            contributors: Vec::new(),
            created_at: now,
            updated_at: now,
            blocked_reason: None,
        }
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: IntentStatus) -> Self {
        self.status = status;
        self
    }

    /// Adds a constraint.
    #[must_use]
    pub fn with_constraint(mut self, rule: impl Into<String>) -> Self {
        self.constraints.push(rule.into());
        self
    }

    /// Adds an acceptance criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: impl Into<String>) -> Self {
        self.acceptance_criteria.push(criterion.into());
        self
    }

    /// Sets the blocked reason.
    #[must_use]
    pub fn with_blocked_reason(mut self, reason: impl Into<String>) -> Self {
        self.blocked_reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_format() {
        let yaml = serde_yaml::to_string(&IntentStatus::InProgress).unwrap();
        assert_eq!(yaml.trim(), "IN_PROGRESS");

        let parsed: IntentStatus = serde_yaml::from_str("COMPLETE").unwrap();
        assert_eq!(parsed, IntentStatus::Complete);
    }

    #[test]
    fn status_from_str() {
        assert_eq!(
            "in_progress".parse::<IntentStatus>().unwrap(),
            IntentStatus::InProgress
        );
        assert!("DONE".parse::<IntentStatus>().is_err());
    }

    #[test]
    fn intent_yaml_round_trip() {
        let intent = Intent::new("INT-001", "API routes", vec!["src/api/**".to_string()])
            .with_status(IntentStatus::InProgress)
            .with_constraint("No breaking changes to public endpoints")
            .with_criterion("All routes respond with JSON");

        let yaml = serde_yaml::to_string(&intent).unwrap();
        let restored: Intent = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(restored.id, "INT-001");
        assert_eq!(restored.status, IntentStatus::InProgress);
        assert_eq!(restored.owned_scope, vec!["src/api/**".to_string()]);
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let yaml = r"
id: INT-002
name: Minimal
status: PENDING
created_at: 2025-01-01T00:00:00Z
updated_at: 2025-01-01T00:00:00Z
";
        let intent: Intent = serde_yaml::from_str(yaml).unwrap();
        assert!(intent.owned_scope.is_empty());
        assert!(intent.contributors.is_empty());
        assert!(intent.blocked_reason.is_none());
    }

    #[test]
    fn contributor_serialization() {
        let contributor = Contributor {
            entity_type: EntityType::Ai,
            model_identifier: Some("claude-sonnet".to_string()),
            session_id: None,
            last_active: None,
        };

        let json = serde_json::to_string(&contributor).unwrap();
        assert!(json.contains("\"entity_type\":\"AI\""));
        assert!(!json.contains("session_id"));
    }
}
