//! Error type for the mediation layer itself.
//!
//! Policy verdicts surfaced to the agent are block signals, not errors
//! (see [`crate::core::block`]). What remains is small: the host
//! filesystem can fail, the human-authored policy file can be wrong, and
//! an operator can pass bad input. Everything here is serializable so
//! the CLI can emit errors in the same formats as data.

use serde::{Deserialize, Serialize};

/// The three ways the mediation layer can fail on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Filesystem or other host-level failure.
    Io,
    /// Intent policy file problem: unparseable YAML, unknown id.
    Policy,
    /// Bad operator or agent input.
    Input,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io => write!(f, "io"),
            Self::Policy => write!(f, "policy"),
            Self::Input => write!(f, "input"),
        }
    }
}

/// A failure inside the mediation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatehouseError {
    /// Which failure class this is.
    pub kind: ErrorKind,
    /// Stable machine-readable code, unique within the kind.
    pub code: String,
    /// What went wrong, with the offending path or id inline.
    pub message: String,
    /// Component that raised the error, `area:component` form.
    pub origin: String,
    /// What the caller can do about it, when there is something to do.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl GatehouseError {
    fn with_kind(
        kind: ErrorKind,
        code: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            origin: origin.into(),
            hint: None,
        }
    }

    /// A host-level I/O failure.
    #[must_use]
    pub fn io(
        code: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self::with_kind(ErrorKind::Io, code, message, origin)
    }

    /// A policy file problem.
    #[must_use]
    pub fn policy(
        code: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self::with_kind(ErrorKind::Policy, code, message, origin)
    }

    /// Bad operator or agent input.
    #[must_use]
    pub fn input(
        code: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self::with_kind(ErrorKind::Input, code, message, origin)
    }

    /// Attaches a remediation hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl std::fmt::Display for GatehouseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.origin, self.message, self.code)
    }
}

impl std::error::Error for GatehouseError {}

/// Result type using `GatehouseError`.
pub type Result<T> = std::result::Result<T, GatehouseError>;

/// CLI process outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Error,
    NotFound,
    Blocked,
}

impl ExitCode {
    /// The process exit status for this outcome.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Error => 1,
            Self::NotFound => 2,
            Self::Blocked => 3,
        }
    }
}
