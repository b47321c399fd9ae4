//! Classification of remote task failures.
//!
//! A failed task carries an optional machine-readable reason. Whether the
//! caller may resubmit depends on that reason; the mapping is a heuristic, so
//! it lives in an overridable [`RejectionPolicy`].

use serde::{Deserialize, Serialize};

/// How a terminal task failure should be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFailureClass {
    /// Input content was rejected by a safety policy. Never resubmit.
    Policy,
    /// Transient output problem; the caller may resubmit.
    Transient,
    /// Any other failure. Not resubmittable.
    Permanent,
}

impl TaskFailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFailureClass::Policy => "policy",
            TaskFailureClass::Transient => "transient",
            TaskFailureClass::Permanent => "permanent",
        }
    }
}

impl std::fmt::Display for TaskFailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured failure of a remote task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    /// Task identifier
    pub task_id: String,
    /// Remote status, verbatim
    pub status: String,
    /// Human-readable message
    pub message: Option<String>,
    /// Machine-readable rejection reason (e.g. `SAFETY.INPUT.TEXT`)
    pub reason: Option<String>,
    /// Moderation category, when the service reports one
    pub moderation_category: Option<String>,
    /// Caller-facing classification
    pub class: TaskFailureClass,
}

impl std::fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task {} {} ({})", self.task_id, self.status, self.class)?;
        if let Some(reason) = &self.reason {
            write!(f, " reason={}", reason)?;
        }
        if let Some(category) = &self.moderation_category {
            write!(f, " category={}", category)?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

/// Maps rejection reasons to a [`TaskFailureClass`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionPolicy {
    /// Reason prefixes that mark an input-content policy rejection.
    pub policy_prefixes: Vec<String>,
    /// Reason prefixes that mark a transient internal output problem.
    pub transient_prefixes: Vec<String>,
    /// Treat a failure without any reason as transient.
    pub missing_reason_is_transient: bool,
}

impl Default for RejectionPolicy {
    fn default() -> Self {
        Self {
            policy_prefixes: vec!["SAFETY.INPUT".to_string()],
            transient_prefixes: vec!["INTERNAL.BAD_OUTPUT".to_string()],
            missing_reason_is_transient: true,
        }
    }
}

impl RejectionPolicy {
    /// Never treat a missing reason as transient.
    pub fn strict() -> Self {
        Self {
            missing_reason_is_transient: false,
            ..Default::default()
        }
    }

    /// Classify a rejection reason.
    pub fn classify(&self, reason: Option<&str>) -> TaskFailureClass {
        let reason = match reason.map(str::trim) {
            Some(r) if !r.is_empty() => r,
            _ => {
                return if self.missing_reason_is_transient {
                    TaskFailureClass::Transient
                } else {
                    TaskFailureClass::Permanent
                };
            }
        };

        if self.policy_prefixes.iter().any(|p| reason.starts_with(p.as_str())) {
            TaskFailureClass::Policy
        } else if self
            .transient_prefixes
            .iter()
            .any(|p| reason.starts_with(p.as_str()))
        {
            TaskFailureClass::Transient
        } else {
            TaskFailureClass::Permanent
        }
    }
}
