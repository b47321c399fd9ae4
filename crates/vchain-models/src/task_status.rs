//! Remote task status.

use serde::{Deserialize, Serialize};

/// Status reported by the remote service for a generation task.
///
/// Unknown values are kept verbatim so they can be surfaced in failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    Running,
    Throttled,
    Succeeded,
    Failed,
    Cancelled,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Throttled => "THROTTLED",
            TaskStatus::Succeeded => "SUCCEEDED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Cancelled => "CANCELLED",
            TaskStatus::Other(s) => s,
        }
    }

    /// Task is still queued or running; the poller keeps waiting.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            TaskStatus::Pending | TaskStatus::Running | TaskStatus::Throttled
        )
    }

    /// Check if this is a terminal state (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        !self.is_in_progress()
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PENDING" => TaskStatus::Pending,
            "RUNNING" => TaskStatus::Running,
            "THROTTLED" => TaskStatus::Throttled,
            "SUCCEEDED" => TaskStatus::Succeeded,
            "FAILED" => TaskStatus::Failed,
            "CANCELLED" => TaskStatus::Cancelled,
            _ => TaskStatus::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip_known_and_unknown() {
        let s: TaskStatus = serde_json::from_str("\"THROTTLED\"").unwrap();
        assert_eq!(s, TaskStatus::Throttled);
        assert!(s.is_in_progress());

        let s: TaskStatus = serde_json::from_str("\"ABORTED\"").unwrap();
        assert_eq!(s, TaskStatus::Other("ABORTED".into()));
        assert!(s.is_terminal());
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"ABORTED\"");
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskStatus::Succeeded.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }
}
