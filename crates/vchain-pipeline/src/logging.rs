//! Structured workflow logging.

use tracing::{info, warn, Span};

/// Logs workflow lifecycle events with consistent `workflow`/`step` fields.
#[derive(Debug, Clone)]
pub struct ChainLogger {
    workflow: String,
    subject: String,
}

impl ChainLogger {
    /// `subject` is the input the workflow runs on, usually a file name.
    pub fn new(workflow: &str, subject: impl Into<String>) -> Self {
        Self {
            workflow: workflow.to_string(),
            subject: subject.into(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(workflow = %self.workflow, subject = %self.subject, "Chain started: {}", message);
    }

    /// Progress within one numbered step (1-based).
    pub fn log_step(&self, step: usize, total: usize, message: &str) {
        info!(
            workflow = %self.workflow,
            step,
            total,
            "Step {}/{}: {}", step, total, message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(workflow = %self.workflow, subject = %self.subject, "Chain warning: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(workflow = %self.workflow, subject = %self.subject, "Chain completed: {}", message);
    }

    /// Span wrapping a whole workflow run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("chain", workflow = %self.workflow, subject = %self.subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_fields() {
        let logger = ChainLogger::new("extend", "car.mp4");
        assert_eq!(logger.workflow, "extend");
        assert_eq!(logger.subject, "car.mp4");
    }
}
