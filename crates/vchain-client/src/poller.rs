//! Task poller.
//!
//! A submitted task is re-fetched every `interval` while it is pending,
//! running or throttled. The inter-poll sleep and the fetch are the only
//! suspension points, and both observe cancellation.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::info;
use vchain_models::{Generation, RejectionPolicy, TaskFailure, TaskStatus};

use crate::error::{ClientError, ClientResult};
use crate::metrics::record_poll;
use crate::types::Task;

const UUID_PATTERN: &str =
    r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

/// Source of task state, by id and scope.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn fetch_task(
        &self,
        task_id: &str,
        scope: u64,
        cancel: &CancellationToken,
    ) -> ClientResult<Task>;
}

/// Maps host-specific artifact URLs onto a content-addressed template.
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    template: Option<String>,
    uuid: Regex,
}

impl UrlNormalizer {
    /// `template` must contain `{id}`; `None` disables normalisation.
    pub fn new(template: Option<String>) -> ClientResult<Self> {
        if let Some(t) = &template {
            if !t.contains("{id}") {
                return Err(ClientError::config(format!(
                    "asset URL template {:?} has no {{id}} placeholder",
                    t
                )));
            }
        }
        let uuid = Regex::new(UUID_PATTERN)
            .map_err(|e| ClientError::config(format!("invalid UUID pattern: {}", e)))?;
        Ok(Self { template, uuid })
    }

    /// Normalised URL, or `None` when there is no template, no embedded UUID,
    /// or the URL already is the normalised one.
    pub fn normalize(&self, url: &str) -> Option<String> {
        let template = self.template.as_ref()?;
        let id = self.uuid.find(url)?.as_str().to_ascii_lowercase();
        let normalized = template.replace("{id}", &id);
        (normalized != url).then_some(normalized)
    }
}

/// Drives a task to a terminal state.
#[derive(Debug, Clone)]
pub struct TaskPoller {
    interval: Duration,
    policy: RejectionPolicy,
    normalizer: UrlNormalizer,
}

impl TaskPoller {
    pub fn new(interval: Duration, policy: RejectionPolicy, normalizer: UrlNormalizer) -> Self {
        Self {
            interval,
            policy,
            normalizer,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll from the submit response until the task succeeds or fails.
    pub async fn await_completion<S>(
        &self,
        source: &S,
        initial: Task,
        scope: u64,
        cancel: &CancellationToken,
    ) -> ClientResult<Generation>
    where
        S: TaskSource + ?Sized,
    {
        let mut task = initial;
        loop {
            record_poll(task.status.as_str());

            if task.status == TaskStatus::Succeeded {
                return self.success(task);
            }
            if task.status.is_terminal() {
                return Err(ClientError::TaskRejected(self.failure(task)));
            }

            info!(
                task_id = %task.id,
                status = %task.status,
                progress = %task.progress(),
                "Task in progress"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(self.interval) => {}
            }

            task = source.fetch_task(&task.id, scope, cancel).await?;
        }
    }

    fn success(&self, task: Task) -> ClientResult<Generation> {
        let artifact = task.artifacts.into_iter().next().ok_or_else(|| {
            ClientError::invalid_response(format!("task {} succeeded without artifacts", task.id))
        })?;
        if artifact.url.trim().is_empty() {
            return Err(ClientError::invalid_response(format!(
                "task {} succeeded with an empty artifact URL",
                task.id
            )));
        }

        let normalized_url = self.normalizer.normalize(&artifact.url);
        info!(task_id = %task.id, url = %artifact.url, "Task succeeded");

        Ok(Generation {
            task_id: task.id,
            url: artifact.url,
            normalized_url,
            preview_urls: artifact.preview_urls,
        })
    }

    fn failure(&self, task: Task) -> TaskFailure {
        let error = task.error.unwrap_or_default();
        let class = self.policy.classify(error.reason.as_deref());
        TaskFailure {
            task_id: task.id,
            status: task.status.to_string(),
            message: error.message.or(task.progress_text),
            reason: error.reason,
            moderation_category: error.moderation_category,
            class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_extracts_uuid() {
        let normalizer = UrlNormalizer::new(Some("https://cdn.test/{id}.mp4".into())).unwrap();
        let url = "https://bucket.s3.amazonaws.com/out/0F8FAD5B-D9CB-469F-A165-70867728950E.mp4?sig=abc";
        assert_eq!(
            normalizer.normalize(url).as_deref(),
            Some("https://cdn.test/0f8fad5b-d9cb-469f-a165-70867728950e.mp4")
        );
    }

    #[test]
    fn test_normalize_without_uuid_or_template() {
        let normalizer = UrlNormalizer::new(Some("https://cdn.test/{id}.mp4".into())).unwrap();
        assert_eq!(normalizer.normalize("https://host.test/video.mp4"), None);

        let normalizer = UrlNormalizer::new(None).unwrap();
        assert_eq!(
            normalizer.normalize("https://host.test/0f8fad5b-d9cb-469f-a165-70867728950e.mp4"),
            None
        );
    }

    #[test]
    fn test_template_requires_placeholder() {
        assert!(UrlNormalizer::new(Some("https://cdn.test/video.mp4".into())).is_err());
    }
}
