use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use vchain_client::types::Task;
use vchain_client::{ClientError, ClientResult, TaskPoller, TaskSource, UrlNormalizer};
use vchain_models::{RejectionPolicy, TaskFailureClass};

struct ScriptedSource {
    tasks: Mutex<VecDeque<Task>>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks.into()),
            fetches: AtomicUsize::new(0),
        }
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskSource for ScriptedSource {
    async fn fetch_task(&self, task_id: &str, scope: u64, _cancel: &CancellationToken) -> ClientResult<Task> {
        assert_eq!(task_id, "task-1");
        assert_eq!(scope, 7);
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.tasks
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ClientError::invalid_response("script exhausted"))
    }
}

fn task(value: serde_json::Value) -> Task {
    serde_json::from_value(value).unwrap()
}

fn status(s: &str) -> Task {
    task(serde_json::json!({ "id": "task-1", "status": s, "progressRatio": 0.1 }))
}

fn succeeded(url: &str) -> Task {
    task(serde_json::json!({
        "id": "task-1",
        "status": "SUCCEEDED",
        "artifacts": [{ "url": url, "previewUrls": ["https://p.test/a.jpg"] }]
    }))
}

fn failed(reason: Option<&str>) -> Task {
    task(serde_json::json!({
        "id": "task-1",
        "status": "FAILED",
        "error": { "message": "generation blocked", "reason": reason }
    }))
}

fn poller(policy: RejectionPolicy) -> TaskPoller {
    TaskPoller::new(
        Duration::from_secs(5),
        policy,
        UrlNormalizer::new(Some("https://cdn.test/{id}.mp4".into())).unwrap(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_polls_until_success() {
    let url = "https://bucket.test/0F8FAD5B-D9CB-469F-A165-70867728950E.mp4?sig=1";
    let source = ScriptedSource::new(vec![status("RUNNING"), status("THROTTLED"), succeeded(url)]);
    let start = Instant::now();

    let generation = poller(RejectionPolicy::default())
        .await_completion(&source, status("PENDING"), 7, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(source.fetches(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(15));
    assert_eq!(generation.task_id, "task-1");
    assert_eq!(generation.url, url);
    assert_eq!(
        generation.normalized_url.as_deref(),
        Some("https://cdn.test/0f8fad5b-d9cb-469f-a165-70867728950e.mp4")
    );
    assert_eq!(generation.preview_urls, vec!["https://p.test/a.jpg".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_already_succeeded_needs_no_fetch() {
    let source = ScriptedSource::new(vec![]);
    let generation = poller(RejectionPolicy::default())
        .await_completion(&source, succeeded("https://cdn.test/x.mp4"), 7, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(source.fetches(), 0);
    assert_eq!(generation.normalized_url, None);
}

#[tokio::test(start_paused = true)]
async fn test_policy_rejection_is_not_retried() {
    let source = ScriptedSource::new(vec![]);
    let err = poller(RejectionPolicy::default())
        .await_completion(&source, failed(Some("SAFETY.INPUT.TEXT")), 7, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(source.fetches(), 0);
    assert!(err.is_policy_rejection());
    assert!(!err.is_resubmittable());
    assert!(err.to_string().contains("SAFETY.INPUT.TEXT"));
    match err {
        ClientError::TaskRejected(failure) => {
            assert_eq!(failure.class, TaskFailureClass::Policy);
            assert_eq!(failure.message.as_deref(), Some("generation blocked"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_missing_reason_follows_policy() {
    let source = ScriptedSource::new(vec![]);
    let err = poller(RejectionPolicy::default())
        .await_completion(&source, failed(None), 7, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_resubmittable());

    let err = poller(RejectionPolicy::strict())
        .await_completion(&source, failed(None), 7, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(!err.is_resubmittable());
}

#[tokio::test(start_paused = true)]
async fn test_success_without_artifact_is_invalid() {
    let source = ScriptedSource::new(vec![task(
        serde_json::json!({ "id": "task-1", "status": "SUCCEEDED", "artifacts": [] }),
    )]);
    let err = poller(RejectionPolicy::default())
        .await_completion(&source, status("RUNNING"), 7, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_between_polls() {
    let source = ScriptedSource::new(vec![status("RUNNING"), status("RUNNING")]);
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(7)).await;
        canceller.cancel();
    });

    let err = poller(RejectionPolicy::default())
        .await_completion(&source, status("PENDING"), 7, &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(source.fetches(), 1);
}
