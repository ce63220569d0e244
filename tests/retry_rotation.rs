//! Integration tests for the orchestrated retry loop
//!
//! Drives the orchestrator end to end against a scripted backend, checking
//! that key health carries over between logical requests and that service
//! failures trigger capped exponential backoff.

use async_trait::async_trait;
use screenwing::error::{AppError, AppResult};
use screenwing::keys::KeyPool;
use screenwing::metrics::Metrics;
use screenwing::orchestrator::Orchestrator;
use screenwing::provider::{
    Content, GenerateBackend, GenerateContentRequest, GenerationConfig, Part,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

enum Step {
    Text(&'static str),
    Fail(&'static str),
}

struct ScriptedBackend {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<usize>,
}

impl ScriptedBackend {
    fn new(script: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl GenerateBackend for ScriptedBackend {
    async fn generate(
        &self,
        _api_key: &str,
        _request: &GenerateContentRequest,
    ) -> AppResult<String> {
        *self.calls.lock().unwrap() += 1;
        match self.script.lock().unwrap().pop_front() {
            Some(Step::Text(text)) => Ok(text.to_string()),
            Some(Step::Fail(message)) => Err(AppError::provider(message)),
            None => panic!("backend called more times than scripted"),
        }
    }
}

fn request() -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user(vec![Part::text("hello")])],
        generation_config: GenerationConfig {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 300,
        },
    }
}

fn orchestrator(pool: Arc<KeyPool>, backend: Arc<dyn GenerateBackend>) -> Orchestrator {
    Orchestrator::new(
        pool,
        backend,
        Metrics::new().expect("metrics"),
        Duration::from_secs(5),
    )
}

fn single_key_pool() -> Arc<KeyPool> {
    Arc::new(KeyPool::new(vec![Some("only-key".to_string())]).expect("pool"))
}

#[tokio::test]
async fn failures_accumulate_across_logical_requests_until_blacklist() {
    let pool = single_key_pool();
    let backend = ScriptedBackend::new(vec![
        Step::Fail("quota exceeded"),
        Step::Fail("quota exceeded"),
        Step::Fail("quota exceeded"),
    ]);
    let orchestrator = orchestrator(pool.clone(), backend.clone());

    // First request: two attempts (2 × pool size), both fail
    let err = orchestrator.generate(&request()).await.unwrap_err();
    assert!(err.to_string().contains("quota"));
    assert_eq!(backend.calls(), 2);

    // Second request: the third consecutive failure blacklists the key; the
    // next selection runs dry, which outranks the attempt's own error
    let err = orchestrator.generate(&request()).await.unwrap_err();
    assert!(matches!(err, AppError::AllKeysUnavailable));
    assert_eq!(backend.calls(), 3);

    let statuses = pool.statuses().await;
    assert!(statuses[0].is_blacklisted());

    // Third request: no provider call at all
    let err = orchestrator.generate(&request()).await.unwrap_err();
    assert!(matches!(err, AppError::AllKeysUnavailable));
    assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn blacklist_mid_request_reports_all_keys_unavailable() {
    use screenwing::classify::ErrorKind;

    // Two prior failures leave the only key one error short of blacklisting
    let pool = single_key_pool();
    let index = pool.index(0).expect("index in range");
    pool.record_failure(index, ErrorKind::Quota).await;
    pool.record_failure(index, ErrorKind::Quota).await;

    let backend = ScriptedBackend::new(vec![Step::Fail("quota exceeded")]);
    let err = orchestrator(pool.clone(), backend.clone())
        .generate(&request())
        .await
        .unwrap_err();

    // The in-call failure blacklists the key; the next selection comes up
    // empty and the request fails as unavailable, not with the quota error
    assert!(matches!(err, AppError::AllKeysUnavailable));
    assert_eq!(backend.calls(), 1);
    assert!(pool.statuses().await[0].is_blacklisted());
}

#[tokio::test]
async fn success_after_rate_limit_clears_the_streak() {
    let pool = single_key_pool();
    let backend = ScriptedBackend::new(vec![
        Step::Fail("rate limit exceeded for project"),
        Step::Text("answer"),
    ]);
    let orchestrator = orchestrator(pool.clone(), backend);

    let generation = orchestrator
        .generate(&request())
        .await
        .expect("second attempt succeeds");
    assert_eq!(generation.text, "answer");
    assert_eq!(generation.key_index.get(), 0);

    let statuses = pool.statuses().await;
    assert_eq!(statuses[0].consecutive_errors(), 0);
    assert_eq!(statuses[0].error_count(), 1);
}

#[tokio::test]
async fn service_errors_back_off_but_quota_errors_do_not() {
    tokio::time::pause();

    // Service path: one backoff (1s) between the two attempts
    let pool = single_key_pool();
    let backend = ScriptedBackend::new(vec![
        Step::Fail("503 service unavailable"),
        Step::Fail("503 service unavailable"),
    ]);
    let started = tokio::time::Instant::now();
    orchestrator(pool, backend)
        .generate(&request())
        .await
        .unwrap_err();
    let service_elapsed = started.elapsed();
    assert!(
        service_elapsed >= Duration::from_millis(1000),
        "expected backoff, elapsed {service_elapsed:?}"
    );

    // Quota path: immediate rotation, no backoff
    let pool = single_key_pool();
    let backend = ScriptedBackend::new(vec![
        Step::Fail("quota exceeded"),
        Step::Fail("quota exceeded"),
    ]);
    let started = tokio::time::Instant::now();
    orchestrator(pool, backend)
        .generate(&request())
        .await
        .unwrap_err();
    let quota_elapsed = started.elapsed();
    assert!(
        quota_elapsed < Duration::from_millis(500),
        "expected no backoff, elapsed {quota_elapsed:?}"
    );
}

#[tokio::test]
async fn distinct_keys_are_tried_before_any_repeat() {
    struct RecordingBackend {
        keys: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GenerateBackend for RecordingBackend {
        async fn generate(
            &self,
            api_key: &str,
            _request: &GenerateContentRequest,
        ) -> AppResult<String> {
            self.keys.lock().unwrap().push(api_key.to_string());
            Err(AppError::provider("quota exceeded"))
        }
    }

    let pool = Arc::new(
        KeyPool::new((0..3).map(|i| Some(format!("key-{i}")))).expect("pool"),
    );
    let backend = Arc::new(RecordingBackend {
        keys: Mutex::new(Vec::new()),
    });
    orchestrator(pool, backend.clone())
        .generate(&request())
        .await
        .unwrap_err();

    let used = backend.keys.lock().unwrap().clone();
    // maxAttempts = 6; the first three attempts must cover all three keys
    assert_eq!(used.len(), 6);
    let first_round: std::collections::HashSet<_> = used[..3].iter().collect();
    assert_eq!(first_round.len(), 3);
}
