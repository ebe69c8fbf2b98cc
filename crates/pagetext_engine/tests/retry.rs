mod common;

use std::time::Duration;

use common::{page, RecordingSink, ScriptedFetcher};
use pagetext_engine::{
    fetch_with_retry, CancellationToken, EngineEvent, FailureKind, FetchError, ItemProgress,
    NullProgressSink, RetryPolicy, Stage,
};

const TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test(start_paused = true)]
async fn always_failing_fetch_uses_whole_budget() {
    let fetcher = ScriptedFetcher::always_failing(FailureKind::Network);
    let policy = RetryPolicy::new(3, Duration::from_secs(1));

    let err = fetch_with_retry(
        &fetcher,
        1,
        "https://example.com",
        policy,
        TIMEOUT,
        &CancellationToken::new(),
        &NullProgressSink,
    )
    .await
    .unwrap_err();

    assert_eq!(fetcher.calls(), 3);
    assert_eq!(
        err.kind,
        FailureKind::RetriesExhausted {
            attempts: 3,
            last: Box::new(FailureKind::Network)
        }
    );
}

#[tokio::test(start_paused = true)]
async fn succeeds_on_third_attempt_after_backoff() {
    let fetcher = ScriptedFetcher::new(
        vec![
            Err(FetchError::new(FailureKind::Timeout, "slow")),
            Err(FetchError::new(FailureKind::HttpStatus(502), "bad gateway")),
        ],
        Ok(page("<p>ok</p>")),
    );
    let policy = RetryPolicy::new(3, Duration::from_secs(1));
    let sink = RecordingSink::new();
    let started = tokio::time::Instant::now();

    let output = fetch_with_retry(
        &fetcher,
        4,
        "https://example.com",
        policy,
        TIMEOUT,
        &CancellationToken::new(),
        &sink,
    )
    .await
    .expect("third attempt succeeds");

    assert_eq!(output.body, "<p>ok</p>");
    assert_eq!(fetcher.calls(), 3);
    // 1s after the first failure, 2s after the second.
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(3) && waited < Duration::from_secs(4));

    let retries: Vec<_> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::Progress(ItemProgress {
                stage: Stage::Retrying,
                attempt,
                ..
            }) => attempt,
            _ => None,
        })
        .collect();
    assert_eq!(retries, vec![2, 3]);
}

#[tokio::test(start_paused = true)]
async fn single_attempt_budget_does_not_sleep() {
    let fetcher = ScriptedFetcher::always_failing(FailureKind::Unexpected);
    let started = tokio::time::Instant::now();

    let err = fetch_with_retry(
        &fetcher,
        1,
        "https://example.com",
        RetryPolicy::new(1, Duration::from_secs(60)),
        TIMEOUT,
        &CancellationToken::new(),
        &NullProgressSink,
    )
    .await
    .unwrap_err();

    assert_eq!(fetcher.calls(), 1);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(err.kind.root(), &FailureKind::Unexpected);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_backoff() {
    let fetcher = ScriptedFetcher::always_failing(FailureKind::Network);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        trigger.cancel();
    });

    let err = fetch_with_retry(
        &fetcher,
        1,
        "https://example.com",
        RetryPolicy::new(5, Duration::from_secs(10)),
        TIMEOUT,
        &cancel,
        &NullProgressSink,
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, FailureKind::Cancelled);
    assert_eq!(fetcher.calls(), 1);
}
