use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use vela::executor::{FetchExecutor, RequestBudget, RetrySchedule, RetryState, RetryStep};
use vela_core::{
    BackoffConfig, FetchTask, Granularity, MergeMode, SyncConfig, SyncError, TimeRange,
};
use vela_mock::{CallScript, ScriptedProvider};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

/// Jitter off so delays are exact in assertions.
fn no_jitter_backoff() -> BackoffConfig {
    BackoffConfig {
        base_ms: 100,
        max_ms: 1_000,
        factor: 2,
        jitter_percent: 0,
    }
}

fn test_cfg() -> SyncConfig {
    SyncConfig {
        backoff: no_jitter_backoff(),
        ..SyncConfig::default()
    }
}

fn hourly_task() -> FetchTask {
    FetchTask::fetch(
        Granularity::Hourly,
        TimeRange::last_hours(now(), 24),
        MergeMode::NewData,
    )
}

#[test]
fn schedule_walks_idle_attempting_backoff_exhausted() {
    let mut schedule = RetrySchedule::new(3, no_jitter_backoff(), Duration::from_millis(50));
    assert_eq!(schedule.state(), RetryState::Idle);

    assert_eq!(schedule.begin(), Some(1));
    assert_eq!(schedule.state(), RetryState::Attempting { attempt: 1 });
    assert_eq!(
        schedule.on_failure(&SyncError::transient("p", "503")),
        RetryStep::RetryAfter(Duration::from_millis(100))
    );

    assert_eq!(schedule.begin(), Some(2));
    assert_eq!(
        schedule.on_failure(&SyncError::transient("p", "503")),
        RetryStep::RetryAfter(Duration::from_millis(200))
    );

    assert_eq!(schedule.begin(), Some(3));
    assert_eq!(
        schedule.on_failure(&SyncError::transient("p", "503")),
        RetryStep::GiveUp
    );
    assert_eq!(schedule.state(), RetryState::Exhausted);
    assert_eq!(schedule.begin(), None);
}

#[test]
fn permanent_failure_exhausts_immediately() {
    let mut schedule = RetrySchedule::new(3, no_jitter_backoff(), Duration::from_millis(50));
    schedule.begin();
    assert_eq!(
        schedule.on_failure(&SyncError::permanent("p", "404")),
        RetryStep::GiveUp
    );
    assert_eq!(schedule.state(), RetryState::Exhausted);
}

#[test]
fn rate_limit_uses_the_advertised_cooldown() {
    let mut schedule = RetrySchedule::new(3, no_jitter_backoff(), Duration::from_millis(50));
    schedule.begin();
    assert_eq!(
        schedule.on_failure(&SyncError::rate_limited("p", Some(1_234))),
        RetryStep::RetryAfter(Duration::from_millis(1_234))
    );
}

#[test]
fn rate_limit_without_a_hint_uses_the_default_cooldown() {
    let mut schedule = RetrySchedule::new(3, no_jitter_backoff(), Duration::from_millis(50));
    schedule.begin();
    assert_eq!(
        schedule.on_failure(&SyncError::rate_limited("p", None)),
        RetryStep::RetryAfter(Duration::from_millis(50))
    );
}

#[test]
fn transient_delay_is_capped_at_the_maximum() {
    let mut schedule = RetrySchedule::new(5, no_jitter_backoff(), Duration::from_millis(50));
    for _ in 0..4 {
        schedule.begin();
        let step = schedule.on_failure(&SyncError::transient("p", "503"));
        if let RetryStep::RetryAfter(delay) = step {
            assert!(delay <= Duration::from_millis(1_000));
        }
    }
    // Attempt 4 would be 100 * 2^3 = 800; attempt 5 would exceed the cap.
    schedule.begin();
    assert_eq!(schedule.state(), RetryState::Attempting { attempt: 5 });
}

#[tokio::test(start_paused = true)]
async fn transient_failures_retry_until_success() {
    let provider = ScriptedProvider::new();
    provider
        .push_script(CallScript::Fail(SyncError::transient("scripted", "503")))
        .await;
    provider
        .push_script(CallScript::Fail(SyncError::transient("scripted", "503")))
        .await;
    let budget = RequestBudget::per_minute(60);
    let cfg = test_cfg();
    let executor = FetchExecutor::new(&provider, &budget, &cfg);

    let outcomes = executor.execute("BTC-USD", &[hourly_task()]).await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].result.is_ok());
    assert_eq!(outcomes[0].attempts, 3);
    assert_eq!(provider.call_count().await, 3);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_cooldown_is_waited_out() {
    let provider = ScriptedProvider::new();
    provider
        .push_script(CallScript::Fail(SyncError::rate_limited(
            "scripted",
            Some(5_000),
        )))
        .await;
    let budget = RequestBudget::per_minute(60);
    let cfg = test_cfg();
    let executor = FetchExecutor::new(&provider, &budget, &cfg);

    let started = tokio::time::Instant::now();
    let outcomes = executor.execute("BTC-USD", &[hourly_task()]).await;
    assert!(outcomes[0].result.is_ok());
    assert_eq!(outcomes[0].attempts, 2);
    assert!(started.elapsed() >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn permanent_failure_abandons_the_task_but_not_the_run() {
    let provider = ScriptedProvider::new();
    provider
        .push_script(CallScript::Fail(SyncError::permanent("scripted", "410")))
        .await;
    let budget = RequestBudget::per_minute(60);
    let cfg = test_cfg();
    let executor = FetchExecutor::new(&provider, &budget, &cfg);

    let daily_task = FetchTask::fetch(
        Granularity::Daily,
        TimeRange::last_days(now(), 5),
        MergeMode::NewData,
    );
    let outcomes = executor.execute("BTC-USD", &[hourly_task(), daily_task]).await;
    assert_eq!(outcomes.len(), 2);
    assert!(matches!(
        outcomes[0].result,
        Err(SyncError::ProviderPermanent { .. })
    ));
    assert_eq!(outcomes[0].attempts, 1);
    assert!(outcomes[1].result.is_ok());
}

#[tokio::test(start_paused = true)]
async fn spent_attempt_budget_reports_retries_exhausted() {
    let provider = ScriptedProvider::new();
    for _ in 0..3 {
        provider
            .push_script(CallScript::Fail(SyncError::transient("scripted", "503")))
            .await;
    }
    let budget = RequestBudget::per_minute(60);
    let cfg = test_cfg();
    let executor = FetchExecutor::new(&provider, &budget, &cfg);

    let outcomes = executor.execute("BTC-USD", &[hourly_task()]).await;
    assert!(matches!(
        outcomes[0].result,
        Err(SyncError::RetriesExhausted { attempts: 3, .. })
    ));
    assert_eq!(provider.call_count().await, 3);
}

#[tokio::test(start_paused = true)]
async fn a_hanging_call_trips_the_timeout_and_retries() {
    let provider = ScriptedProvider::new();
    provider.push_script(CallScript::Hang).await;
    let budget = RequestBudget::per_minute(60);
    let cfg = test_cfg();
    let executor = FetchExecutor::new(&provider, &budget, &cfg);

    let outcomes = executor.execute("BTC-USD", &[hourly_task()]).await;
    assert!(outcomes[0].result.is_ok());
    assert_eq!(outcomes[0].attempts, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn budget_blocks_once_the_window_is_spent() {
    let budget = RequestBudget::new(2, Duration::from_millis(100));
    let started = std::time::Instant::now();
    budget.acquire().await;
    budget.acquire().await;
    assert_eq!(budget.remaining(), 0);
    budget.acquire().await;
    assert!(started.elapsed() >= Duration::from_millis(80));
    assert_eq!(budget.remaining(), 1);
}
