use chrono::NaiveDate;

use vela_core::SyncError;

#[test]
fn retryable_covers_transient_and_rate_limit() {
    assert!(SyncError::transient("p", "503").is_retryable());
    assert!(SyncError::rate_limited("p", Some(1_000)).is_retryable());
    assert!(!SyncError::permanent("p", "404").is_retryable());
    assert!(!SyncError::storage("down").is_retryable());
    assert!(!SyncError::PlanInvariant("bad order".into()).is_retryable());
}

#[test]
fn fatal_covers_storage_and_plan_defects() {
    assert!(SyncError::storage("down").is_fatal());
    assert!(SyncError::PlanInvariant("bad order".into()).is_fatal());
    assert!(!SyncError::transient("p", "503").is_fatal());
    assert!(!SyncError::permanent("p", "404").is_fatal());
}

#[test]
fn display_carries_the_failure_detail() {
    let err = SyncError::transient("provider-x", "connection reset");
    assert_eq!(
        err.to_string(),
        "provider-x transient failure: connection reset"
    );

    let exhausted = SyncError::RetriesExhausted {
        attempts: 3,
        last: Box::new(err),
    };
    assert!(exhausted.to_string().contains("after 3 attempt(s)"));
    assert!(exhausted.to_string().contains("connection reset"));
}

#[test]
fn errors_round_trip_through_serde() {
    let day = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    let errors = vec![
        SyncError::storage("disk full"),
        SyncError::rate_limited("p", None),
        SyncError::RetriesExhausted {
            attempts: 2,
            last: Box::new(SyncError::transient("p", "timeout")),
        },
        SyncError::ConsolidationIncomplete {
            days_failed: vec![day, day.succ_opt().unwrap()],
        },
    ];
    for err in errors {
        let json = serde_json::to_string(&err).unwrap();
        let back: SyncError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
