use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use vela::CoverageAnalyzer;
use vela_core::timeseries::aggregate::day_floor;
use vela_core::{
    AssetId, Granularity, PriceRecord, SyncConfig, SyncError, SyncStrategy, TimeRange,
};
use vela_mock::{MemoryStore, bar_at, hourly_records};

const ASSET: AssetId = AssetId(7);

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

fn base() -> Decimal {
    Decimal::new(100, 0)
}

async fn assess(store: &MemoryStore) -> Result<vela::CoverageAssessment, SyncError> {
    let cfg = SyncConfig::default();
    CoverageAnalyzer::new(&cfg).assess(store, ASSET, now()).await
}

#[tokio::test]
async fn empty_store_recommends_full_fetch() {
    let store = MemoryStore::new();
    let assessment = assess(&store).await.unwrap();
    assert!(assessment.snapshot.is_empty());
    assert_eq!(assessment.strategy, SyncStrategy::FullFetch);
    assert_eq!(assessment.snapshot.overlap_days(), 0);
}

#[tokio::test]
async fn gap_and_overlap_recommend_smart_overlap_resolution() {
    // 37 days of hourly data whose newest record trails now by 6 hours.
    let store = MemoryStore::new();
    store
        .seed(hourly_records(ASSET, now() - Duration::hours(5), 37 * 24, base()))
        .await;
    let assessment = assess(&store).await.unwrap();
    assert_eq!(assessment.strategy, SyncStrategy::SmartOverlapResolution);
    assert!(assessment.snapshot.gap.is_some());
    assert!(assessment.snapshot.overlap.is_some());
}

#[tokio::test]
async fn recent_gap_alone_recommends_incremental_update() {
    // 10 days of hourly data, newest record 6 hours old: inside the
    // provider window, so no overlap zone.
    let store = MemoryStore::new();
    store
        .seed(hourly_records(ASSET, now() - Duration::hours(5), 10 * 24, base()))
        .await;
    let assessment = assess(&store).await.unwrap();
    assert_eq!(assessment.strategy, SyncStrategy::IncrementalUpdate);
    let gap = assessment.snapshot.gap.unwrap();
    assert_eq!(gap.hours, 6);
    assert!(assessment.snapshot.overlap.is_none());
}

#[tokio::test]
async fn overlap_without_gap_recommends_consolidation() {
    // 888 hourly records ending one hour ago: 37 days of data against a
    // 30-day window leaves a 7-day overlap zone and no recent gap.
    let store = MemoryStore::new();
    store.seed(hourly_records(ASSET, now(), 888, base())).await;
    let assessment = assess(&store).await.unwrap();
    assert_eq!(assessment.strategy, SyncStrategy::OverlapConsolidation);
    assert!(assessment.snapshot.gap.is_none());

    let zone = assessment.snapshot.overlap.unwrap();
    assert_eq!(zone.days, 7);
    assert_eq!(
        zone.range,
        TimeRange {
            start: day_floor(now() - Duration::days(37)),
            end: day_floor(now() - Duration::days(30)),
        }
    );
    assert_eq!(assessment.snapshot.overlap_days(), 7);
}

#[tokio::test]
async fn current_coverage_recommends_maintenance() {
    let store = MemoryStore::new();
    store.seed(hourly_records(ASSET, now(), 48, base())).await;
    let assessment = assess(&store).await.unwrap();
    assert_eq!(assessment.strategy, SyncStrategy::MaintenanceUpdate);
}

#[tokio::test]
async fn daily_only_coverage_recommends_maintenance() {
    let store = MemoryStore::new();
    let day = day_floor(now() - Duration::days(40));
    store
        .seed(vec![PriceRecord::new(
            ASSET,
            Granularity::Daily,
            bar_at(day, base()),
        )])
        .await;
    let assessment = assess(&store).await.unwrap();
    assert!(assessment.snapshot.hourly.is_none());
    assert_eq!(assessment.strategy, SyncStrategy::MaintenanceUpdate);
}

#[tokio::test]
async fn poisoned_store_aborts_with_storage_error() {
    let store = MemoryStore::new();
    store.poison_reads().await;
    let err = assess(&store).await.unwrap_err();
    assert!(matches!(err, SyncError::Storage(_)));
    assert!(err.is_fatal());
}
