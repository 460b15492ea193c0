//! Deterministic `PriceStore` and `PriceProvider` doubles for tests and
//! examples.
//!
//! [`MemoryStore`] keeps records in ordered maps behind an async mutex and
//! honors the engine's atomic-batch contract; reads can be poisoned and
//! commits can be made to fail inside chosen ranges to drive failure-path
//! tests. [`ScriptedProvider`] serves a deterministic generated series by
//! default and takes per-call behavior scripts (fail once, rate limit, hang)
//! applied in FIFO order.

use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use vela_core::{
    AssetId, Bar, CommitStats, Granularity, PriceProvider, PriceRecord, PriceStore, StoredExtent,
    SyncError, TimeRange, WriteBatch,
};

type SeriesKey = (AssetId, Granularity);

/// In-memory store with the `(asset, ts, granularity)` uniqueness the
/// engine relies on.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    series: HashMap<SeriesKey, BTreeMap<DateTime<Utc>, Bar>>,
    fail_reads: bool,
    fail_commit_ranges: Vec<TimeRange>,
    commits: u64,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed records directly, bypassing the engine.
    pub async fn seed(&self, records: Vec<PriceRecord>) {
        let mut state = self.state.lock().await;
        for record in records {
            state
                .series
                .entry((record.asset_id, record.granularity))
                .or_default()
                .insert(record.ts(), record.bar);
        }
    }

    /// Make every subsequent read fail with a storage error.
    pub async fn poison_reads(&self) {
        self.state.lock().await.fail_reads = true;
    }

    /// Make any commit touching `range` fail with a storage error.
    pub async fn fail_commits_in(&self, range: TimeRange) {
        self.state.lock().await.fail_commit_ranges.push(range);
    }

    /// Number of batches committed so far.
    pub async fn commit_count(&self) -> u64 {
        self.state.lock().await.commits
    }

    /// Records currently stored for one series, ordered by timestamp.
    pub async fn dump(&self, asset_id: AssetId, granularity: Granularity) -> Vec<PriceRecord> {
        let state = self.state.lock().await;
        state
            .series
            .get(&(asset_id, granularity))
            .map(|series| {
                series
                    .values()
                    .map(|bar| PriceRecord::new(asset_id, granularity, *bar))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of records stored for one series.
    pub async fn count(&self, asset_id: AssetId, granularity: Granularity) -> usize {
        let state = self.state.lock().await;
        state
            .series
            .get(&(asset_id, granularity))
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl PriceStore for MemoryStore {
    async fn extent(
        &self,
        asset_id: AssetId,
        granularity: Granularity,
    ) -> Result<Option<StoredExtent>, SyncError> {
        let state = self.state.lock().await;
        if state.fail_reads {
            return Err(SyncError::storage("memory store reads poisoned"));
        }
        Ok(state.series.get(&(asset_id, granularity)).and_then(|series| {
            let earliest = *series.keys().next()?;
            let latest = *series.keys().next_back()?;
            Some(StoredExtent {
                earliest,
                latest,
                count: series.len() as u64,
            })
        }))
    }

    async fn records_in(
        &self,
        asset_id: AssetId,
        granularity: Granularity,
        range: TimeRange,
    ) -> Result<Vec<PriceRecord>, SyncError> {
        let state = self.state.lock().await;
        if state.fail_reads {
            return Err(SyncError::storage("memory store reads poisoned"));
        }
        Ok(state
            .series
            .get(&(asset_id, granularity))
            .map(|series| {
                series
                    .range(range.start..range.end)
                    .map(|(_, bar)| PriceRecord::new(asset_id, granularity, *bar))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitStats, SyncError> {
        let mut state = self.state.lock().await;
        let blocked = state.fail_commit_ranges.iter().any(|blocked| {
            batch.upserts.iter().any(|record| blocked.contains(record.ts()))
                || batch.deletes.iter().any(|del| blocked.overlaps(&del.range))
        });
        if blocked {
            return Err(SyncError::storage("injected commit failure"));
        }

        let mut stats = CommitStats::default();
        for record in &batch.upserts {
            let replaced = state
                .series
                .entry((record.asset_id, record.granularity))
                .or_default()
                .insert(record.ts(), record.bar);
            if replaced.is_some() {
                stats.updated += 1;
            } else {
                stats.inserted += 1;
            }
        }
        for del in &batch.deletes {
            if let Some(series) = state.series.get_mut(&(del.asset_id, del.granularity)) {
                let doomed: Vec<DateTime<Utc>> = series
                    .range(del.range.start..del.range.end)
                    .map(|(ts, _)| *ts)
                    .collect();
                stats.deleted += doomed.len() as u64;
                for ts in doomed {
                    series.remove(&ts);
                }
            }
        }
        state.commits += 1;
        Ok(stats)
    }
}

/// Behavior for one provider call.
#[derive(Debug, Clone)]
pub enum CallScript {
    /// Serve whatever the generator produces for the requested range.
    Serve,
    /// Fail this call with the given error.
    Fail(SyncError),
    /// Never answer; trips the engine's provider timeout.
    Hang,
}

/// One observed `fetch` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCall {
    /// Requested symbol.
    pub symbol: String,
    /// Requested granularity.
    pub granularity: Granularity,
    /// Requested range.
    pub range: TimeRange,
}

/// Scripted provider double.
///
/// Every call serves a deterministic generated series unless a queued script
/// overrides it; scripts apply call-by-call in FIFO order.
#[derive(Default)]
pub struct ScriptedProvider {
    state: Mutex<ProviderState>,
}

struct ProviderState {
    scripts: VecDeque<CallScript>,
    calls: Vec<ProviderCall>,
    base_price: Decimal,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            scripts: VecDeque::new(),
            calls: Vec::new(),
            base_price: Decimal::new(100, 0),
        }
    }
}

impl ScriptedProvider {
    /// Provider with no scripts queued (every call serves).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a behavior for the next unscripted call.
    pub async fn push_script(&self, script: CallScript) {
        self.state.lock().await.scripts.push_back(script);
    }

    /// Observed calls, in order.
    pub async fn calls(&self) -> Vec<ProviderCall> {
        self.state.lock().await.calls.clone()
    }

    /// Number of fetch calls received.
    pub async fn call_count(&self) -> usize {
        self.state.lock().await.calls.len()
    }
}

#[async_trait]
impl PriceProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(
        &self,
        symbol: &str,
        granularity: Granularity,
        range: TimeRange,
    ) -> Result<Vec<Bar>, SyncError> {
        let (script, base) = {
            let mut state = self.state.lock().await;
            state.calls.push(ProviderCall {
                symbol: symbol.to_string(),
                granularity,
                range,
            });
            (state.scripts.pop_front(), state.base_price)
        };
        match script {
            None | Some(CallScript::Serve) => Ok(generate_series(granularity, range, base)),
            Some(CallScript::Fail(err)) => Err(err),
            Some(CallScript::Hang) => std::future::pending().await,
        }
    }
}

/// Deterministic bar series covering `range` at `granularity`.
///
/// Timestamps are aligned to the granularity's step; prices derive from the
/// timestamp, so re-fetching a range reproduces the records exactly. The
/// idempotence tests rely on that.
#[must_use]
pub fn generate_series(granularity: Granularity, range: TimeRange, base: Decimal) -> Vec<Bar> {
    let step = granularity.step();
    let step_secs = step.num_seconds();
    let mut bars = Vec::new();
    if range.is_empty() || step_secs <= 0 {
        return bars;
    }
    // First step-aligned instant at or after the range start.
    let rem = range.start.timestamp().rem_euclid(step_secs);
    let mut ts = if rem == 0 {
        range.start
    } else {
        range.start + chrono::Duration::seconds(step_secs - rem)
    };
    while ts < range.end {
        bars.push(bar_at(ts, base));
        ts = ts + step;
    }
    bars
}

/// One deterministic bar at `ts`.
#[must_use]
pub fn bar_at(ts: DateTime<Utc>, base: Decimal) -> Bar {
    // Walk the price with the hour-of-epoch so distinct hours differ.
    let shift = ts.timestamp().div_euclid(3_600).rem_euclid(97);
    let open = base + Decimal::from(shift);
    Bar {
        ts,
        open,
        high: open + Decimal::ONE,
        low: open - Decimal::ONE,
        close: open + Decimal::new(5, 1),
        volume: 1_000 + u64::try_from(shift).unwrap_or(0),
    }
}

/// Hourly records for `hours` consecutive hours ending at `end` (exclusive),
/// generated with [`bar_at`] so a provider re-fetch reproduces them.
#[must_use]
pub fn hourly_records(asset_id: AssetId, end: DateTime<Utc>, hours: u32, base: Decimal) -> Vec<PriceRecord> {
    let mut records = Vec::with_capacity(hours as usize);
    for back in (1..=i64::from(hours)).rev() {
        let ts = end - chrono::Duration::hours(back);
        records.push(PriceRecord::new(asset_id, Granularity::Hourly, bar_at(ts, base)));
    }
    records
}
