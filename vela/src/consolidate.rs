//! Consolidation: fold aged hourly records into daily records, one atomic
//! day at a time.

use chrono::NaiveDate;

use vela_core::timeseries::aggregate::{day_bounds, days_in, fold_daily};
use vela_core::{
    AssetId, DeleteRange, Granularity, PriceRecord, PriceStore, SyncError, TimeRange, WriteBatch,
};

/// Per-day result of a consolidation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidationOutcome {
    /// Days folded and committed.
    pub days_succeeded: Vec<NaiveDate>,
    /// The failing day plus every unattempted day after it; callers retry
    /// exactly this subset.
    pub days_failed: Vec<NaiveDate>,
    /// Hourly records consumed across the committed days.
    pub records_consolidated: u64,
    /// The error that stopped the pass, if any.
    pub first_error: Option<SyncError>,
}

impl ConsolidationOutcome {
    /// True when every non-empty day in the range was folded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.days_failed.is_empty()
    }

    /// Summary error for the run report, `None` when complete.
    #[must_use]
    pub fn as_error(&self) -> Option<SyncError> {
        (!self.is_complete()).then(|| SyncError::ConsolidationIncomplete {
            days_failed: self.days_failed.clone(),
        })
    }
}

/// Folds hourly records into daily records and deletes the consumed rows.
pub struct ConsolidationEngine<'a> {
    store: &'a dyn PriceStore,
}

impl<'a> ConsolidationEngine<'a> {
    /// Consolidation engine bound to a store.
    #[must_use]
    pub const fn new(store: &'a dyn PriceStore) -> Self {
        Self { store }
    }

    /// Consolidate every day of `range` for `asset_id`.
    ///
    /// Each day commits its daily upsert and its hourly delete as one batch,
    /// so a day either folds completely or stays untouched and retry-safe.
    /// The first failing day stops the loop: committed days stay committed,
    /// later days are not attempted.
    pub async fn consolidate(&self, asset_id: AssetId, range: TimeRange) -> ConsolidationOutcome {
        let mut outcome = ConsolidationOutcome::default();
        let days = days_in(&range);
        for (idx, day) in days.iter().enumerate() {
            match self.consolidate_day(asset_id, *day).await {
                Ok(0) => {} // nothing stored for the day
                Ok(consumed) => {
                    outcome.records_consolidated += consumed;
                    outcome.days_succeeded.push(*day);
                }
                Err(err) => {
                    tracing::warn!(
                        asset = %asset_id,
                        day = %day,
                        error = %err,
                        "consolidation stopped; later days left untouched"
                    );
                    outcome.days_failed.extend(days[idx..].iter().copied());
                    outcome.first_error = Some(err);
                    break;
                }
            }
        }
        tracing::debug!(
            asset = %asset_id,
            range = %range,
            folded_days = outcome.days_succeeded.len(),
            consumed = outcome.records_consolidated,
            "consolidation pass finished"
        );
        outcome
    }

    /// Fold one day. Returns the number of hourly records consumed, 0 when
    /// the day holds none.
    async fn consolidate_day(&self, asset_id: AssetId, day: NaiveDate) -> Result<u64, SyncError> {
        let bounds = day_bounds(day);
        let hourly = self
            .store
            .records_in(asset_id, Granularity::Hourly, bounds)
            .await?;
        let consumed = u64::try_from(hourly.len()).unwrap_or(u64::MAX);
        let Some(folded) = fold_daily(day, hourly.into_iter().map(|record| record.bar).collect())
        else {
            return Ok(0);
        };
        let batch = WriteBatch {
            upserts: vec![PriceRecord::new(asset_id, Granularity::Daily, folded)],
            deletes: vec![DeleteRange {
                asset_id,
                granularity: Granularity::Hourly,
                range: bounds,
            }],
        };
        self.store.commit(batch).await?;
        Ok(consumed)
    }
}
