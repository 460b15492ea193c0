//! Coverage analysis: classify stored data and recommend a strategy.

use chrono::{DateTime, Utc};

use vela_core::timeseries::aggregate::day_floor;
use vela_core::{
    AssetId, CoverageSnapshot, Gap, Granularity, OverlapZone, PriceStore, StoredExtent,
    SyncConfig, SyncError, SyncStrategy, TimeRange,
};

/// Output of the analysis phase: what is stored and what to do about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageAssessment {
    /// Stored-data summary.
    pub snapshot: CoverageSnapshot,
    /// Strategy recommended by the decision table.
    pub strategy: SyncStrategy,
}

/// Reads stored extents for an asset and classifies its coverage.
pub struct CoverageAnalyzer<'a> {
    cfg: &'a SyncConfig,
}

impl<'a> CoverageAnalyzer<'a> {
    /// Analyzer bound to a configuration.
    #[must_use]
    pub const fn new(cfg: &'a SyncConfig) -> Self {
        Self { cfg }
    }

    /// Read both series' extents and classify the asset as of `now`.
    ///
    /// # Errors
    /// Propagates `SyncError::Storage` from the extent reads. The caller
    /// aborts this asset's run: no plan can be trusted without a valid
    /// snapshot.
    pub async fn assess(
        &self,
        store: &dyn PriceStore,
        asset_id: AssetId,
        now: DateTime<Utc>,
    ) -> Result<CoverageAssessment, SyncError> {
        let hourly = store.extent(asset_id, Granularity::Hourly).await?;
        let daily = store.extent(asset_id, Granularity::Daily).await?;

        let gap = hourly.as_ref().and_then(|ext| self.detect_gap(ext, now));
        let overlap = hourly.as_ref().and_then(|ext| self.detect_overlap(ext, now));
        let snapshot = CoverageSnapshot {
            asset_id,
            hourly,
            daily,
            gap,
            overlap,
        };
        let strategy = Self::classify(&snapshot);
        tracing::debug!(
            asset = %asset_id,
            strategy = %strategy,
            gap_hours = gap.map(|g| g.hours),
            overlap_days = snapshot.overlap_days(),
            "coverage assessed"
        );
        Ok(CoverageAssessment { snapshot, strategy })
    }

    /// A gap exists when the newest hourly record trails `now` by more than
    /// the configured threshold (one sampling interval by default).
    fn detect_gap(&self, hourly: &StoredExtent, now: DateTime<Utc>) -> Option<Gap> {
        let behind = now - hourly.latest;
        (behind > self.cfg.gap_threshold_delta()).then(|| Gap {
            since: hourly.latest,
            hours: u32::try_from(behind.num_hours()).unwrap_or(u32::MAX),
        })
    }

    /// The overlap zone covers whole days of hourly data strictly older than
    /// the provider window; a partially aged day stays out until it has
    /// aged completely.
    fn detect_overlap(&self, hourly: &StoredExtent, now: DateTime<Utc>) -> Option<OverlapZone> {
        let window_start = self.cfg.fine_window_start(now);
        if hourly.earliest >= window_start {
            return None;
        }
        let start = day_floor(hourly.earliest);
        let end = day_floor(window_start);
        if start >= end {
            return None;
        }
        let days = u32::try_from((end - start).num_days()).unwrap_or(0);
        Some(OverlapZone {
            range: TimeRange { start, end },
            days,
        })
    }

    /// The ordered decision table; first match wins.
    fn classify(snapshot: &CoverageSnapshot) -> SyncStrategy {
        match (
            snapshot.is_empty(),
            snapshot.hourly.is_some(),
            snapshot.overlap.is_some(),
            snapshot.gap.is_some(),
        ) {
            (true, ..) => SyncStrategy::FullFetch,
            (false, true, true, true) => SyncStrategy::SmartOverlapResolution,
            (false, true, false, true) => SyncStrategy::IncrementalUpdate,
            (false, _, true, false) => SyncStrategy::OverlapConsolidation,
            _ => SyncStrategy::MaintenanceUpdate,
        }
    }
}
