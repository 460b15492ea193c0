//! Coverage snapshots: what is stored for an asset and what that implies.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AssetId, TimeRange};

/// Stored bounds for one `(asset, granularity)` series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredExtent {
    /// Oldest stored timestamp.
    pub earliest: DateTime<Utc>,
    /// Newest stored timestamp.
    pub latest: DateTime<Utc>,
    /// Number of stored records.
    pub count: u64,
}

/// Missing recent data between the newest stored hourly record and now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    /// Newest stored hourly timestamp.
    pub since: DateTime<Utc>,
    /// Whole hours between `since` and the observation instant.
    pub hours: u32,
}

/// Stored hourly data that has aged out of the provider's fine-grained
/// window and can no longer be re-fetched at hourly resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapZone {
    /// Day-aligned zone `[oldest hourly day, window start day)`.
    pub range: TimeRange,
    /// Zone length in whole days.
    pub days: u32,
}

/// Summary of what is currently stored for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSnapshot {
    /// Asset under analysis.
    pub asset_id: AssetId,
    /// Hourly series bounds, when any hourly records are stored.
    pub hourly: Option<StoredExtent>,
    /// Daily series bounds, when any daily records are stored.
    pub daily: Option<StoredExtent>,
    /// Detected recent-zone gap.
    pub gap: Option<Gap>,
    /// Detected overlap zone.
    pub overlap: Option<OverlapZone>,
}

impl CoverageSnapshot {
    /// True when nothing at all is stored for the asset.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.hourly.is_none() && self.daily.is_none()
    }

    /// Age in days of the oldest hourly record beyond the provider window,
    /// 0 when no overlap zone exists.
    #[must_use]
    pub fn overlap_days(&self) -> u32 {
        self.overlap.map_or(0, |zone| zone.days)
    }
}

/// How the engine should treat an asset, derived from its coverage.
///
/// Selected by an ordered decision table in the analyzer; first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStrategy {
    /// Nothing stored; fetch the whole requested window.
    FullFetch,
    /// An overlap zone and a recent gap at once; re-fetch, then consolidate.
    SmartOverlapResolution,
    /// A recent gap only; fetch the uncovered tail.
    IncrementalUpdate,
    /// An overlap zone only; fold aged hourly data into daily records.
    OverlapConsolidation,
    /// Coverage is current; refresh the trailing preserve window.
    MaintenanceUpdate,
}

impl SyncStrategy {
    /// Stable snake_case label used in logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullFetch => "full_fetch",
            Self::SmartOverlapResolution => "smart_overlap_resolution",
            Self::IncrementalUpdate => "incremental_update",
            Self::OverlapConsolidation => "overlap_consolidation",
            Self::MaintenanceUpdate => "maintenance_update",
        }
    }
}

impl fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
