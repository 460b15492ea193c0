//! Report envelope returned to the scheduler after each run.

use serde::{Deserialize, Serialize};

use crate::coverage::SyncStrategy;
use crate::error::SyncError;
use crate::types::AssetId;

/// Outcome of one asset's sync run.
///
/// Per-task and per-day failures accumulate in `errors`; only a storage
/// failure during analysis (or a plan defect) aborts a run without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Asset the run covered.
    pub asset_id: AssetId,
    /// Strategy selected by the coverage analyzer.
    pub strategy_used: SyncStrategy,
    /// Provider calls attempted, including retries.
    pub api_calls_made: u32,
    /// Records inserted or overwritten by the merge phase.
    pub records_merged: u64,
    /// Hourly records folded away by the consolidation phase.
    pub records_consolidated: u64,
    /// Non-fatal issues encountered during the run.
    pub errors: Vec<SyncError>,
}

impl SyncReport {
    /// Empty report for a run that has produced no work yet.
    #[must_use]
    pub const fn new(asset_id: AssetId, strategy_used: SyncStrategy) -> Self {
        Self {
            asset_id,
            strategy_used,
            api_calls_made: 0,
            records_merged: 0,
            records_consolidated: 0,
            errors: Vec::new(),
        }
    }

    /// True when the run completed without recording any error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
