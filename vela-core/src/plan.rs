//! Sync plans: ordered fetch/consolidation work for one asset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coverage::SyncStrategy;
use crate::error::SyncError;
use crate::types::{AssetId, Granularity, TimeRange};

/// How fetched (or folded) records are applied to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Insert; an existing divergent record is overwritten with the provider
    /// value and the overwrite is audited (provider is the source of truth).
    NewData,
    /// Overwrite unconditionally; used for the re-fetched trailing window to
    /// absorb provider revisions.
    MergeWithExisting,
    /// Fold stored hourly records into daily records; no provider call.
    Consolidate,
}

/// One unit of planned work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTask {
    /// Granularity requested from the provider (source granularity for
    /// consolidation).
    pub granularity: Granularity,
    /// Range to fetch or consolidate, `[start, end)`.
    pub range: TimeRange,
    /// Granularity of the records written to storage.
    pub target: Granularity,
    /// Apply policy.
    pub mode: MergeMode,
}

impl FetchTask {
    /// Fetch task writing at the requested granularity.
    #[must_use]
    pub const fn fetch(granularity: Granularity, range: TimeRange, mode: MergeMode) -> Self {
        Self {
            granularity,
            range,
            target: granularity,
            mode,
        }
    }

    /// Consolidation task folding hourly records into daily ones.
    #[must_use]
    pub const fn consolidate(range: TimeRange) -> Self {
        Self {
            granularity: Granularity::Hourly,
            range,
            target: Granularity::Daily,
            mode: MergeMode::Consolidate,
        }
    }

    /// True for consolidation work (no provider call involved).
    #[must_use]
    pub fn is_consolidation(&self) -> bool {
        matches!(self.mode, MergeMode::Consolidate)
    }
}

/// Ordered work for one asset's sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    /// Asset the plan belongs to.
    pub asset_id: AssetId,
    /// Strategy the plan was derived for.
    pub strategy: SyncStrategy,
    /// Tasks in execution order.
    pub tasks: Vec<FetchTask>,
}

impl SyncPlan {
    /// Check the plan invariants.
    ///
    /// - fetch tasks precede consolidation tasks (consolidation must observe
    ///   post-merge state);
    /// - no two fetch tasks cover overlapping ranges at the same target
    ///   granularity under conflicting apply policies;
    /// - no hourly fetch range starts before `fine_window_start`.
    ///
    /// # Errors
    /// Returns `SyncError::PlanInvariant` describing the first violation.
    pub fn validate(&self, fine_window_start: DateTime<Utc>) -> Result<(), SyncError> {
        let mut seen_consolidation = false;
        for task in &self.tasks {
            if task.is_consolidation() {
                seen_consolidation = true;
                continue;
            }
            if seen_consolidation {
                return Err(SyncError::PlanInvariant(
                    "fetch task ordered after a consolidation task".into(),
                ));
            }
            if task.granularity == Granularity::Hourly && task.range.start < fine_window_start {
                return Err(SyncError::PlanInvariant(format!(
                    "hourly fetch {} starts before the provider window at {fine_window_start}",
                    task.range
                )));
            }
        }
        for (i, a) in self.tasks.iter().enumerate() {
            if a.is_consolidation() {
                continue;
            }
            for b in self.tasks.iter().skip(i + 1) {
                if b.is_consolidation() {
                    continue;
                }
                if a.target == b.target && a.mode != b.mode && a.range.overlaps(&b.range) {
                    return Err(SyncError::PlanInvariant(format!(
                        "conflicting strategies over overlapping ranges {} and {}",
                        a.range, b.range
                    )));
                }
            }
        }
        Ok(())
    }

    /// Tasks that require a provider fetch, in order.
    pub fn fetch_tasks(&self) -> impl Iterator<Item = &FetchTask> {
        self.tasks.iter().filter(|task| !task.is_consolidation())
    }

    /// Consolidation tasks, in order (always after every fetch task).
    pub fn consolidation_tasks(&self) -> impl Iterator<Item = &FetchTask> {
        self.tasks.iter().filter(|task| task.is_consolidation())
    }
}
