//! Planning: turn a coverage assessment into an ordered task sequence.

use chrono::{DateTime, Duration, Utc};

use vela_core::{
    FetchTask, Granularity, MergeMode, StoredExtent, SyncConfig, SyncError, SyncPlan, TimeRange,
    UpdateMode,
};

use crate::coverage::CoverageAssessment;

/// Turns a coverage assessment and a request into a validated [`SyncPlan`].
pub struct SyncPlanner<'a> {
    cfg: &'a SyncConfig,
}

impl<'a> SyncPlanner<'a> {
    /// Planner bound to a configuration.
    #[must_use]
    pub const fn new(cfg: &'a SyncConfig) -> Self {
        Self { cfg }
    }

    /// Produce the plan for one asset.
    ///
    /// Ranges are derived so that any calendar day reachable at both
    /// granularities resolves to hourly inside the provider window and daily
    /// outside it: daily ranges end at `now − W`, hourly ranges never start
    /// before it.
    ///
    /// # Errors
    /// `SyncError::InvalidArg` for a zero `days_back`;
    /// `SyncError::PlanInvariant` when the produced plan violates the
    /// ordering, overlap, or provider-window invariants.
    pub fn plan(
        &self,
        assessment: &CoverageAssessment,
        days_back: u32,
        mode: UpdateMode,
        now: DateTime<Utc>,
    ) -> Result<SyncPlan, SyncError> {
        if days_back == 0 {
            return Err(SyncError::InvalidArg("days_back must be positive".into()));
        }
        let snapshot = &assessment.snapshot;
        let window_days = self.cfg.provider_fine_window_days;
        let window_start = self.cfg.fine_window_start(now);
        let recent = TimeRange::last_days(now, days_back.min(window_days));
        let historical = (days_back > window_days).then(|| TimeRange {
            start: now - Duration::days(i64::from(days_back)),
            end: window_start,
        });

        let mut tasks = Vec::new();
        match mode {
            UpdateMode::Force => {
                tasks.push(FetchTask::fetch(
                    Granularity::Hourly,
                    recent,
                    MergeMode::NewData,
                ));
                if let Some(range) = historical {
                    tasks.push(FetchTask::fetch(
                        Granularity::Daily,
                        range,
                        MergeMode::NewData,
                    ));
                }
            }
            UpdateMode::Incremental => {
                if let Some(range) = self.hourly_tail(recent, snapshot.hourly.as_ref(), now) {
                    tasks.push(FetchTask::fetch(
                        Granularity::Hourly,
                        range,
                        MergeMode::NewData,
                    ));
                }
                if let Some(requested) = historical
                    && let Some(range) = Self::daily_tail(requested, snapshot.daily.as_ref())
                {
                    tasks.push(FetchTask::fetch(
                        Granularity::Daily,
                        range,
                        MergeMode::NewData,
                    ));
                }
            }
            UpdateMode::Smart => {
                // The trailing window is always re-fetched to absorb
                // provider-side corrections near the boundary; a recent-zone
                // gap wider than the preserve window widens the re-fetch.
                let (start, merge_mode) = match snapshot.hourly.as_ref() {
                    None => (recent.start, MergeMode::NewData),
                    Some(ext) => {
                        let preserve_start =
                            now - Duration::hours(i64::from(self.cfg.preserve_recent_hours));
                        (
                            preserve_start.min(ext.latest).max(recent.start),
                            MergeMode::MergeWithExisting,
                        )
                    }
                };
                tasks.push(FetchTask::fetch(
                    Granularity::Hourly,
                    TimeRange { start, end: now },
                    merge_mode,
                ));
                if let Some(range) = historical {
                    tasks.push(FetchTask::fetch(
                        Granularity::Daily,
                        range,
                        MergeMode::NewData,
                    ));
                }
                if let Some(zone) = snapshot.overlap {
                    tasks.push(FetchTask::consolidate(zone.range));
                }
            }
        }

        let plan = SyncPlan {
            asset_id: snapshot.asset_id,
            strategy: assessment.strategy,
            tasks,
        };
        plan.validate(window_start)?;
        tracing::debug!(
            asset = %snapshot.asset_id,
            mode = ?mode,
            tasks = plan.tasks.len(),
            "plan produced"
        );
        Ok(plan)
    }

    /// Uncovered hourly tail of the recent window, `None` when coverage is
    /// current within the gap threshold.
    fn hourly_tail(
        &self,
        recent: TimeRange,
        hourly: Option<&StoredExtent>,
        now: DateTime<Utc>,
    ) -> Option<TimeRange> {
        match hourly {
            None => Some(recent),
            Some(ext) => {
                let start = ext.latest.max(recent.start);
                (now - start > self.cfg.gap_threshold_delta())
                    .then_some(TimeRange { start, end: now })
            }
        }
    }

    /// Uncovered daily tail of the historical range. Coverage is summarized
    /// by the stored extent, so only the tail beyond the newest daily record
    /// is considered.
    fn daily_tail(requested: TimeRange, daily: Option<&StoredExtent>) -> Option<TimeRange> {
        match daily {
            None => Some(requested),
            Some(ext) => {
                let covered_through = ext.latest + Duration::days(1);
                (covered_through < requested.end).then(|| TimeRange {
                    start: covered_through.max(requested.start),
                    end: requested.end,
                })
            }
        }
    }
}
