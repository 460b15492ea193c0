//! Configuration shared between the engine and its callers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Which planner branch a sync run uses. A closed set: the planner matches
/// on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Trust the coverage analysis: re-fetch the trailing preserve window,
    /// backfill daily history beyond the provider window, consolidate aged
    /// hourly data.
    #[default]
    Smart,
    /// Fetch only uncovered tails; skip fully covered ranges.
    Incremental,
    /// Re-fetch the whole requested window regardless of coverage.
    Force,
}

/// Exponential backoff configuration for provider retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// First retry delay in milliseconds.
    pub base_ms: u64,
    /// Upper bound for any single delay in milliseconds.
    pub max_ms: u64,
    /// Exponential factor applied after each failed attempt (>= 1).
    pub factor: u32,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: 500,
            max_ms: 30_000,
            factor: 2,
            jitter_percent: 20,
        }
    }
}

/// Tuning for a sync engine instance.
///
/// The gap-detection threshold and the consolidation trigger are deliberate
/// configuration inputs, never constants baked into the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Days of trailing history the provider serves at hourly resolution.
    pub provider_fine_window_days: u32,
    /// Trailing hours always re-fetched in smart mode to absorb provider
    /// revisions near the boundary.
    pub preserve_recent_hours: u32,
    /// Planner branch used when the scheduler does not pick one explicitly.
    pub update_mode: UpdateMode,
    /// Largest tolerated distance between the newest hourly record and now
    /// before it counts as a gap. One sampling interval by default.
    pub gap_threshold: Duration,
    /// Attempt budget per task, including the first attempt.
    pub max_retry_attempts: u32,
    /// Retry backoff tuning.
    pub backoff: BackoffConfig,
    /// Cooldown applied to a rate-limit response that carries no retry-after
    /// hint, in milliseconds.
    pub default_cooldown_ms: u64,
    /// Per-call bound on provider fetches; elapsing counts as transient.
    pub provider_timeout: Duration,
    /// Worker-pool bound for concurrent per-asset runs.
    pub max_concurrent_assets: usize,
    /// Global provider call budget shared across the pool.
    pub requests_per_minute: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            provider_fine_window_days: 30,
            preserve_recent_hours: 24,
            update_mode: UpdateMode::default(),
            gap_threshold: Duration::from_secs(3_600),
            max_retry_attempts: 3,
            backoff: BackoffConfig::default(),
            default_cooldown_ms: 60_000,
            provider_timeout: Duration::from_secs(10),
            max_concurrent_assets: 4,
            requests_per_minute: 60,
        }
    }
}

impl SyncConfig {
    /// Check the configuration for values the engine cannot operate with.
    ///
    /// # Errors
    /// Returns `SyncError::InvalidArg` naming the offending field.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.provider_fine_window_days == 0 {
            return Err(SyncError::InvalidArg(
                "provider_fine_window_days must be positive".into(),
            ));
        }
        if self.preserve_recent_hours == 0 {
            return Err(SyncError::InvalidArg(
                "preserve_recent_hours must be positive".into(),
            ));
        }
        if self.max_retry_attempts == 0 {
            return Err(SyncError::InvalidArg(
                "max_retry_attempts must be positive".into(),
            ));
        }
        if self.backoff.factor == 0 {
            return Err(SyncError::InvalidArg("backoff.factor must be >= 1".into()));
        }
        if self.backoff.jitter_percent > 100 {
            return Err(SyncError::InvalidArg(
                "backoff.jitter_percent must be within [0, 100]".into(),
            ));
        }
        if self.max_concurrent_assets == 0 {
            return Err(SyncError::InvalidArg(
                "max_concurrent_assets must be positive".into(),
            ));
        }
        if self.requests_per_minute == 0 {
            return Err(SyncError::InvalidArg(
                "requests_per_minute must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Start of the provider's fine-grained window as of `now`.
    #[must_use]
    pub fn fine_window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - chrono::Duration::days(i64::from(self.provider_fine_window_days))
    }

    /// The gap threshold as a chrono delta for timestamp arithmetic.
    #[must_use]
    pub fn gap_threshold_delta(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.gap_threshold).unwrap_or(chrono::Duration::MAX)
    }
}
