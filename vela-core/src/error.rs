//! Unified error taxonomy for the vela workspace.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the vela workspace.
///
/// Distinguishes storage failures, the provider failure classes the retry
/// policy keys on, consolidation partial failures, and plan defects.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyncError {
    /// A storage read or commit failed. Fatal to the current run when raised
    /// during the analysis phase; recorded per task otherwise.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Transient provider failure (timeout, 5xx-class); eligible for retry.
    #[error("{provider} transient failure: {msg}")]
    ProviderTransient {
        /// Provider name that failed.
        provider: String,
        /// Human-readable failure detail.
        msg: String,
    },

    /// The provider rejected the call due to rate limiting; retried after a
    /// cooldown taken from `retry_after_ms` or the configured default.
    #[error("{provider} rate limited (retry_after_ms={retry_after_ms:?})")]
    RateLimited {
        /// Provider name that rejected the call.
        provider: String,
        /// Cooldown the provider advertised, if any.
        retry_after_ms: Option<u64>,
    },

    /// Non-retryable client error; the task is abandoned and recorded, the
    /// run continues with the remaining tasks.
    #[error("{provider} permanent failure: {msg}")]
    ProviderPermanent {
        /// Provider name that failed.
        provider: String,
        /// Human-readable failure detail.
        msg: String,
    },

    /// The retry schedule spent its attempt budget on one task.
    #[error("retries exhausted after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        /// Attempts consumed, including the first.
        attempts: u32,
        /// The failure observed on the final attempt.
        last: Box<SyncError>,
    },

    /// Some consolidation days failed or were left unattempted.
    #[error("consolidation incomplete: {} day(s) unresolved", .days_failed.len())]
    ConsolidationIncomplete {
        /// The failing day and every unattempted day after it.
        days_failed: Vec<NaiveDate>,
    },

    /// A produced plan violated an ordering, overlap, or window invariant.
    /// A defect: fails the run loudly instead of being silently resolved.
    #[error("planning invariant violated: {0}")]
    PlanInvariant(String),

    /// Invalid input argument or configuration.
    #[error("invalid argument: {0}")]
    InvalidArg(String),
}

impl SyncError {
    /// Helper: build a `Storage` error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Helper: build a `ProviderTransient` error.
    pub fn transient(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ProviderTransient {
            provider: provider.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `ProviderPermanent` error.
    pub fn permanent(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ProviderPermanent {
            provider: provider.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `RateLimited` error.
    pub fn rate_limited(provider: impl Into<String>, retry_after_ms: Option<u64>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            retry_after_ms,
        }
    }

    /// True for failures the executor may retry (transient and rate-limit).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderTransient { .. } | Self::RateLimited { .. }
        )
    }

    /// True for failures that abort the whole run rather than a single task.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::PlanInvariant(_))
    }
}
