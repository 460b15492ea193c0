//! Price-history provider contract.

use async_trait::async_trait;

use crate::error::SyncError;
use crate::types::{Bar, Granularity, TimeRange};

/// External time-series source with a bounded fine-grained retention window.
///
/// Implementations serve hourly data only within a trailing window and daily
/// data beyond it; the planner guarantees requests respect that boundary.
/// Failures follow the retry taxonomy on [`SyncError`]: transient and
/// rate-limit errors are retried by the executor, permanent errors abandon
/// the task.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Stable provider name used in logs and error payloads.
    fn name(&self) -> &'static str;

    /// Fetch OHLCV bars for `symbol` at `granularity` across `range`.
    ///
    /// # Errors
    /// `ProviderTransient`, `RateLimited`, or `ProviderPermanent` per the
    /// failure taxonomy.
    async fn fetch(
        &self,
        symbol: &str,
        granularity: Granularity,
        range: TimeRange,
    ) -> Result<Vec<Bar>, SyncError>;
}
