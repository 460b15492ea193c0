//! Storage collaborator contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::coverage::StoredExtent;
use crate::error::SyncError;
use crate::types::{AssetId, Granularity, PriceRecord, TimeRange};

/// Deletion of every record for one `(asset, granularity)` inside a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRange {
    /// Asset whose records are removed.
    pub asset_id: AssetId,
    /// Granularity of the removed records.
    pub granularity: Granularity,
    /// Half-open range of removed timestamps.
    pub range: TimeRange,
}

/// Atomic unit of storage mutation.
///
/// Everything in one batch commits in a single transaction: a failure leaves
/// none of it visible. The merge phase commits one batch per task; the
/// consolidation phase commits one batch per day (the daily upsert and the
/// hourly delete together).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteBatch {
    /// Records inserted or overwritten, keyed by `(asset, ts, granularity)`.
    pub upserts: Vec<PriceRecord>,
    /// Range deletions applied in the same transaction.
    pub deletes: Vec<DeleteRange>,
}

impl WriteBatch {
    /// Batch containing only upserts.
    #[must_use]
    pub fn upserts(records: Vec<PriceRecord>) -> Self {
        Self {
            upserts: records,
            deletes: Vec::new(),
        }
    }

    /// True when committing the batch would not touch storage.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }
}

/// Result of committing one [`WriteBatch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    /// Upserts that created a new record.
    pub inserted: u64,
    /// Upserts that replaced an existing record.
    pub updated: u64,
    /// Records removed by range deletions.
    pub deleted: u64,
}

/// Storage collaborator contract.
///
/// The store owns the `(asset_id, ts, granularity)` uniqueness constraint
/// and its own write serialization; the engine takes no lock of its own.
/// Upserts are idempotent given identical provider data, which is what makes
/// an unexpected concurrent run for the same asset harmless.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Stored bounds for one series, or `None` when nothing is stored.
    ///
    /// # Errors
    /// Returns `SyncError::Storage` when the series cannot be read.
    async fn extent(
        &self,
        asset_id: AssetId,
        granularity: Granularity,
    ) -> Result<Option<StoredExtent>, SyncError>;

    /// All records with `ts` inside `range`, ordered by timestamp.
    ///
    /// # Errors
    /// Returns `SyncError::Storage` when the series cannot be read.
    async fn records_in(
        &self,
        asset_id: AssetId,
        granularity: Granularity,
        range: TimeRange,
    ) -> Result<Vec<PriceRecord>, SyncError>;

    /// Apply a batch atomically: every upsert and delete, or nothing.
    ///
    /// # Errors
    /// Returns `SyncError::Storage` when the transaction fails; none of the
    /// batch is then visible.
    async fn commit(&self, batch: WriteBatch) -> Result<CommitStats, SyncError>;
}
