//! Merge: apply fetched bars to storage under a task's merge policy.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use vela_core::{
    AssetId, Bar, FetchTask, MergeMode, PriceRecord, PriceStore, SyncError, WriteBatch,
};

/// What one task's merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Newly inserted records.
    pub inserted: u64,
    /// Existing records overwritten with divergent provider values.
    pub overwritten: u64,
    /// Fetched records identical to storage, skipped.
    pub unchanged: u64,
}

impl MergeOutcome {
    /// Records the merge actually wrote.
    #[must_use]
    pub const fn written(&self) -> u64 {
        self.inserted + self.overwritten
    }
}

/// Upserts fetched records into storage, one transaction per task.
pub struct MergeEngine<'a> {
    store: &'a dyn PriceStore,
}

impl<'a> MergeEngine<'a> {
    /// Merge engine bound to a store.
    #[must_use]
    pub const fn new(store: &'a dyn PriceStore) -> Self {
        Self { store }
    }

    /// Upsert `bars` for one task in a single transaction.
    ///
    /// Records identical to storage are skipped, which is what makes an
    /// immediate re-run merge zero records. Divergent records are
    /// overwritten; under `NewData` the provider is the source of truth and
    /// the correction is logged per record for audit, under
    /// `MergeWithExisting` the overwrite is an expected revision.
    ///
    /// # Errors
    /// `SyncError::Storage` when the stored range cannot be read or the
    /// batch fails to commit; none of the task's writes are then visible.
    /// `SyncError::InvalidArg` when handed a consolidation task.
    pub async fn merge(
        &self,
        asset_id: AssetId,
        task: &FetchTask,
        bars: Vec<Bar>,
    ) -> Result<MergeOutcome, SyncError> {
        if task.is_consolidation() {
            return Err(SyncError::InvalidArg(
                "consolidation tasks carry no fetched records".into(),
            ));
        }
        let existing: BTreeMap<DateTime<Utc>, PriceRecord> = self
            .store
            .records_in(asset_id, task.target, task.range)
            .await?
            .into_iter()
            .map(|record| (record.ts(), record))
            .collect();

        let mut outcome = MergeOutcome::default();
        let mut upserts = Vec::new();
        for bar in bars {
            match existing.get(&bar.ts) {
                Some(stored) if stored.bar == bar => outcome.unchanged += 1,
                Some(stored) => {
                    if matches!(task.mode, MergeMode::NewData) {
                        tracing::warn!(
                            asset = %asset_id,
                            ts = %bar.ts,
                            stored_close = %stored.bar.close,
                            provider_close = %bar.close,
                            "provider correction overwrites stored record"
                        );
                    } else {
                        tracing::debug!(
                            asset = %asset_id,
                            ts = %bar.ts,
                            "revision absorbed from re-fetched window"
                        );
                    }
                    outcome.overwritten += 1;
                    upserts.push(PriceRecord::new(asset_id, task.target, bar));
                }
                None => {
                    outcome.inserted += 1;
                    upserts.push(PriceRecord::new(asset_id, task.target, bar));
                }
            }
        }

        if !upserts.is_empty() {
            self.store.commit(WriteBatch::upserts(upserts)).await?;
        }
        tracing::debug!(
            asset = %asset_id,
            inserted = outcome.inserted,
            overwritten = outcome.overwritten,
            unchanged = outcome.unchanged,
            "merge committed"
        );
        Ok(outcome)
    }
}
