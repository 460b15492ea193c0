//! The sync engine: analyze → plan → fetch → merge → consolidate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::StreamExt;

use vela_core::{
    Asset, AssetId, PriceProvider, PriceStore, SyncConfig, SyncError, SyncReport, UpdateMode,
};

use crate::consolidate::ConsolidationEngine;
use crate::coverage::CoverageAnalyzer;
use crate::executor::{FetchExecutor, RequestBudget};
use crate::merge::MergeEngine;
use crate::planner::SyncPlanner;

/// The synchronization engine.
///
/// Holds no persistent mutable state between invocations: each run is a
/// function from (storage state, request parameters) to (storage mutations,
/// report). "What's due next" lives entirely with the scheduler
/// collaborator.
pub struct SyncEngine {
    store: Arc<dyn PriceStore>,
    provider: Arc<dyn PriceProvider>,
    cfg: SyncConfig,
    budget: RequestBudget,
}

/// Builder for [`SyncEngine`].
#[derive(Default)]
pub struct SyncEngineBuilder {
    store: Option<Arc<dyn PriceStore>>,
    provider: Option<Arc<dyn PriceProvider>>,
    cfg: SyncConfig,
}

impl SyncEngineBuilder {
    /// Set the storage collaborator.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn PriceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the provider collaborator.
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn PriceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replace the default configuration.
    #[must_use]
    pub fn config(mut self, cfg: SyncConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Validate the configuration and assemble the engine.
    ///
    /// # Errors
    /// `SyncError::InvalidArg` when a collaborator is missing or the
    /// configuration fails validation.
    pub fn build(self) -> Result<SyncEngine, SyncError> {
        let store = self
            .store
            .ok_or_else(|| SyncError::InvalidArg("a PriceStore is required".into()))?;
        let provider = self
            .provider
            .ok_or_else(|| SyncError::InvalidArg("a PriceProvider is required".into()))?;
        self.cfg.validate()?;
        let budget = RequestBudget::per_minute(self.cfg.requests_per_minute);
        Ok(SyncEngine {
            store,
            provider,
            cfg: self.cfg,
            budget,
        })
    }
}

impl SyncEngine {
    /// Start building an engine.
    #[must_use]
    pub fn builder() -> SyncEngineBuilder {
        SyncEngineBuilder::default()
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.cfg
    }

    /// Run one sync for `asset` as of the current instant.
    ///
    /// # Errors
    /// See [`SyncEngine::run_sync_at`].
    pub async fn run_sync(
        &self,
        asset: &Asset,
        days_back: u32,
        mode: UpdateMode,
    ) -> Result<SyncReport, SyncError> {
        self.run_sync_at(asset, days_back, mode, Utc::now()).await
    }

    /// Run one sync with the configured default update mode.
    ///
    /// # Errors
    /// See [`SyncEngine::run_sync_at`].
    pub async fn run_sync_default(
        &self,
        asset: &Asset,
        days_back: u32,
    ) -> Result<SyncReport, SyncError> {
        self.run_sync(asset, days_back, self.cfg.update_mode).await
    }

    /// Deterministic variant of [`SyncEngine::run_sync`]: the observation
    /// instant is supplied by the caller.
    ///
    /// Per-task and per-day failures accumulate in the returned report.
    ///
    /// # Errors
    /// `SyncError::Storage` when the analysis phase cannot read coverage (no
    /// plan can be trusted without a snapshot), `SyncError::PlanInvariant`
    /// for a defective plan, `SyncError::InvalidArg` for a zero `days_back`.
    pub async fn run_sync_at(
        &self,
        asset: &Asset,
        days_back: u32,
        mode: UpdateMode,
        now: DateTime<Utc>,
    ) -> Result<SyncReport, SyncError> {
        tracing::info!(
            asset = %asset.id,
            symbol = %asset.symbol,
            days_back,
            mode = ?mode,
            "sync run starting"
        );

        // Analysis: the only phase whose storage failure aborts the run.
        let assessment = CoverageAnalyzer::new(&self.cfg)
            .assess(self.store.as_ref(), asset.id, now)
            .await?;
        let plan = SyncPlanner::new(&self.cfg).plan(&assessment, days_back, mode, now)?;

        let mut report = SyncReport::new(asset.id, assessment.strategy);

        // Fetch: strictly in planner order within this asset.
        let executor = FetchExecutor::new(self.provider.as_ref(), &self.budget, &self.cfg);
        let outcomes = executor.execute(&asset.symbol, &plan.tasks).await;

        // Merge: one transaction per task; failures accumulate.
        let merger = MergeEngine::new(self.store.as_ref());
        for outcome in outcomes {
            report.api_calls_made += outcome.attempts;
            match outcome.result {
                Ok(bars) => match merger.merge(asset.id, &outcome.task, bars).await {
                    Ok(merged) => report.records_merged += merged.written(),
                    Err(err) => {
                        tracing::warn!(asset = %asset.id, error = %err, "merge task failed");
                        report.errors.push(err);
                    }
                },
                Err(err) => report.errors.push(err),
            }
        }

        // Consolidation: ordered after every merge by the plan invariant.
        let consolidator = ConsolidationEngine::new(self.store.as_ref());
        for task in plan.consolidation_tasks() {
            let outcome = consolidator.consolidate(asset.id, task.range).await;
            report.records_consolidated += outcome.records_consolidated;
            if let Some(err) = outcome.as_error() {
                report.errors.push(err);
            }
        }

        tracing::info!(
            asset = %asset.id,
            strategy = %report.strategy_used,
            api_calls = report.api_calls_made,
            merged = report.records_merged,
            consolidated = report.records_consolidated,
            errors = report.errors.len(),
            "sync run finished"
        );
        Ok(report)
    }

    /// One run per asset, concurrent across assets, bounded by the
    /// configured worker pool. The request budget is shared, so the global
    /// requests-per-minute bound holds across the whole pool.
    pub async fn run_all(
        &self,
        assets: &[Asset],
        days_back: u32,
        mode: UpdateMode,
    ) -> Vec<(AssetId, Result<SyncReport, SyncError>)> {
        futures::stream::iter(assets.iter().map(|asset| async move {
            (asset.id, self.run_sync(asset, days_back, mode).await)
        }))
        .buffer_unordered(self.cfg.max_concurrent_assets)
        .collect()
        .await
    }
}
