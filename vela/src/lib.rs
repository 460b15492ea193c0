//! vela
//!
//! Incremental synchronization engine for OHLCV price history.
//!
//! A sync run folds five phases over one asset: coverage analysis, planning,
//! fetching, merging, consolidation. Storage and the price provider are
//! collaborators behind the `vela-core` traits; the engine holds no
//! persistent state between invocations: it is a function from (storage
//! state, request parameters) to (storage mutations, report).
//!
//! ```no_run
//! use std::sync::Arc;
//! use vela::{SyncEngine, UpdateMode};
//! use vela_mock::{MemoryStore, ScriptedProvider};
//!
//! # async fn demo() -> Result<(), vela::SyncError> {
//! let engine = SyncEngine::builder()
//!     .store(Arc::new(MemoryStore::new()))
//!     .provider(Arc::new(ScriptedProvider::new()))
//!     .build()?;
//! let asset = vela::Asset::new(1, "BTC-USD");
//! let report = engine.run_sync(&asset, 90, UpdateMode::Smart).await?;
//! println!("merged {} records", report.records_merged);
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]

pub mod consolidate;
pub mod coverage;
pub mod engine;
pub mod executor;
pub mod merge;
pub mod planner;

pub use consolidate::{ConsolidationEngine, ConsolidationOutcome};
pub use coverage::{CoverageAnalyzer, CoverageAssessment};
pub use engine::{SyncEngine, SyncEngineBuilder};
pub use executor::{FetchExecutor, FetchOutcome, RequestBudget};
pub use merge::{MergeEngine, MergeOutcome};
pub use planner::SyncPlanner;

pub use vela_core::{
    Asset, AssetId, BackoffConfig, Bar, CoverageSnapshot, FetchTask, Granularity, MergeMode,
    PriceProvider, PriceRecord, PriceStore, SyncConfig, SyncError, SyncPlan, SyncReport,
    SyncStrategy, TimeRange, UpdateMode,
};
