//! vela-core
//!
//! Core types, collaborator traits, and time-series utilities shared across
//! the vela workspace.
//!
//! - `types`: the minimal entity model (assets, bars, price records, ranges).
//! - `coverage`: stored-data coverage snapshots and sync strategies.
//! - `plan`: fetch/consolidation tasks and plan invariant validation.
//! - `store` / `provider`: the collaborator contracts consumed by the engine.
//! - `timeseries`: hourly-to-daily aggregation with exact numeric semantics.
//!
//! The engine crate (`vela`) builds exclusively on the surface exposed here;
//! storage backends and provider clients implement the traits in `store` and
//! `provider` without depending on the engine.
#![warn(missing_docs)]

pub mod config;
pub mod coverage;
pub mod error;
pub mod plan;
pub mod provider;
pub mod report;
pub mod store;
pub mod timeseries;
pub mod types;

pub use config::{BackoffConfig, SyncConfig, UpdateMode};
pub use coverage::{CoverageSnapshot, Gap, OverlapZone, StoredExtent, SyncStrategy};
pub use error::SyncError;
pub use plan::{FetchTask, MergeMode, SyncPlan};
pub use provider::PriceProvider;
pub use report::SyncReport;
pub use store::{CommitStats, DeleteRange, PriceStore, WriteBatch};
pub use timeseries::aggregate::{day_bounds, day_floor, days_in, fold_daily};
pub use types::{Asset, AssetId, Bar, Granularity, PriceRecord, TimeRange};
