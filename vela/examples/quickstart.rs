//! Minimal end-to-end run against the in-memory doubles.
//!
//! ```sh
//! RUST_LOG=debug cargo run -p vela --example quickstart
//! ```

use std::sync::Arc;

use vela::{Asset, SyncEngine, UpdateMode};
use vela_mock::{MemoryStore, ScriptedProvider};

#[tokio::main]
async fn main() -> Result<(), vela::SyncError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let engine = SyncEngine::builder()
        .store(Arc::new(MemoryStore::new()))
        .provider(Arc::new(ScriptedProvider::new()))
        .build()?;

    let asset = Asset::new(1, "BTC-USD");
    let report = engine.run_sync(&asset, 90, UpdateMode::Smart).await?;
    println!(
        "strategy={} api_calls={} merged={} consolidated={} errors={}",
        report.strategy_used,
        report.api_calls_made,
        report.records_merged,
        report.records_consolidated,
        report.errors.len()
    );
    Ok(())
}
