//! Granularity-converting aggregation helpers.

pub mod aggregate;
