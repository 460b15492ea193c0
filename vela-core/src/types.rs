//! The minimal entity model the engine operates on.

use core::fmt;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Opaque identifier of a tracked asset, assigned by the storage collaborator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct AssetId(pub i64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AssetId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A tracked asset: storage identity plus the provider-side symbol.
///
/// The scheduler collaborator resolves which assets exist; the engine only
/// carries the pair through to storage and provider calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Storage identity.
    pub id: AssetId,
    /// External identifier used when talking to the provider.
    pub symbol: String,
}

impl Asset {
    /// Build an asset descriptor.
    pub fn new(id: impl Into<AssetId>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
        }
    }
}

/// Sampling resolution of a price record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One record per hour.
    Hourly,
    /// One record per UTC calendar day.
    Daily,
}

impl Granularity {
    /// Sampling interval of this granularity.
    #[must_use]
    pub fn step(self) -> Duration {
        match self {
            Self::Hourly => Duration::hours(1),
            Self::Daily => Duration::days(1),
        }
    }

    /// Stable lowercase label used in logs and error payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One OHLCV sample, not yet tied to an asset or a stored granularity.
///
/// `ts` is the bucket start in UTC. Prices are exact decimals; volume is a
/// plain count and aggregates by saturating summation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Bucket start (UTC).
    pub ts: DateTime<Utc>,
    /// Opening price.
    pub open: Decimal,
    /// Highest traded price in the bucket.
    pub high: Decimal,
    /// Lowest traded price in the bucket.
    pub low: Decimal,
    /// Closing price.
    pub close: Decimal,
    /// Traded volume in the bucket.
    pub volume: u64,
}

/// A stored OHLCV record, unique per `(asset_id, ts, granularity)`.
///
/// Records are created and overwritten only through upserts, and destroyed
/// only by consolidation (or an external retention collaborator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Asset this record belongs to.
    pub asset_id: AssetId,
    /// Sampling resolution the record is stored at.
    pub granularity: Granularity,
    /// The sample itself.
    pub bar: Bar,
}

impl PriceRecord {
    /// Stamp a bar with its storage identity.
    #[must_use]
    pub const fn new(asset_id: AssetId, granularity: Granularity, bar: Bar) -> Self {
        Self {
            asset_id,
            granularity,
            bar,
        }
    }

    /// Record timestamp.
    #[must_use]
    pub const fn ts(&self) -> DateTime<Utc> {
        self.bar.ts
    }
}

/// Half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a validated range.
    ///
    /// # Errors
    /// Returns `SyncError::InvalidArg` if `end` precedes `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SyncError> {
        if end < start {
            return Err(SyncError::InvalidArg(format!(
                "range end {end} precedes start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Trailing window of `hours` ending at `end`.
    #[must_use]
    pub fn last_hours(end: DateTime<Utc>, hours: u32) -> Self {
        Self {
            start: end - Duration::hours(i64::from(hours)),
            end,
        }
    }

    /// Trailing window of `days` ending at `end`.
    #[must_use]
    pub fn last_days(end: DateTime<Utc>, days: u32) -> Self {
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }

    /// True when the interval contains no instants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True when `ts` falls inside `[start, end)`.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }

    /// True when the two ranges share any instant.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Interval length.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
