//! Folding hourly bars into daily bars with exact numeric semantics.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::types::{Bar, TimeRange};

/// Floor a timestamp to the start of its UTC calendar day.
#[must_use]
pub fn day_floor(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// UTC day bounds `[00:00, next day 00:00)` for `date`.
#[must_use]
pub fn day_bounds(date: NaiveDate) -> TimeRange {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    TimeRange {
        start,
        end: start + Duration::days(1),
    }
}

/// Every UTC calendar day touched by `range`, oldest first.
#[must_use]
pub fn days_in(range: &TimeRange) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    if range.is_empty() {
        return days;
    }
    let mut day = range.start.date_naive();
    // The end bound is exclusive: a range ending exactly at midnight does
    // not touch that day.
    let last = (range.end - Duration::nanoseconds(1)).date_naive();
    while day <= last {
        days.push(day);
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

/// Fold one calendar day of hourly bars into a single daily bar.
///
/// - open = earliest bar's open, close = latest bar's close
/// - high = max high, low = min low
/// - volume = sum, saturating through a `u128` intermediate
/// - the result's `ts` is the day start (00:00:00 UTC)
///
/// Input order does not matter; callers pass bars already scoped to `date`.
/// Returns `None` when `bars` is empty (an empty day is a no-op).
#[must_use]
pub fn fold_daily(date: NaiveDate, mut bars: Vec<Bar>) -> Option<Bar> {
    bars.sort_by_key(|bar| bar.ts);

    let mut iter = bars.into_iter();
    let first = iter.next()?;
    let open = first.open;
    let mut high = first.high;
    let mut low = first.low;
    let mut close = first.close;
    let mut vol_sum = u128::from(first.volume);

    for bar in iter {
        if bar.high > high {
            high = bar.high;
        }
        if bar.low < low {
            low = bar.low;
        }
        close = bar.close;
        vol_sum += u128::from(bar.volume);
    }

    Some(Bar {
        ts: day_bounds(date).start,
        open,
        high,
        low,
        close,
        volume: u64::try_from(vol_sum.min(u128::from(u64::MAX))).unwrap_or(u64::MAX),
    })
}
