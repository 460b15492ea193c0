use chrono::{NaiveDate, NaiveTime};
use proptest::prelude::*;
use rust_decimal::Decimal;

use vela_core::timeseries::aggregate::{day_bounds, day_floor, days_in, fold_daily};
use vela_core::{Bar, TimeRange};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date")
}

fn bar_for(hour: u32, cents: i64, volume: u64) -> Bar {
    let ts = day()
        .and_hms_opt(hour, 0, 0)
        .expect("valid time")
        .and_utc();
    let px = Decimal::new(cents, 2);
    Bar {
        ts,
        open: px,
        high: px + Decimal::ONE,
        low: px - Decimal::ONE,
        close: px + Decimal::new(5, 1),
        volume,
    }
}

/// Bars with distinct hour-of-day timestamps, in random order.
fn arb_day_bars() -> impl Strategy<Value = Vec<Bar>> {
    proptest::collection::btree_map(0u32..24, (0i64..100_000, 0u64..100_000), 1..=24usize)
        .prop_map(|by_hour| {
            by_hour
                .into_iter()
                .map(|(hour, (cents, volume))| bar_for(hour, cents, volume))
                .collect::<Vec<_>>()
        })
        .prop_shuffle()
}

proptest! {
    #[test]
    fn fold_matches_component_wise_definition(bars in arb_day_bars()) {
        let folded = fold_daily(day(), bars.clone()).expect("non-empty input");
        let mut sorted = bars.clone();
        sorted.sort_by_key(|bar| bar.ts);

        prop_assert_eq!(folded.ts, day_bounds(day()).start);
        prop_assert_eq!(folded.open, sorted.first().unwrap().open);
        prop_assert_eq!(folded.close, sorted.last().unwrap().close);
        prop_assert_eq!(folded.high, bars.iter().map(|bar| bar.high).max().unwrap());
        prop_assert_eq!(folded.low, bars.iter().map(|bar| bar.low).min().unwrap());
        let volume: u128 = bars.iter().map(|bar| u128::from(bar.volume)).sum();
        prop_assert_eq!(u128::from(folded.volume), volume);
    }

    #[test]
    fn fold_is_order_insensitive(bars in arb_day_bars()) {
        let mut reversed = bars.clone();
        reversed.reverse();
        prop_assert_eq!(fold_daily(day(), bars), fold_daily(day(), reversed));
    }
}

#[test]
fn fold_of_empty_day_is_none() {
    assert!(fold_daily(day(), Vec::new()).is_none());
}

#[test]
fn day_bounds_cover_exactly_one_day() {
    let bounds = day_bounds(day());
    assert_eq!(bounds.start, day().and_time(NaiveTime::MIN).and_utc());
    assert_eq!(bounds.duration(), chrono::Duration::days(1));
}

#[test]
fn day_floor_drops_the_time_of_day() {
    let noon = day().and_hms_opt(12, 34, 56).unwrap().and_utc();
    assert_eq!(day_floor(noon), day_bounds(day()).start);
}

#[test]
fn days_in_excludes_the_exclusive_end_midnight() {
    let range = TimeRange {
        start: day().and_time(NaiveTime::MIN).and_utc(),
        end: (day() + chrono::Duration::days(3))
            .and_time(NaiveTime::MIN)
            .and_utc(),
    };
    assert_eq!(
        days_in(&range),
        vec![
            day(),
            day() + chrono::Duration::days(1),
            day() + chrono::Duration::days(2),
        ]
    );
}

#[test]
fn days_in_includes_partially_covered_days() {
    let range = TimeRange {
        start: day().and_hms_opt(12, 0, 0).unwrap().and_utc(),
        end: (day() + chrono::Duration::days(1))
            .and_hms_opt(6, 0, 0)
            .unwrap()
            .and_utc(),
    };
    assert_eq!(days_in(&range), vec![day(), day() + chrono::Duration::days(1)]);
}

#[test]
fn days_in_of_empty_range_is_empty() {
    let midnight = day().and_time(NaiveTime::MIN).and_utc();
    let range = TimeRange {
        start: midnight,
        end: midnight,
    };
    assert!(days_in(&range).is_empty());
}
