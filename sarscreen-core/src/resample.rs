//! N-day resampling of daily bars.
//!
//! Buckets are contiguous runs of `window` calendar days anchored at the Unix
//! epoch (1970-01-01): a date falls in bucket `floor(days_since_epoch / window)`.
//! Anchoring to a fixed epoch, rather than to the first observed date, keeps
//! bucket boundaries identical across runs with different history lengths.
//!
//! Field rules per bucket: first open, max high, min low, last close, summed
//! volume. Buckets without contributing bars produce no output.

use chrono::NaiveDate;

use crate::domain::{AggregationWindow, Bar};

/// Bucket anchor: 1970-01-01 (chrono's `NaiveDate::default()`).
pub fn epoch() -> NaiveDate {
    NaiveDate::default()
}

/// Bucket index for a date under the given window.
pub fn bucket_index(date: NaiveDate, window: AggregationWindow) -> i64 {
    (date - epoch()).num_days().div_euclid(i64::from(window.days()))
}

/// First calendar day of a bucket.
pub fn bucket_start(index: i64, window: AggregationWindow) -> NaiveDate {
    epoch() + chrono::Duration::days(index * i64::from(window.days()))
}

/// Resample a date-ordered bar slice into `window`-day bars.
///
/// Each output bar is dated at its bucket's first calendar day, which may be
/// earlier than the first contributing bar (e.g. a weekend-started bucket).
pub fn aggregate(bars: &[Bar], window: AggregationWindow) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::new();
    let mut current: Option<i64> = None;

    for bar in bars {
        let idx = bucket_index(bar.date, window);
        match (current, out.last_mut()) {
            (Some(c), Some(acc)) if c == idx => {
                acc.high = acc.high.max(bar.high);
                acc.low = acc.low.min(bar.low);
                acc.close = bar.close;
                acc.volume = acc.volume.saturating_add(bar.volume);
            }
            _ => {
                out.push(Bar {
                    date: bucket_start(idx, window),
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    close: bar.close,
                    volume: bar.volume,
                });
                current = Some(idx);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(days: u32) -> AggregationWindow {
        AggregationWindow::new(days).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bar(date: NaiveDate, o: f64, h: f64, l: f64, c: f64, v: u64) -> Bar {
        Bar {
            date,
            open: o,
            high: h,
            low: l,
            close: c,
            volume: v,
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(aggregate(&[], window(3)).is_empty());
    }

    #[test]
    fn epoch_anchoring() {
        assert_eq!(epoch(), day(1970, 1, 1));
        // 1970-01-01 .. 1970-01-03 is bucket 0 for a 3-day window.
        assert_eq!(bucket_index(day(1970, 1, 1), window(3)), 0);
        assert_eq!(bucket_index(day(1970, 1, 3), window(3)), 0);
        assert_eq!(bucket_index(day(1970, 1, 4), window(3)), 1);
        // Dates before the epoch round toward negative infinity.
        assert_eq!(bucket_index(day(1969, 12, 31), window(3)), -1);
        assert_eq!(bucket_start(-1, window(3)), day(1969, 12, 29));
    }

    #[test]
    fn bucket_start_contains_date() {
        let w = window(4);
        let d = day(2024, 1, 2);
        let start = bucket_start(bucket_index(d, w), w);
        assert!(start <= d);
        assert!((d - start).num_days() < 4);
    }

    #[test]
    fn merges_fields_per_rules() {
        // 2024-01-01 is day 19723 since epoch; 19723 % 3 == 1, so the
        // bucket containing it starts on 2023-12-31.
        let w = window(3);
        let bars = vec![
            bar(day(2024, 1, 1), 10.0, 12.0, 9.0, 11.0, 100),
            bar(day(2024, 1, 2), 11.0, 15.0, 10.0, 14.0, 200),
            bar(day(2024, 1, 3), 14.0, 14.5, 12.0, 13.0, 300),
        ];
        let out = aggregate(&bars, w);
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].date, day(2023, 12, 31));
        assert_eq!(out[0].open, 10.0);
        assert_eq!(out[0].high, 15.0);
        assert_eq!(out[0].low, 9.0);
        assert_eq!(out[0].close, 14.0);
        assert_eq!(out[0].volume, 300);

        assert_eq!(out[1].date, day(2024, 1, 3));
        assert_eq!(out[1].open, 14.0);
        assert_eq!(out[1].close, 13.0);
        assert_eq!(out[1].volume, 300);
    }

    #[test]
    fn gaps_do_not_fabricate_bars() {
        let w = window(3);
        let bars = vec![
            bar(day(2024, 1, 3), 1.0, 2.0, 0.5, 1.5, 10),
            // Buckets starting 01-06 and 01-09 stay empty.
            bar(day(2024, 1, 12), 2.0, 3.0, 1.5, 2.5, 20),
        ];
        let out = aggregate(&bars, w);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].volume, 10);
        assert_eq!(out[1].volume, 20);
    }

    #[test]
    fn one_day_window_is_identity_on_daily_data() {
        let bars: Vec<Bar> = (0..5)
            .map(|i| {
                let p = 100.0 + i as f64;
                bar(day(2024, 3, 4) + chrono::Duration::days(i), p, p + 1.0, p - 1.0, p, 7)
            })
            .collect();
        assert_eq!(aggregate(&bars, window(1)), bars);
    }
}
