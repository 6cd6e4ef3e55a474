//! Property tests for resampling and SAR invariants.
//!
//! Uses proptest to verify:
//! 1. Resampling never grows a series, keeps high >= low and conserves volume
//! 2. Resampled dates are strictly increasing bucket starts
//! 3. SAR output is aligned with its input, one value per bar
//! 4. SAR sits on the correct side of price for every non-reversal bar
//! 5. AF stays in [step, max_step], resets on reversal, never shrinks within a leg

use chrono::NaiveDate;
use proptest::prelude::*;
use sarscreen_core::domain::{AggregationWindow, Bar};
use sarscreen_core::indicators::{ParabolicSar, Trend};
use sarscreen_core::resample::{aggregate, bucket_index, bucket_start};
use sarscreen_core::signal::evaluate;

// ── Strategies (proptest) ────────────────────────────────────────────

/// One bar's worth of randomness: calendar gap to the previous bar, close
/// move, intrabar spread, volume.
fn arb_step() -> impl Strategy<Value = (i64, f64, f64, u64)> {
    (1..4_i64, -3.0..3.0_f64, 0.1..4.0_f64, 0..1_000_000_u64)
}

fn arb_bars() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec(arb_step(), 1..120).prop_map(|steps| {
        let mut date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let mut close = 100.0_f64;
        steps
            .into_iter()
            .map(|(gap, delta, spread, volume)| {
                date += chrono::Duration::days(gap);
                let open = close;
                close = (close + delta).max(1.0);
                Bar {
                    date,
                    open,
                    high: open.max(close) + spread,
                    low: (open.min(close) - spread).max(0.01),
                    close,
                    volume,
                }
            })
            .collect()
    })
}

fn arb_window() -> impl Strategy<Value = AggregationWindow> {
    (1..10_u32).prop_map(|d| AggregationWindow::new(d).unwrap())
}

fn arb_params() -> impl Strategy<Value = ParabolicSar> {
    (0.005..0.05_f64, 1..12_u32)
        .prop_map(|(step, mult)| ParabolicSar::new(step, step * f64::from(mult)).unwrap())
}

// ── 1–2. Resampling ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn aggregate_never_grows_and_conserves_volume(bars in arb_bars(), window in arb_window()) {
        let out = aggregate(&bars, window);
        prop_assert!(out.len() <= bars.len());
        prop_assert!(!out.is_empty());

        let total_in: u64 = bars.iter().map(|b| b.volume).sum();
        let total_out: u64 = out.iter().map(|b| b.volume).sum();
        prop_assert_eq!(total_in, total_out);

        for b in &out {
            prop_assert!(b.high >= b.low);
            prop_assert!(b.is_sane());
        }
    }

    #[test]
    fn aggregate_dates_are_increasing_bucket_starts(bars in arb_bars(), window in arb_window()) {
        let out = aggregate(&bars, window);
        for pair in out.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
        for b in &out {
            prop_assert_eq!(bucket_start(bucket_index(b.date, window), window), b.date);
        }
    }

    #[test]
    fn aggregate_extremes_match_bucket_members(bars in arb_bars(), window in arb_window()) {
        let out = aggregate(&bars, window);
        for agg in &out {
            let idx = bucket_index(agg.date, window);
            let members: Vec<&Bar> = bars.iter().filter(|b| bucket_index(b.date, window) == idx).collect();
            prop_assert!(!members.is_empty());
            let high = members.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let low = members.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            prop_assert_eq!(agg.high, high);
            prop_assert_eq!(agg.low, low);
            prop_assert_eq!(agg.open, members[0].open);
            prop_assert_eq!(agg.close, members[members.len() - 1].close);
        }
    }
}

// ── 3–5. Parabolic SAR ───────────────────────────────────────────────

proptest! {
    #[test]
    fn sar_is_aligned_with_input(bars in arb_bars(), psar in arb_params()) {
        let sar = psar.compute(&bars);
        prop_assert_eq!(sar.len(), bars.len());
        prop_assert!(sar.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn sar_sits_on_the_trend_side_of_price(bars in arb_bars(), psar in arb_params()) {
        let trace = psar.compute_trace(&bars);
        for (bar, point) in bars.iter().zip(&trace) {
            if point.reversed {
                continue;
            }
            match point.trend {
                Trend::Up => prop_assert!(point.sar <= bar.low),
                Trend::Down => prop_assert!(point.sar >= bar.high),
            }
        }
    }

    #[test]
    fn acceleration_ratchets_within_a_leg(bars in arb_bars(), psar in arb_params()) {
        let trace = psar.compute_trace(&bars);
        let eps = 1e-12;
        prop_assert!((trace[0].acceleration - psar.step()).abs() < eps);
        for i in 0..trace.len() {
            let af = trace[i].acceleration;
            prop_assert!(af >= psar.step() - eps && af <= psar.max_step() + eps);
            if trace[i].reversed {
                prop_assert!((af - psar.step()).abs() < eps);
            } else if i > 0 {
                prop_assert!(af >= trace[i - 1].acceleration);
                prop_assert_eq!(trace[i].trend, trace[i - 1].trend);
            }
        }
    }

    #[test]
    fn signal_never_fires_at_or_above_the_low(low in 0.01..1000.0_f64, above in 0.0..50.0_f64, tol in 0.0..100.0_f64) {
        prop_assert!(!evaluate(low, low + above, tol));
    }
}
