#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::{Tz, UTC};
use market_structure::{PriceBar, PriceSeries};

pub fn day(i: usize) -> DateTime<Tz> {
    UTC.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(i as i64)
}

/// Series from `(open, high, low, close)` tuples on consecutive days.
pub fn series_from_ohlc(rows: &[(f64, f64, f64, f64)]) -> PriceSeries {
    let bars = rows
        .iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| PriceBar::new(day(i), open, high, low, close, 1_000.0))
        .collect();
    PriceSeries::new(bars).unwrap()
}

pub fn series_from_closes(closes: &[f64]) -> PriceSeries {
    let rows: Vec<_> = closes.iter().map(|&c| (c, c, c, c)).collect();
    series_from_ohlc(&rows)
}

/// Deterministic random walk with realistic wicks.
pub fn random_walk(len: usize, seed: u64, start: f64) -> PriceSeries {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 33) as f64 / (1u64 << 31) as f64
    };

    let mut close = start;
    let mut rows = Vec::with_capacity(len);
    for _ in 0..len {
        let open = close;
        close = (open + (next() - 0.5) * start * 0.02).max(1.0);
        let high = open.max(close) + next() * start * 0.008;
        let low = (open.min(close) - next() * start * 0.008).max(0.5);
        rows.push((open, high, low, close));
    }
    series_from_ohlc(&rows)
}
