use chrono::DateTime;
use chrono_tz::Tz;

use crate::data::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchStats {
    /// High touches plus low touches; a bar whose high and low both sit in
    /// the band counts twice.
    pub count: usize,
    pub first: Option<DateTime<Tz>>,
    pub last: Option<DateTime<Tz>>,
}

/// Count bars whose high or low falls inside `[price - tolerance, price + tolerance]`.
pub fn count_touches(bars: &[PriceBar], price: f64, tolerance: f64) -> TouchStats {
    let lower = price - tolerance.abs();
    let upper = price + tolerance.abs();
    let in_band = |value: f64| value >= lower && value <= upper;

    let mut stats = TouchStats {
        count: 0,
        first: None,
        last: None,
    };
    for bar in bars {
        let hits = usize::from(in_band(bar.high)) + usize::from(in_band(bar.low));
        if hits == 0 {
            continue;
        }
        stats.count += hits;
        stats.first.get_or_insert(bar.timestamp);
        stats.last = Some(bar.timestamp);
    }
    stats
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use chrono_tz::UTC;

    use super::*;

    fn bars(ranges: &[(f64, f64)]) -> Vec<PriceBar> {
        let start = UTC.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        ranges
            .iter()
            .enumerate()
            .map(|(i, &(low, high))| {
                PriceBar::new(start + Duration::days(i as i64), low, high, low, high, 0.0)
            })
            .collect()
    }

    #[test]
    fn counts_highs_and_lows_in_band() {
        let series = bars(&[(95.0, 100.2), (99.9, 104.0), (110.0, 115.0), (90.0, 92.0)]);
        let stats = count_touches(&series, 100.0, 0.5);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.first, Some(series[0].timestamp));
        assert_eq!(stats.last, Some(series[1].timestamp));
    }

    #[test]
    fn narrow_bar_inside_wide_band_counts_twice() {
        let series = bars(&[(99.8, 100.1)]);
        assert_eq!(count_touches(&series, 100.0, 0.5).count, 2);
    }

    #[test]
    fn bar_straddling_band_without_extreme_inside_is_not_a_touch() {
        let series = bars(&[(98.0, 102.0)]);
        let stats = count_touches(&series, 100.0, 0.5);
        assert_eq!(stats.count, 0);
        assert!(stats.first.is_none());
    }

    #[test]
    fn band_edges_are_inclusive() {
        let series = bars(&[(99.5, 103.0), (97.0, 100.5)]);
        assert_eq!(count_touches(&series, 100.0, 0.5).count, 2);
    }
}
