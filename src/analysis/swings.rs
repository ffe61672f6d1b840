use serde::Serialize;

use crate::data::{PriceBar, SwingKind, SwingPoint};

/// How a bar must compare to its window to count as an extremum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtremumRule {
    /// Strictly above (below) every other bar in the window.
    Strict,
    /// Equal to the window maximum (minimum). Bars tied at the extreme are
    /// each reported; plateaus produce one swing per tied bar.
    Inclusive,
}

#[derive(Debug, Clone, Default)]
pub struct SwingSet {
    pub highs: Vec<SwingPoint>,
    pub lows: Vec<SwingPoint>,
}

impl SwingSet {
    pub fn is_empty(&self) -> bool {
        self.highs.is_empty() && self.lows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.highs.len() + self.lows.len()
    }
}

/// Find swing highs and lows over a symmetric `2 * half_window + 1` window.
///
/// Only bars with `half_window` neighbours on both sides are candidates.
/// `offset` is added to every reported index so callers passing a trailing
/// slice still get positions in the full series.
pub fn detect_swing_points(
    bars: &[PriceBar],
    half_window: usize,
    rule: ExtremumRule,
    offset: usize,
) -> SwingSet {
    let mut swings = SwingSet::default();
    if half_window == 0 || bars.len() < 2 * half_window + 1 {
        return swings;
    }

    for i in half_window..bars.len() - half_window {
        let window = &bars[i - half_window..=i + half_window];
        let bar = &bars[i];

        if is_extreme(window, half_window, rule, |b| b.high, |a, b| a > b) {
            swings.highs.push(SwingPoint {
                index: offset + i,
                timestamp: bar.timestamp,
                price: bar.high,
                kind: SwingKind::High,
            });
        }
        if is_extreme(window, half_window, rule, |b| b.low, |a, b| a < b) {
            swings.lows.push(SwingPoint {
                index: offset + i,
                timestamp: bar.timestamp,
                price: bar.low,
                kind: SwingKind::Low,
            });
        }
    }

    swings
}

fn is_extreme(
    window: &[PriceBar],
    centre: usize,
    rule: ExtremumRule,
    value: impl Fn(&PriceBar) -> f64,
    beats: impl Fn(f64, f64) -> bool,
) -> bool {
    let candidate = value(&window[centre]);
    window
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != centre)
        .all(|(_, other)| {
            let other = value(other);
            match rule {
                ExtremumRule::Strict => beats(candidate, other),
                ExtremumRule::Inclusive => !beats(other, candidate),
            }
        })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use chrono_tz::UTC;

    use super::*;

    fn bars_from_highs_lows(points: &[(f64, f64)]) -> Vec<PriceBar> {
        let start = UTC.with_ymd_and_hms(2024, 5, 6, 9, 15, 0).unwrap();
        points
            .iter()
            .enumerate()
            .map(|(i, &(high, low))| {
                let mid = (high + low) / 2.0;
                PriceBar::new(start + Duration::minutes(5 * i as i64), mid, high, low, mid, 10.0)
            })
            .collect()
    }

    #[test]
    fn finds_isolated_peak_and_trough() {
        let mut points = vec![(105.0, 100.0); 11];
        points[3] = (110.0, 100.0);
        points[7] = (105.0, 95.0);
        let bars = bars_from_highs_lows(&points);

        let swings = detect_swing_points(&bars, 2, ExtremumRule::Strict, 0);
        assert_eq!(swings.highs.len(), 1);
        assert_eq!(swings.highs[0].index, 3);
        assert_eq!(swings.highs[0].price, 110.0);
        assert_eq!(swings.lows.len(), 1);
        assert_eq!(swings.lows[0].index, 7);
        assert_eq!(swings.lows[0].kind, SwingKind::Low);
    }

    #[test]
    fn bars_near_edges_are_not_candidates() {
        let mut points = vec![(105.0, 100.0); 11];
        points[1] = (120.0, 100.0);
        let bars = bars_from_highs_lows(&points);
        let swings = detect_swing_points(&bars, 2, ExtremumRule::Strict, 0);
        assert!(swings.highs.is_empty());
    }

    #[test]
    fn ties_split_by_rule() {
        let mut points = vec![(105.0, 100.0); 11];
        points[4] = (110.0, 100.0);
        points[5] = (110.0, 100.0);
        let bars = bars_from_highs_lows(&points);

        let strict = detect_swing_points(&bars, 2, ExtremumRule::Strict, 0);
        assert!(strict.highs.is_empty());

        let inclusive = detect_swing_points(&bars, 2, ExtremumRule::Inclusive, 0);
        let indices: Vec<usize> = inclusive.highs.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![4, 5]);
    }

    #[test]
    fn flat_series_has_no_strict_swings() {
        let bars = bars_from_highs_lows(&vec![(100.0, 100.0); 40]);
        let swings = detect_swing_points(&bars, 5, ExtremumRule::Strict, 0);
        assert!(swings.is_empty());
    }

    #[test]
    fn offset_shifts_reported_index() {
        let mut points = vec![(105.0, 100.0); 11];
        points[5] = (110.0, 100.0);
        let bars = bars_from_highs_lows(&points);
        let swings = detect_swing_points(&bars, 2, ExtremumRule::Strict, 40);
        assert_eq!(swings.highs[0].index, 45);
    }
}
