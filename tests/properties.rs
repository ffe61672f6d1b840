mod common;

use chrono::Duration;
use rstest::rstest;

use market_structure::analysis::{
    cluster_swings, generate_round_numbers, round_number_increment, DetectionStrategy,
    LevelConfig, LevelDetector,
};
use market_structure::{classify_trend, detect_levels, LevelSet, SwingKind, SwingPoint};

use common::random_walk;

fn level_signature(set: &LevelSet) -> Vec<(f64, usize, bool)> {
    set.support
        .iter()
        .chain(set.resistance.iter())
        .map(|level| (level.price, level.touches, level.is_round_number))
        .collect()
}

#[rstest]
#[case(DetectionStrategy::SwingBased, 0.5)]
#[case(DetectionStrategy::SwingBased, 1.5)]
#[case(DetectionStrategy::LocalExtrema, 0.5)]
#[case(DetectionStrategy::LocalExtrema, 0.25)]
fn levels_respect_side_and_touch_invariants(
    #[case] strategy: DetectionStrategy,
    #[case] multiplier: f64,
) {
    for seed in [7_u64, 42, 1_234, 98_765] {
        let series = random_walk(300, seed, 1_800.0);
        let close = series.current_close().unwrap();
        let config = LevelConfig {
            strategy,
            cluster_multiplier: multiplier,
            lookback_bars: 200,
            ..LevelConfig::default()
        };
        let min_touches = config.min_touches;
        let set = LevelDetector::new(config).detect(&series, 3, 3);

        assert!(set.support.len() <= 3 && set.resistance.len() <= 3);
        assert!(set.support.iter().all(|l| l.price < close));
        assert!(set.resistance.iter().all(|l| l.price > close));
        assert!(set
            .support
            .iter()
            .chain(set.resistance.iter())
            .all(|l| l.touches >= min_touches));
        assert!(set.support.windows(2).all(|w| w[0].price >= w[1].price));
        assert!(set.resistance.windows(2).all(|w| w[0].price <= w[1].price));
    }
}

#[test]
fn entry_points_are_idempotent() {
    let series = random_walk(250, 11, 420.0);

    assert_eq!(classify_trend(&series), classify_trend(&series));
    let first = detect_levels(&series, 5, 5);
    let second = detect_levels(&series, 5, 5);
    assert_eq!(level_signature(&first), level_signature(&second));
}

#[rstest]
#[case(3)]
#[case(17)]
#[case(2_024)]
fn trend_strength_is_bounded(#[case] seed: u64) {
    for len in [20, 35, 120, 400] {
        let series = random_walk(len, seed, 75.0);
        let trend = classify_trend(&series);
        assert!((0.0..=100.0).contains(&trend.strength));
    }
}

#[test]
fn coarser_tolerance_never_adds_clusters() {
    let start = common::day(0);
    let prices = [99.9, 100.0, 100.1, 104.9, 105.0, 105.1, 109.9, 110.0, 110.1];
    let swings: Vec<SwingPoint> = prices
        .iter()
        .enumerate()
        .map(|(i, &price)| SwingPoint {
            index: i,
            timestamp: start + Duration::days(i as i64),
            price,
            kind: SwingKind::High,
        })
        .collect();

    let volatility = 2.0;
    let counts: Vec<usize> = [0.025, 0.25, 3.0, 10.0]
        .iter()
        .map(|multiplier| cluster_swings(&swings, volatility * multiplier).len())
        .collect();
    assert!(counts.windows(2).all(|w| w[1] <= w[0]), "{counts:?}");
    assert_eq!(counts.first(), Some(&9));
    assert_eq!(counts.last(), Some(&1));
}

#[rstest]
#[case(8_500.0, 16_000.0)]
#[case(950.0, 2_600.0)]
#[case(60.0, 480.0)]
#[case(3.0, 95.0)]
fn round_numbers_are_multiples_of_increment(#[case] low: f64, #[case] high: f64) {
    let increment = round_number_increment(high);
    let levels = generate_round_numbers(low, high);
    assert!(!levels.is_empty());
    for price in levels {
        assert!(price >= low && price <= high);
        assert_eq!(price % increment, 0.0);
        assert_eq!(price % (increment * 10.0), 0.0);
    }
}

#[test]
fn round_levels_in_output_sit_on_the_grid() {
    for seed in [5_u64, 6, 7, 8] {
        let series = random_walk(300, seed, 12_000.0);
        let set = detect_levels(&series, 10, 10);
        for level in set.support.iter().chain(set.resistance.iter()) {
            if level.is_round_number {
                assert_eq!(level.price % 500.0, 0.0);
            }
        }
    }
}
