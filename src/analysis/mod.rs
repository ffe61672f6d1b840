pub mod atr;
pub mod clustering;
pub mod levels;
pub mod round_numbers;
pub mod swings;
pub mod touches;
pub mod trend;

pub use atr::{estimate_volatility, true_ranges, Volatility, VolatilitySource};
pub use clustering::{cluster_swings, PriceCluster};
pub use levels::{
    select_levels, DetectionStrategy, LevelCandidate, LevelConfig, LevelDetector, Timeframe,
};
pub use round_numbers::{generate_round_numbers, round_number_increment};
pub use swings::{detect_swing_points, ExtremumRule, SwingSet};
pub use touches::{count_touches, TouchStats};
pub use trend::{ema_series, momentum_pct, TrendClassifier, TrendConfig};

/// Reference prices closer to zero than this are treated as degenerate.
const MIN_REFERENCE: f64 = 1e-12;

/// `delta / reference` in percent, or zero when the reference is degenerate.
pub(crate) fn safe_pct(delta: f64, reference: f64) -> f64 {
    if !delta.is_finite() || !reference.is_finite() || reference.abs() < MIN_REFERENCE {
        return 0.0;
    }
    delta / reference * 100.0
}
