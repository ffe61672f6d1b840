//! Market-structure extraction from OHLCV bars.
//!
//! Two pure entry points turn a validated [`PriceSeries`] into a symbolic
//! summary: [`classify_trend`] labels the trend and its strength, and
//! [`detect_levels`] ranks the nearest support and resistance zones. Neither
//! keeps state between calls, so independent series can be analysed on as
//! many threads as the caller likes.

pub mod analysis;
pub mod config;
pub mod data;
pub mod loader;
pub mod logging;
pub mod output;

pub use analysis::{
    DetectionStrategy, LevelConfig, LevelDetector, Timeframe, TrendClassifier, TrendConfig,
};
pub use data::{
    Level, LevelKind, LevelSet, PriceBar, PriceSeries, SeriesError, SwingKind, SwingPoint,
    TrendLabel, TrendResult, TrendSnapshot,
};

/// Classify the trend of `series` with the default EMA spans (3/8/20) and
/// momentum rules. Fewer than 20 bars give `NEUTRAL` with zero strength.
pub fn classify_trend(series: &PriceSeries) -> TrendResult {
    TrendClassifier::default().classify(series)
}

/// Detect up to `max_support` support and `max_resistance` resistance levels
/// around the last close using the default swing-based configuration.
/// Fewer than 50 bars give an empty set.
pub fn detect_levels(series: &PriceSeries, max_support: usize, max_resistance: usize) -> LevelSet {
    LevelDetector::default().detect(series, max_support, max_resistance)
}
