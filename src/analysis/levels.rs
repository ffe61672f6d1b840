use std::cmp::Ordering;

use chrono::DateTime;
use chrono_tz::Tz;
use clap::ValueEnum;
use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use crate::analysis::atr::estimate_volatility;
use crate::analysis::clustering::{cluster_swings, PriceCluster};
use crate::analysis::round_numbers::{extended_range, generate_round_numbers};
use crate::analysis::swings::{detect_swing_points, ExtremumRule};
use crate::analysis::touches::count_touches;
use crate::data::{Level, LevelKind, LevelSet, PriceSeries};

/// How raw extrema are found and how a zone's touches are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
pub enum DetectionStrategy {
    /// Strict window extrema; a zone's touches are its member swings.
    SwingBased,
    /// Inclusive (`== max`) window extrema; touches are re-counted against
    /// every bar of the series.
    LocalExtrema,
}

impl DetectionStrategy {
    pub fn extremum_rule(&self) -> ExtremumRule {
        match self {
            DetectionStrategy::SwingBased => ExtremumRule::Strict,
            DetectionStrategy::LocalExtrema => ExtremumRule::Inclusive,
        }
    }
}

/// Bar interval of the series, used to pick detection presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
pub enum Timeframe {
    #[value(name = "1m")]
    Min1,
    #[value(name = "5m")]
    Min5,
    #[value(name = "15m")]
    Min15,
    #[value(name = "1h")]
    Hour1,
    #[value(name = "1d")]
    Day1,
    #[value(name = "1w")]
    Week1,
}

impl Timeframe {
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Min1 => "1m",
            Timeframe::Min5 => "5m",
            Timeframe::Min15 => "15m",
            Timeframe::Hour1 => "1h",
            Timeframe::Day1 => "1d",
            Timeframe::Week1 => "1w",
        }
    }

    /// Wider swing windows for slower bars.
    pub fn swing_half_window(&self) -> usize {
        match self {
            Timeframe::Min1 | Timeframe::Min5 | Timeframe::Min15 => 5,
            Timeframe::Hour1 | Timeframe::Day1 | Timeframe::Week1 => 10,
        }
    }

    pub fn lookback_bars(&self) -> usize {
        match self {
            Timeframe::Min1 | Timeframe::Min5 | Timeframe::Min15 | Timeframe::Hour1 => 200,
            Timeframe::Day1 => 100,
            Timeframe::Week1 => 52,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LevelConfig {
    pub strategy: DetectionStrategy,
    pub atr_period: usize,
    /// Tolerance for clustering and touch counting, in volatility multiples.
    pub cluster_multiplier: f64,
    pub min_touches: usize,
    pub half_window: usize,
    /// Trailing bars searched for swings. Volatility and touches always use
    /// the full series.
    pub lookback_bars: usize,
    pub include_round_numbers: bool,
    /// Shorter series yield an empty level set.
    pub min_bars: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            strategy: DetectionStrategy::SwingBased,
            atr_period: 14,
            cluster_multiplier: 0.5,
            min_touches: 2,
            half_window: 5,
            lookback_bars: 100,
            include_round_numbers: true,
            min_bars: 50,
        }
    }
}

impl LevelConfig {
    pub fn for_timeframe(timeframe: Timeframe) -> Self {
        Self {
            half_window: timeframe.swing_half_window(),
            lookback_bars: timeframe.lookback_bars(),
            ..Self::default()
        }
    }
}

/// Candidate zone before it is placed on either side of the current price.
#[derive(Debug, Clone)]
pub struct LevelCandidate {
    pub price: f64,
    pub touches: usize,
    pub first_seen: DateTime<Tz>,
    pub last_seen: DateTime<Tz>,
    pub is_round_number: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LevelDetector {
    config: LevelConfig,
}

impl LevelDetector {
    pub fn new(config: LevelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn detect(
        &self,
        series: &PriceSeries,
        max_support: usize,
        max_resistance: usize,
    ) -> LevelSet {
        let Some(current_price) = series.current_close() else {
            return LevelSet::empty(0.0);
        };
        if series.len() < self.config.min_bars {
            debug!(
                bars = series.len(),
                required = self.config.min_bars,
                "not enough bars for level detection"
            );
            return LevelSet::empty(current_price);
        }

        let candidates = self.candidates(series);
        select_levels(
            candidates,
            current_price,
            self.config.min_touches,
            max_support,
            max_resistance,
        )
    }

    /// Every zone that could become a level, before touch filtering and
    /// ranking.
    pub fn candidates(&self, series: &PriceSeries) -> Vec<LevelCandidate> {
        let bars = series.bars();
        let config = &self.config;

        let volatility = estimate_volatility(bars, config.atr_period);
        let tolerance = volatility.tolerance(config.cluster_multiplier);

        let lookback = match config.lookback_bars {
            0 => bars.len(),
            n => n.min(bars.len()),
        };
        let offset = bars.len() - lookback;
        let swings = detect_swing_points(
            &bars[offset..],
            config.half_window,
            config.strategy.extremum_rule(),
            offset,
        );

        let clusters: Vec<PriceCluster> = cluster_swings(&swings.highs, tolerance)
            .into_iter()
            .chain(cluster_swings(&swings.lows, tolerance))
            .collect();
        debug!(
            volatility = volatility.value,
            source = ?volatility.source,
            tolerance,
            swing_highs = swings.highs.len(),
            swing_lows = swings.lows.len(),
            clusters = clusters.len(),
            "clustered swing points"
        );

        let mut candidates: Vec<LevelCandidate> = clusters
            .into_iter()
            .map(|cluster| match config.strategy {
                DetectionStrategy::SwingBased => LevelCandidate {
                    price: cluster.price,
                    touches: cluster.members,
                    first_seen: cluster.first_seen,
                    last_seen: cluster.last_seen,
                    is_round_number: false,
                },
                DetectionStrategy::LocalExtrema => {
                    let stats = count_touches(bars, cluster.price, tolerance);
                    LevelCandidate {
                        price: cluster.price,
                        touches: stats.count,
                        first_seen: stats.first.unwrap_or(cluster.first_seen),
                        last_seen: stats.last.unwrap_or(cluster.last_seen),
                        is_round_number: false,
                    }
                }
            })
            .collect();

        if config.include_round_numbers {
            let round = self.round_number_candidates(series, tolerance, &candidates);
            candidates.extend(round);
        }

        candidates
    }

    fn round_number_candidates(
        &self,
        series: &PriceSeries,
        tolerance: f64,
        swing_candidates: &[LevelCandidate],
    ) -> Vec<LevelCandidate> {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return Vec::new();
        };
        let bars = series.bars();
        let (low, high) = bars.iter().fold((f64::MAX, f64::MIN), |(lo, hi), bar| {
            (lo.min(bar.low), hi.max(bar.high))
        });
        let (min_price, max_price) = extended_range(low, high);

        // Only zones that survive the touch filter can shadow a round number.
        let reported: Vec<f64> = swing_candidates
            .iter()
            .filter(|candidate| candidate.touches >= self.config.min_touches)
            .map(|candidate| candidate.price)
            .collect();

        generate_round_numbers(min_price, max_price)
            .into_iter()
            .filter(|price| {
                !reported
                    .iter()
                    .any(|zone| (zone - price).abs() <= tolerance)
            })
            .map(|price| {
                let stats = count_touches(bars, price, tolerance);
                LevelCandidate {
                    price,
                    touches: stats.count,
                    first_seen: stats.first.unwrap_or(first.timestamp),
                    last_seen: stats.last.unwrap_or(last.timestamp),
                    is_round_number: true,
                }
            })
            .collect()
    }
}

/// Drop weak candidates, split them around `current_price` and keep the
/// closest `max_support` / `max_resistance` on each side.
///
/// Candidates exactly at the current price belong to neither side. Ties in
/// distance go to the level with more touches.
pub fn select_levels(
    candidates: Vec<LevelCandidate>,
    current_price: f64,
    min_touches: usize,
    max_support: usize,
    max_resistance: usize,
) -> LevelSet {
    let (support, resistance): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .filter(|c| c.touches >= min_touches && c.price != current_price)
        .partition(|c| c.price < current_price);

    let support = support
        .into_iter()
        .sorted_by(|a, b| {
            b.price
                .partial_cmp(&a.price)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.touches.cmp(&a.touches))
        })
        .take(max_support)
        .map(|c| into_level(c, LevelKind::Support))
        .collect();

    let resistance = resistance
        .into_iter()
        .sorted_by(|a, b| {
            a.price
                .partial_cmp(&b.price)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.touches.cmp(&a.touches))
        })
        .take(max_resistance)
        .map(|c| into_level(c, LevelKind::Resistance))
        .collect();

    LevelSet {
        current_price,
        support,
        resistance,
    }
}

fn into_level(candidate: LevelCandidate, kind: LevelKind) -> Level {
    Level {
        price: candidate.price,
        kind,
        touches: candidate.touches,
        first_seen: candidate.first_seen,
        last_seen: candidate.last_seen,
        is_round_number: candidate.is_round_number,
    }
}
