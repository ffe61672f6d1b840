use std::fmt;

use chrono::{DateTime, NaiveTime};
use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;

use crate::analysis::safe_pct;

/// Single OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Tz>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(
        timestamp: DateTime<Tz>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Reasons a bar sequence is rejected as a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar {index} repeats the timestamp of the previous bar")]
    DuplicateTimestamp { index: usize },

    #[error("bar {index} is earlier than the previous bar; timestamps must be strictly increasing")]
    NonIncreasingTimestamp { index: usize },

    #[error("bar {index} has an invalid {field} price: {value}")]
    InvalidPrice {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("bar {index} has an invalid volume: {value}")]
    InvalidVolume { index: usize, value: f64 },

    #[error("bar {index} violates high >= open/close >= low")]
    InconsistentBar { index: usize },
}

/// Validated, strictly time-ordered sequence of bars.
///
/// Construction fails instead of repairing input: duplicate or out-of-order
/// timestamps, negative or non-finite prices and bars whose high/low do not
/// bracket open/close are all rejected.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            validate_bar(index, bar)?;
        }
        for (offset, pair) in bars.windows(2).enumerate() {
            let index = offset + 1;
            if pair[1].timestamp == pair[0].timestamp {
                return Err(SeriesError::DuplicateTimestamp { index });
            }
            if pair[1].timestamp < pair[0].timestamp {
                return Err(SeriesError::NonIncreasingTimestamp { index });
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Close of the final bar, the reference price for support/resistance.
    pub fn current_close(&self) -> Option<f64> {
        self.bars.last().map(|bar| bar.close)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    /// Keeps only bars inside the session window. Filtering preserves order,
    /// so the result is still a valid series.
    pub fn filter_session(&self, session: SessionWindow) -> PriceSeries {
        PriceSeries {
            bars: self
                .bars
                .iter()
                .filter(|bar| session.contains(&bar.timestamp))
                .cloned()
                .collect(),
        }
    }
}

fn validate_bar(index: usize, bar: &PriceBar) -> Result<(), SeriesError> {
    let fields = [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
    ];
    for (field, value) in fields {
        if !value.is_finite() || value < 0.0 {
            return Err(SeriesError::InvalidPrice {
                index,
                field,
                value,
            });
        }
    }
    if !bar.volume.is_finite() || bar.volume < 0.0 {
        return Err(SeriesError::InvalidVolume {
            index,
            value: bar.volume,
        });
    }
    let body_high = bar.open.max(bar.close);
    let body_low = bar.open.min(bar.close);
    if bar.high < bar.low || bar.high < body_high || bar.low > body_low {
        return Err(SeriesError::InconsistentBar { index });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwingKind {
    High,
    Low,
}

/// Local extremum found by the swing detector.
#[derive(Debug, Clone, Serialize)]
pub struct SwingPoint {
    /// Position of the bar in the full series.
    pub index: usize,
    pub timestamp: DateTime<Tz>,
    pub price: f64,
    pub kind: SwingKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LevelKind {
    Support,
    Resistance,
}

impl fmt::Display for LevelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelKind::Support => f.write_str("Support"),
            LevelKind::Resistance => f.write_str("Resistance"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Level {
    pub price: f64,
    pub kind: LevelKind,
    pub touches: usize,
    pub first_seen: DateTime<Tz>,
    pub last_seen: DateTime<Tz>,
    pub is_round_number: bool,
}

impl Level {
    /// Signed distance from `current_price` to this level, in percent of the
    /// current price.
    pub fn distance_pct(&self, current_price: f64) -> f64 {
        safe_pct(self.price - current_price, current_price)
    }
}

/// Ranked support and resistance levels around the current close.
#[derive(Debug, Clone, Serialize)]
pub struct LevelSet {
    pub current_price: f64,
    /// Closest first, all strictly below `current_price`.
    pub support: Vec<Level>,
    /// Closest first, all strictly above `current_price`.
    pub resistance: Vec<Level>,
}

impl LevelSet {
    pub fn empty(current_price: f64) -> Self {
        Self {
            current_price,
            support: Vec::new(),
            resistance: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.support.is_empty() && self.resistance.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendLabel {
    Uptrend,
    Downtrend,
    Sideways,
    Neutral,
}

impl TrendLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::Uptrend => "UPTREND",
            TrendLabel::Downtrend => "DOWNTREND",
            TrendLabel::Sideways => "SIDEWAYS",
            TrendLabel::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indicator values at the final bar that drove a trend decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendSnapshot {
    pub close: f64,
    pub ema_fast: f64,
    pub ema_medium: f64,
    pub ema_slow: f64,
    pub momentum_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendResult {
    pub label: TrendLabel,
    /// Always within `[0, 100]`.
    pub strength: f64,
    /// Absent when there was not enough history to classify.
    pub snapshot: Option<TrendSnapshot>,
}

impl TrendResult {
    pub fn neutral() -> Self {
        Self {
            label: TrendLabel::Neutral,
            strength: 0.0,
            snapshot: None,
        }
    }
}

/// Trading session expressed in the series' local time.
#[derive(Debug, Clone, Copy)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SessionWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: &DateTime<Tz>) -> bool {
        let time = timestamp.time();
        time >= self.start && time < self.end
    }
}
