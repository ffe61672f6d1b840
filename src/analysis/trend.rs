use tracing::debug;

use crate::analysis::safe_pct;
use crate::data::{PriceSeries, TrendLabel, TrendResult, TrendSnapshot};

#[derive(Debug, Clone)]
pub struct TrendConfig {
    /// Fewer closes than this classify as NEUTRAL with zero strength.
    pub min_bars: usize,
    pub fast_span: usize,
    pub medium_span: usize,
    pub slow_span: usize,
    /// Momentum compares the last close with the close this many bars back.
    pub momentum_lookback: usize,
    /// Percent move required for a strong trend.
    pub momentum_threshold_pct: f64,
    /// Strength discount for trends confirmed by the medium and slow EMAs only.
    pub weak_factor: f64,
    /// Classify only the trailing closes; `None` uses the whole series.
    pub window: Option<usize>,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            min_bars: 20,
            fast_span: 3,
            medium_span: 8,
            slow_span: 20,
            momentum_lookback: 5,
            momentum_threshold_pct: 1.0,
            weak_factor: 0.7,
            window: None,
        }
    }
}

/// Exponential moving average seeded with the first value,
/// `alpha = 2 / (span + 1)`. Written in incremental form so a constant input
/// reproduces itself exactly.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let Some(&first) = values.first() else {
        return out;
    };
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = first;
    out.push(prev);
    for &value in &values[1..] {
        prev += alpha * (value - prev);
        out.push(prev);
    }
    out
}

/// Percent change between the last value and the one `lookback` bars earlier.
pub fn momentum_pct(values: &[f64], lookback: usize) -> Option<f64> {
    if lookback == 0 || values.len() <= lookback {
        return None;
    }
    let last = values[values.len() - 1];
    let base = values[values.len() - 1 - lookback];
    Some(safe_pct(last - base, base))
}

#[derive(Debug, Clone, Default)]
pub struct TrendClassifier {
    config: TrendConfig,
}

impl TrendClassifier {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, series: &PriceSeries) -> TrendResult {
        self.classify_closes(&series.closes())
    }

    /// Decision table over the final close, first matching rule wins:
    ///
    /// 1. close < fast < medium < slow and momentum below -threshold: strong DOWNTREND
    /// 2. close > fast > medium > slow and momentum above +threshold: strong UPTREND
    /// 3. close below medium and slow: weak DOWNTREND
    /// 4. close above medium and slow: weak UPTREND
    /// 5. otherwise SIDEWAYS
    pub fn classify_closes(&self, closes: &[f64]) -> TrendResult {
        let config = &self.config;
        let closes = match config.window {
            Some(window) if window < closes.len() => &closes[closes.len() - window..],
            _ => closes,
        };
        if closes.len() < config.min_bars.max(1) {
            return TrendResult::neutral();
        }
        let Some(momentum) = momentum_pct(closes, config.momentum_lookback) else {
            return TrendResult::neutral();
        };

        let last = |values: Vec<f64>| values.last().copied().unwrap_or(f64::NAN);
        let close = closes[closes.len() - 1];
        let fast = last(ema_series(closes, config.fast_span));
        let medium = last(ema_series(closes, config.medium_span));
        let slow = last(ema_series(closes, config.slow_span));

        let threshold = config.momentum_threshold_pct;
        let gap_pct = safe_pct(close - slow, slow);
        let (label, rule, strength) =
            if close < fast && fast < medium && medium < slow && momentum < -threshold {
                (TrendLabel::Downtrend, 1, gap_pct.abs())
            } else if close > fast && fast > medium && medium > slow && momentum > threshold {
                (TrendLabel::Uptrend, 2, gap_pct)
            } else if close < medium && close < slow {
                (TrendLabel::Downtrend, 3, gap_pct.abs() * config.weak_factor)
            } else if close > medium && close > slow {
                (TrendLabel::Uptrend, 4, gap_pct * config.weak_factor)
            } else {
                (TrendLabel::Sideways, 5, gap_pct.abs())
            };
        debug!(%label, rule, momentum, close, fast, medium, slow, "classified trend");

        TrendResult {
            label,
            strength: clamp_strength(strength),
            snapshot: Some(TrendSnapshot {
                close,
                ema_fast: fast,
                ema_medium: medium,
                ema_slow: slow,
                momentum_pct: momentum,
            }),
        }
    }
}

fn clamp_strength(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
