use serde::Serialize;
use statrs::statistics::Statistics;

use crate::data::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VolatilitySource {
    /// Simple mean of the trailing true ranges.
    AverageTrueRange,
    /// Sample standard deviation of the highs, used when ATR is undefined.
    HighStdDev,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Volatility {
    pub value: f64,
    pub source: VolatilitySource,
}

impl Volatility {
    /// Distance tolerance derived from this estimate.
    pub fn tolerance(&self, multiplier: f64) -> f64 {
        (self.value * multiplier).abs()
    }
}

/// True range of every bar. The first bar has no previous close and uses its
/// high-low span.
pub fn true_ranges(bars: &[PriceBar]) -> Vec<f64> {
    let mut ranges = Vec::with_capacity(bars.len());
    for (idx, bar) in bars.iter().enumerate() {
        let tr = if idx == 0 {
            bar.high - bar.low
        } else {
            let prev = &bars[idx - 1];
            let high_low = bar.high - bar.low;
            let high_close = (bar.high - prev.close).abs();
            let low_close = (bar.low - prev.close).abs();
            high_low.max(high_close).max(low_close)
        };
        ranges.push(tr.max(0.0));
    }
    ranges
}

/// Rolling-mean ATR over the last `period` bars, or the standard deviation of
/// highs when the series is shorter than `period` or the mean is not finite.
pub fn estimate_volatility(bars: &[PriceBar], period: usize) -> Volatility {
    if period > 0 && bars.len() >= period {
        let ranges = true_ranges(bars);
        let atr = ranges[ranges.len() - period..].iter().copied().sum::<f64>() / period as f64;
        if atr.is_finite() {
            return Volatility {
                value: atr,
                source: VolatilitySource::AverageTrueRange,
            };
        }
    }

    let std_dev = bars.iter().map(|bar| bar.high).std_dev();
    Volatility {
        value: if std_dev.is_finite() { std_dev } else { 0.0 },
        source: VolatilitySource::HighStdDev,
    }
}
