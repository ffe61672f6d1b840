use std::path::PathBuf;

use chrono::NaiveTime;
use chrono_tz::Tz;
use clap::{ArgAction, Parser};

use crate::analysis::{DetectionStrategy, LevelConfig, Timeframe, TrendConfig};
use crate::data::SessionWindow;
use crate::logging::LogFormat;
use crate::output::OutputFormat;

/// Command-line configuration for the market-structure report.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Input CSV file path containing OHLCV data.
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input_path: PathBuf,

    /// IANA timezone the CSV timestamps are written in.
    #[arg(long, default_value = "Asia/Kolkata", value_parser = parse_timezone)]
    pub timezone: Tz,

    /// Session start (HH:MM, local time); bars outside the session are dropped.
    #[arg(long, value_parser = parse_clock, requires = "session_end")]
    pub session_start: Option<NaiveTime>,

    /// Session end (HH:MM, local time, exclusive).
    #[arg(long, value_parser = parse_clock, requires = "session_start")]
    pub session_end: Option<NaiveTime>,

    /// Bar interval of the input, selects swing window and lookback presets.
    #[arg(short = 't', long, value_enum, default_value_t = Timeframe::Min15)]
    pub timeframe: Timeframe,

    /// Support/resistance detection strategy.
    #[arg(long, value_enum, default_value_t = DetectionStrategy::SwingBased)]
    pub strategy: DetectionStrategy,

    /// Override the timeframe's swing half-window.
    #[arg(long)]
    pub half_window: Option<usize>,

    /// Override the timeframe's swing lookback (bars).
    #[arg(long)]
    pub lookback_bars: Option<usize>,

    /// ATR period for volatility estimation.
    #[arg(long, default_value_t = 14)]
    pub atr_period: usize,

    /// Clustering and touch tolerance in ATR multiples.
    #[arg(long, default_value_t = 0.5)]
    pub cluster_multiplier: f64,

    /// Minimum touches for a level to be reported.
    #[arg(long, default_value_t = 2)]
    pub min_touches: usize,

    /// Maximum support levels to report.
    #[arg(long, default_value_t = 3)]
    pub max_support: usize,

    /// Maximum resistance levels to report.
    #[arg(long, default_value_t = 3)]
    pub max_resistance: usize,

    /// Minimum bars before levels are detected.
    #[arg(long, default_value_t = 50)]
    pub min_level_bars: usize,

    /// Skip psychological round-number levels.
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_round_numbers: bool,

    /// Trailing closes used for trend classification (0 = all).
    #[arg(long, default_value_t = 50)]
    pub trend_window: usize,

    /// Report format written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Log line format written to stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn level_config(&self) -> LevelConfig {
        let preset = LevelConfig::for_timeframe(self.timeframe);
        LevelConfig {
            strategy: self.strategy,
            atr_period: self.atr_period,
            cluster_multiplier: self.cluster_multiplier,
            min_touches: self.min_touches,
            half_window: self.half_window.unwrap_or(preset.half_window),
            lookback_bars: self.lookback_bars.unwrap_or(preset.lookback_bars),
            include_round_numbers: !self.no_round_numbers,
            min_bars: self.min_level_bars,
        }
    }

    pub fn trend_config(&self) -> TrendConfig {
        TrendConfig {
            window: (self.trend_window > 0).then_some(self.trend_window),
            ..TrendConfig::default()
        }
    }

    pub fn session(&self) -> Option<SessionWindow> {
        match (self.session_start, self.session_end) {
            (Some(start), Some(end)) => Some(SessionWindow::new(start, end)),
            _ => None,
        }
    }
}

fn parse_timezone(value: &str) -> Result<Tz, String> {
    value
        .parse::<Tz>()
        .map_err(|err| format!("unknown timezone '{value}': {err}"))
}

fn parse_clock(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|err| format!("invalid time '{value}': {err}"))
}
