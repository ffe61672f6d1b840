use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use market_structure::config::AppConfig;
use market_structure::data::SessionWindow;
use market_structure::loader::load_series;
use market_structure::logging::init_logging;
use market_structure::output::{render_report, Report};
use market_structure::{LevelDetector, PriceSeries, TrendClassifier};

fn main() -> Result<()> {
    let config = AppConfig::parse();
    init_logging(config.log_format);
    run(&config)
}

fn run(config: &AppConfig) -> Result<()> {
    let input_path = &config.input_path;
    if !input_path.exists() {
        bail!("input file {:?} does not exist", input_path);
    }

    let series = load_series(input_path, config.timezone)
        .with_context(|| format!("failed to load input data from {:?}", input_path))?;
    let series = apply_session(series, config.session())?;

    let (Some(start), Some(end)) = (series.first(), series.last()) else {
        bail!("input series is empty");
    };
    info!(
        bars = series.len(),
        start = %start.timestamp.format("%Y-%m-%d %H:%M"),
        end = %end.timestamp.format("%Y-%m-%d %H:%M"),
        timeframe = config.timeframe.label(),
        "loaded price series"
    );

    let trend = TrendClassifier::new(config.trend_config()).classify(&series);
    let level_config = config.level_config();
    if series.len() < level_config.min_bars {
        warn!(
            bars = series.len(),
            required = level_config.min_bars,
            "series too short for support/resistance detection"
        );
    }
    let levels = LevelDetector::new(level_config).detect(
        &series,
        config.max_support,
        config.max_resistance,
    );
    info!(
        trend = %trend.label,
        strength = trend.strength,
        support = levels.support.len(),
        resistance = levels.resistance.len(),
        "analysis complete"
    );

    let report = Report {
        timeframe: config.timeframe.label(),
        bars: series.len(),
        start: start.timestamp,
        end: end.timestamp,
        trend: &trend,
        levels: &levels,
    };
    println!("{}", render_report(&report, config.format)?);

    Ok(())
}

/// Restrict `series` to the session, if one was requested.
fn apply_session(series: PriceSeries, session: Option<SessionWindow>) -> Result<PriceSeries> {
    let Some(session) = session else {
        return Ok(series);
    };
    let before = series.len();
    let filtered = series.filter_session(session);
    if filtered.is_empty() {
        bail!(
            "no bars remain after applying the {}-{} session filter",
            session.start.format("%H:%M"),
            session.end.format("%H:%M")
        );
    }
    info!(
        kept = filtered.len(),
        dropped = before - filtered.len(),
        "applied session filter"
    );
    Ok(filtered)
}
