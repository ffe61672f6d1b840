use std::fmt::Write;

use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;
use clap::ValueEnum;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::data::{Level, LevelSet, TrendResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Everything the report shows, in one serializable value.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub timeframe: &'static str,
    pub bars: usize,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub trend: &'a TrendResult,
    pub levels: &'a LevelSet,
}

#[derive(Tabled)]
struct LevelRow {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Touches")]
    touches: usize,
    #[tabled(rename = "Round")]
    round: &'static str,
    #[tabled(rename = "First Seen")]
    first_seen: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

pub fn render_report(report: &Report<'_>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Table => Ok(render_table(report)),
    }
}

fn render_table(report: &Report<'_>) -> String {
    let mut out = String::new();
    let levels = report.levels;

    let _ = writeln!(out, "\n=== Market Structure ({}) ===\n", report.timeframe);
    let _ = writeln!(
        out,
        "Bars: {} spanning {} to {}",
        report.bars,
        report.start.format("%Y-%m-%d %H:%M"),
        report.end.format("%Y-%m-%d %H:%M"),
    );
    let _ = writeln!(out, "Current Price: {:.2}", levels.current_price);
    let _ = writeln!(
        out,
        "Trend: {} (strength {:.2})",
        report.trend.label, report.trend.strength
    );
    if let Some(snapshot) = report.trend.snapshot {
        let _ = writeln!(
            out,
            "EMA 3/8/20: {:.2} / {:.2} / {:.2} | 5-bar momentum {:+.2}%",
            snapshot.ema_fast, snapshot.ema_medium, snapshot.ema_slow, snapshot.momentum_pct
        );
    }

    if levels.is_empty() {
        let _ = writeln!(out, "No support or resistance levels met the touch threshold.");
        return out;
    }

    // Resistance listed farthest first so the table reads top-down in price.
    let rows: Vec<LevelRow> = levels
        .resistance
        .iter()
        .rev()
        .chain(levels.support.iter())
        .map(|level| level_row(level, levels.current_price))
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    let _ = writeln!(out, "\n{table}\n");
    out
}

fn level_row(level: &Level, current_price: f64) -> LevelRow {
    LevelRow {
        kind: level.kind.to_string(),
        price: format!("{:.2}", level.price),
        distance: format!("{:+.2}%", level.distance_pct(current_price)),
        touches: level.touches,
        round: if level.is_round_number { "yes" } else { "-" },
        first_seen: level.first_seen.format("%Y-%m-%d %H:%M").to_string(),
        last_seen: level.last_seen.format("%Y-%m-%d %H:%M").to_string(),
    }
}
