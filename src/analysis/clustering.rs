use std::cmp::Ordering;

use chrono::DateTime;
use chrono_tz::Tz;
use itertools::{Itertools, MinMaxResult};

use crate::data::SwingPoint;

/// Zone of nearby swing prices merged into one candidate level.
#[derive(Debug, Clone)]
pub struct PriceCluster {
    /// Mean of the member prices.
    pub price: f64,
    pub members: usize,
    pub first_seen: DateTime<Tz>,
    pub last_seen: DateTime<Tz>,
}

/// Greedy single-pass clustering over price-sorted swings.
///
/// A swing joins the open cluster when it lies within `tolerance` of the
/// cluster's running mean, otherwise the cluster is closed and a new one
/// starts. Members are never re-evaluated after the mean drifts.
pub fn cluster_swings(swings: &[SwingPoint], tolerance: f64) -> Vec<PriceCluster> {
    if swings.is_empty() || !tolerance.is_finite() {
        return Vec::new();
    }
    let tolerance = tolerance.abs();

    let sorted: Vec<&SwingPoint> = swings
        .iter()
        .sorted_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal))
        .collect();

    let mut clusters = Vec::new();
    let mut buffer: Vec<&SwingPoint> = Vec::new();
    let mut running_sum = 0.0;

    for swing in sorted {
        if !buffer.is_empty() {
            let centre = running_sum / buffer.len() as f64;
            if (swing.price - centre).abs() > tolerance {
                clusters.extend(emit_cluster(&buffer));
                buffer.clear();
                running_sum = 0.0;
            }
        }
        buffer.push(swing);
        running_sum += swing.price;
    }
    clusters.extend(emit_cluster(&buffer));

    clusters
}

fn emit_cluster(buffer: &[&SwingPoint]) -> Option<PriceCluster> {
    let (first_seen, last_seen) = match buffer.iter().map(|s| s.timestamp).minmax() {
        MinMaxResult::NoElements => return None,
        MinMaxResult::OneElement(ts) => (ts, ts),
        MinMaxResult::MinMax(min, max) => (min, max),
    };
    let price = buffer.iter().map(|s| s.price).sum::<f64>() / buffer.len() as f64;
    Some(PriceCluster {
        price,
        members: buffer.len(),
        first_seen,
        last_seen,
    })
}
