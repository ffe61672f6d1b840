/// Relative margin added below the lowest low and above the highest high.
pub const RANGE_MARGIN: f64 = 0.05;

/// Base increment for psychological prices at the scale of `max_price`.
pub fn round_number_increment(max_price: f64) -> f64 {
    if max_price > 10_000.0 {
        500.0
    } else if max_price > 1_000.0 {
        50.0
    } else if max_price > 100.0 {
        5.0
    } else {
        1.0
    }
}

/// Expand an observed `[low, high]` range by [`RANGE_MARGIN`] on both sides.
pub fn extended_range(low: f64, high: f64) -> (f64, f64) {
    (low * (1.0 - RANGE_MARGIN), high * (1.0 + RANGE_MARGIN))
}

/// Round prices within `[min_price, max_price]`, ascending.
///
/// Only multiples of ten increments are emitted; the base increment alone is
/// too dense to carry psychological weight.
pub fn generate_round_numbers(min_price: f64, max_price: f64) -> Vec<f64> {
    if !min_price.is_finite() || !max_price.is_finite() || max_price < min_price {
        return Vec::new();
    }

    let step = round_number_increment(max_price) * 10.0;
    let first = (min_price / step).ceil() as i64;
    let last = (max_price / step).floor() as i64;
    (first.max(0)..=last)
        .map(|k| k as f64 * step)
        .filter(|price| *price > 0.0)
        .collect()
}
