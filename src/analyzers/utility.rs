/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sorts ascending in place.
pub fn sort_ascending(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

/// Quantile `q` of an ascending slice by linear interpolation between the
/// order statistics around position `(n - 1) * q`. Returns `None` for empty input.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = last as f64 * q;
    let lo = position.floor() as usize;
    let frac = position - lo as f64;
    let base = sorted[lo.min(last)];
    match sorted.get(lo + 1) {
        Some(next) => Some(base + frac * (next - base)),
        None => Some(base),
    }
}

/// Smallest and largest value. Returns `None` for empty input.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Rounds to the nearest integer with halves going up.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
