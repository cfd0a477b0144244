//! Least-squares trend over recent values.

/// Fewer points than this yields a flat trend.
pub const MIN_TREND_POINTS: usize = 10;

/// OLS slope of `values` against their index `0..n-1`.
///
/// `slope = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²)`; returns 0 when there are fewer
/// than `MIN_TREND_POINTS` values.
pub fn slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < MIN_TREND_POINTS {
        return 0.0;
    }

    let (mut sx, mut sy, mut sxy, mut sxx) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sx += x;
        sy += y;
        sxy += x * y;
        sxx += x * x;
    }

    let n = n as f64;
    let denom = n * sxx - sx * sx;
    if denom == 0.0 {
        return 0.0;
    }
    let s = (n * sxy - sx * sy) / denom;
    if s.is_finite() {
        s
    } else {
        0.0
    }
}
