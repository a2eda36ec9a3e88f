//! Small descriptive-statistics helpers shared by binning, skew fitting and
//! the exploratory summary.

/// Linear-interpolation quantile of an ascending slice (`p` in `[0, 1]`).
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Sort finite values ascending, dropping NaN.
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Variance with `ddof` delta degrees of freedom.
pub fn variance(values: &[f64], ddof: usize) -> Option<f64> {
    let n = values.len();
    if n <= ddof {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (n - ddof) as f64)
}

/// Sample standard deviation (`ddof = 1`).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values, 1).map(f64::sqrt)
}

/// Central moment of order `k`.
fn central_moment(values: &[f64], m: f64, k: i32) -> f64 {
    values.iter().map(|v| (v - m).powi(k)).sum::<f64>() / values.len() as f64
}

/// Bias-corrected sample skewness (G1).
///
/// Returns `None` for fewer than three values and `Some(0.0)` for constant
/// input.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let m = mean(values)?;
    let m2 = central_moment(values, m, 2);
    if m2 <= f64::EPSILON * m.abs().max(1.0) {
        return Some(0.0);
    }
    let m3 = central_moment(values, m, 3);
    let g1 = m3 / m2.powf(1.5);
    let n = n as f64;
    Some(g1 * (n * (n - 1.0)).sqrt() / (n - 2.0))
}

/// Bias-corrected excess kurtosis (G2).
///
/// Returns `None` for fewer than four values and `Some(0.0)` for constant
/// input.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let m = mean(values)?;
    let m2 = central_moment(values, m, 2);
    if m2 <= f64::EPSILON * m.abs().max(1.0) {
        return Some(0.0);
    }
    let m4 = central_moment(values, m, 4);
    let g2 = m4 / (m2 * m2) - 3.0;
    let n = n as f64;
    Some((n - 1.0) / ((n - 2.0) * (n - 3.0)) * ((n + 1.0) * g2 + 6.0))
}

/// Pearson correlation over pairs where both values are present.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}
