/// Mean and sample standard deviation (n - 1 denominator).
///
/// Returns `None` when fewer than two values are given, since the unbiased
/// estimator is undefined there.
pub fn mean_and_std(data: &[f64]) -> Option<(f64, f64)> {
    let size = data.len();
    if size < 2 {
        return None;
    }
    let mean = data.iter().sum::<f64>() / size as f64;
    let sum_sq = data.iter().map(|&x| (x - mean).powi(2)).sum::<f64>();
    Some((mean, (sum_sq / (size - 1) as f64).sqrt()))
}

/// Pearson correlation: `sum((x - mx)(y - my)) / (n - 1) / sx / sy`.
///
/// `None` if the lengths differ, either side has fewer than two values, or
/// either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    let (mean_x, std_x) = mean_and_std(x)?;
    let (mean_y, std_y) = mean_and_std(y)?;
    if std_x == 0.0 || std_y == 0.0 {
        return None;
    }
    let cov = x
        .iter()
        .zip(y)
        .map(|(&a, &b)| (a - mean_x) * (b - mean_y))
        .sum::<f64>()
        / (x.len() - 1) as f64;
    Some(cov / std_x / std_y)
}
