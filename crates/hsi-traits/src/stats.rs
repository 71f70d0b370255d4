//! Statistical utility functions for series processing.
//!
//! Every function here treats NaN as a missing observation: it is skipped in
//! reductions and preserved in element-wise outputs.

use ndarray::Array1;

/// Summary statistics of a z-score transformation.
#[derive(Debug, Clone, Copy)]
pub struct ZScoreStats {
    /// Mean of the non-missing inputs.
    pub mean: f64,
    /// Population standard deviation (N denominator) of the non-missing inputs.
    pub std: f64,
    /// Number of non-missing inputs.
    pub n: usize,
}

fn finite(values: &[f64]) -> Array1<f64> {
    values.iter().copied().filter(|x| !x.is_nan()).collect()
}

/// Arithmetic mean of the non-missing values; NaN when none exist.
pub fn nan_mean(values: &[f64]) -> f64 {
    finite(values).mean().unwrap_or(f64::NAN)
}

/// Standard deviation of the non-missing values with `ddof` delta degrees of
/// freedom. NaN when fewer than `ddof + 1` values exist.
pub fn nan_std(values: &[f64], ddof: usize) -> f64 {
    let arr = finite(values);
    if arr.len() <= ddof {
        return f64::NAN;
    }
    arr.std(ddof as f64)
}

/// Standardize values to z-scores using population statistics over the whole
/// sample.
///
/// Missing inputs stay missing. When the standard deviation is zero (or no
/// value is present) every output is NaN.
///
/// # Examples
///
/// ```
/// use hsi_traits::stats::zscore;
///
/// let (z, stats) = zscore(&[1.0, 2.0, 3.0]);
/// assert_eq!(stats.n, 3);
/// assert!((z[0] + z[2]).abs() < 1e-12);
/// ```
pub fn zscore(values: &[f64]) -> (Vec<f64>, ZScoreStats) {
    let arr = finite(values);
    let n = arr.len();
    let mean = arr.mean().unwrap_or(f64::NAN);
    let std = if n == 0 { f64::NAN } else { arr.std(0.0) };

    let z = if std > 0.0 {
        values.iter().map(|x| (x - mean) / std).collect()
    } else {
        vec![f64::NAN; values.len()]
    };

    (z, ZScoreStats { mean, std, n })
}

/// Z-scores where the value at `t` is standardized with the mean and population
/// standard deviation of the non-missing observations up to and including `t`.
///
/// Outputs are NaN until `min_periods` observations have been seen, where the
/// input is missing, or where the running standard deviation is zero.
pub fn expanding_zscore(values: &[f64], min_periods: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut n = 0usize;
    let mut mean = 0.0;
    let mut m2 = 0.0;

    // Welford update: a constant series keeps m2 at exactly zero.
    for &x in values {
        if x.is_nan() {
            out.push(f64::NAN);
            continue;
        }
        n += 1;
        let delta = x - mean;
        mean += delta / n as f64;
        m2 += delta * (x - mean);

        if n < min_periods.max(1) {
            out.push(f64::NAN);
            continue;
        }
        let std = (m2 / n as f64).max(0.0).sqrt();
        out.push(if std > 0.0 { (x - mean) / std } else { f64::NAN });
    }

    out
}

/// Empirical quantile with linear interpolation between order statistics.
///
/// The position of quantile `q` in the sorted non-missing sample of size `n`
/// is `q * (n - 1)`. Returns NaN for an empty sample or `q` outside `[0, 1]`.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if !(0.0..=1.0).contains(&q) {
        return f64::NAN;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(f64::total_cmp);

    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }
}

/// Fills interior gaps by linear interpolation on the index axis.
///
/// Leading and trailing NaNs are left in place.
pub fn interpolate_interior(values: &mut [f64]) {
    let mut last_valid: Option<usize> = None;
    for idx in 0..values.len() {
        if values[idx].is_nan() {
            continue;
        }
        if let Some(prev) = last_valid {
            let gap = idx - prev;
            if gap > 1 {
                let (start, end) = (values[prev], values[idx]);
                for step in 1..gap {
                    let t = step as f64 / gap as f64;
                    values[prev + step] = start + (end - start) * t;
                }
            }
        }
        last_valid = Some(idx);
    }
}

/// Replaces each NaN with the last preceding non-missing value.
pub fn forward_fill(values: &mut [f64]) {
    let mut last = f64::NAN;
    for v in values.iter_mut() {
        if v.is_nan() {
            *v = last;
        } else {
            last = *v;
        }
    }
}

/// Replaces each NaN with the next following non-missing value.
pub fn backward_fill(values: &mut [f64]) {
    let mut next = f64::NAN;
    for v in values.iter_mut().rev() {
        if v.is_nan() {
            *v = next;
        } else {
            next = *v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_zscore_population() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let (z, stats) = zscore(&values);

        assert_abs_diff_eq!(stats.mean, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.std, 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(nan_mean(&z), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(nan_std(&z, 0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zscore_skips_missing() {
        let values = vec![1.0, f64::NAN, 3.0];
        let (z, stats) = zscore(&values);

        assert_eq!(stats.n, 2);
        assert_abs_diff_eq!(z[0], -1.0, epsilon = 1e-12);
        assert!(z[1].is_nan());
        assert_abs_diff_eq!(z[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zscore_constant_is_nan() {
        let (z, stats) = zscore(&[4.0, 4.0, 4.0]);
        assert_eq!(stats.std, 0.0);
        assert!(z.iter().all(|x| x.is_nan()));

        let (z, stats) = zscore(&[f64::NAN, f64::NAN]);
        assert_eq!(stats.n, 0);
        assert!(z.iter().all(|x| x.is_nan()));
    }

    #[test]
    fn test_expanding_zscore_is_causal() {
        let values = vec![1.0, 2.0, 3.0, 100.0];
        let z = expanding_zscore(&values, 2);

        assert!(z[0].is_nan());
        // First two values: mean 1.5, std 0.5
        assert_abs_diff_eq!(z[1], 1.0, epsilon = 1e-12);
        // Appending a later value does not change earlier outputs
        let z_short = expanding_zscore(&values[..3], 2);
        assert_eq!(&z[..3], &z_short[..]);
    }

    #[test]
    fn test_expanding_zscore_constant_is_nan() {
        let z = expanding_zscore(&[0.1; 12], 1);
        assert!(z.iter().all(|v| v.is_nan()));

        let (full, _) = zscore(&[0.1; 12]);
        assert!(full.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_nan_std_sample() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_abs_diff_eq!(nan_std(&values, 0), 2.0, epsilon = 1e-12);
        assert!(nan_std(&[1.0], 1).is_nan());
    }

    #[test]
    fn test_quantile_linear() {
        let values: Vec<f64> = (1..=5).map(f64::from).collect();
        assert_abs_diff_eq!(quantile(&values, 0.5), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile(&values, 0.7), 3.8, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile(&values, 0.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile(&values, 1.0), 5.0, epsilon = 1e-12);
        assert!(quantile(&values, 1.5).is_nan());
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_interpolate_interior_only() {
        let mut values = vec![f64::NAN, 1.0, f64::NAN, f64::NAN, 4.0, f64::NAN];
        interpolate_interior(&mut values);

        assert!(values[0].is_nan());
        assert_abs_diff_eq!(values[2], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[3], 3.0, epsilon = 1e-12);
        assert!(values[5].is_nan());
    }

    #[test]
    fn test_forward_and_backward_fill() {
        let mut values = vec![f64::NAN, 1.0, f64::NAN, 2.0, f64::NAN];
        forward_fill(&mut values);
        assert!(values[0].is_nan());
        assert_eq!(&values[1..], &[1.0, 1.0, 2.0, 2.0]);

        backward_fill(&mut values);
        assert_eq!(values, vec![1.0, 1.0, 1.0, 2.0, 2.0]);
    }
}
