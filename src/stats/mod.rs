//! Small statistical primitives shared by the ranking and cutoff stages.

pub mod roc;
pub mod wald;

pub use roc::auc;
pub use wald::{chi_squared_p_value, wald_p_value, Z_95};

/// Mean and sample standard deviation (n − 1 denominator).
///
/// Returns `None` for fewer than two values.
pub fn mean_sd(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some((mean, var.sqrt()))
}

/// Z-scores of `values`, or `None` when the values have no spread.
pub fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    let (mean, sd) = mean_sd(values)?;
    if !(sd > 0.0) || !sd.is_finite() {
        return None;
    }
    Some(values.iter().map(|v| (v - mean) / sd).collect())
}

/// Number of distinct values, compared exactly.
pub fn n_distinct(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_sd() {
        let (mean, sd) = mean_sd(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_relative_eq!(mean, 5.0);
        assert_relative_eq!(sd, (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert!(mean_sd(&[1.0]).is_none());
    }

    #[test]
    fn test_standardize() {
        let z = standardize(&[1.0, 2.0, 3.0]).unwrap();
        assert_relative_eq!(z[0], -1.0, epsilon = 1e-12);
        assert_relative_eq!(z[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(z[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_standardize_constant() {
        assert!(standardize(&[3.0, 3.0, 3.0]).is_none());
    }

    #[test]
    fn test_n_distinct() {
        assert_eq!(n_distinct(&[1.0, 2.0, 2.0, 3.0, 1.0]), 3);
        assert_eq!(n_distinct(&[]), 0);
    }
}
